//! CLI commands and argument parsing

use crate::types::StorageBackend;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Offline-first Pokédex cache synced from PokeAPI
#[derive(Parser, Debug)]
#[command(name = "pokedex-sync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Cache database file, overrides `storage.path`
    #[arg(short, long, global = true)]
    pub database: Option<PathBuf>,

    /// Cache backend, overrides `storage.backend`
    #[arg(long, global = true, value_enum)]
    pub storage: Option<StorageBackend>,

    /// PokeAPI base URL, overrides `api.base_url`
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch list pages from PokeAPI into the cache
    Sync {
        /// Number of remote pages to fetch
        #[arg(short, long, default_value = "1")]
        pages: usize,

        /// Continue after the last cached row instead of refreshing
        #[arg(long)]
        resume: bool,
    },

    /// Print cached rows
    List {
        /// Rows to skip
        #[arg(long, default_value = "0")]
        offset: usize,

        /// Rows to print (defaults to `paging.page_size`)
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show one cached Pokémon with species and evolution data
    Show {
        /// Pokémon name as listed (e.g. `bulbasaur`)
        name: String,
    },

    /// Drop every cached row
    Clear,

    /// Start HTTP server mode
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}
