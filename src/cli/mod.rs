//! CLI module
//!
//! Command-line interface over the Pokédex cache.
//!
//! # Commands
//!
//! - `sync` - Fetch list pages from PokeAPI into the cache
//! - `list` - Print cached rows
//! - `show` - Show one Pokémon, enriching species data on first access
//! - `clear` - Drop the cache
//! - `serve` - Start HTTP server mode

mod commands;
mod runner;
mod server;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::{render_details, App, Runner, SyncReport};
pub use server::{router, serve};
