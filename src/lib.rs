// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # pokedex-sync
//!
//! Offline-first Pokédex cache fed from the paginated PokeAPI.
//!
//! The list endpoint is consumed page by page. Each list page is enriched with
//! per-Pokémon detail requests and written to a local cache together with a
//! remote key per row, so the next page can be requested from the right
//! offset after a restart.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pokedex_sync::local::DuckDbStore;
//! use pokedex_sync::paging::{Pager, PokemonRemoteMediator};
//! use pokedex_sync::remote::PokeApiDataSource;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> pokedex_sync::Result<()> {
//!     let remote = Arc::new(PokeApiDataSource::with_base_url("https://pokeapi.co/api/v2")?);
//!     let local = Arc::new(DuckDbStore::open("pokedex.duckdb")?);
//!
//!     let mediator = PokemonRemoteMediator::new(remote, local.clone());
//!     let mut pager = Pager::new(mediator, local, 20);
//!
//!     pager.refresh().await;
//!     pager.append().await;
//!     for pokemon in pager.items() {
//!         println!("{} {}", pokemon.id_formatted(), pokemon.display_name());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                 Pager  (refresh / append / retry)               │
//! │          watch::Receiver<PagerState> for status changes         │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    PokemonRemoteMediator                        │
//! │   offset from RemoteKey → list page → details → persist         │
//! └─────────────────────────────────────────────────────────────────┘
//!                  │                               │
//! ┌────────────────┴───────────┐   ┌───────────────┴───────────────┐
//! │     RemoteDataSource       │   │      LocalDataSource          │
//! ├────────────────────────────┤   ├───────────────────────────────┤
//! │ PokeApiDataSource          │   │ DuckDbStore                   │
//! │ HttpClient: retry, backoff │   │ MemoryStore                   │
//! │ rate limit                 │   │                               │
//! └────────────────────────────┘   └───────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(missing_docs)] // TODO: Add docs before 1.0 release

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the crate
pub mod error;

/// Common types and type aliases
pub mod types;

/// HTTP client with retry and rate limiting
pub mod http;

/// PokeAPI payloads and the remote data source
pub mod remote;

/// Cached entities and the local data source
pub mod local;

/// Remote mediator and paging consumer
pub mod paging;

/// Cache-first details lookup
pub mod details;

/// Application configuration
pub mod config;

/// Command-line interface
pub mod cli;

#[cfg(test)]
mod testing;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use config::AppConfig;
pub use details::DetailsService;
pub use paging::{LoadOutcome, LoadType, Pager, PokemonRemoteMediator};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
