//! Local data source module
//!
//! The persistent cache behind the paging mediator. The mediator only needs
//! the narrow [`LocalDataSource`] contract; two backends implement it:
//! - `MemoryStore` - process-local maps, used by tests and `--storage memory`
//! - `DuckDbStore` - embedded DuckDB database file

mod database;
mod memory;
mod models;
mod store;

pub use database::DuckDbStore;
pub use memory::MemoryStore;
pub use models::{
    artwork_url, EvolutionChainEntity, EvolutionStep, PokemonAndDetail, PokemonDetailEntity,
    PokemonEntity, PokemonSpeciesEntity, PokemonStat, RemoteKey,
};
pub use store::{LocalDataSource, PageBatch};
