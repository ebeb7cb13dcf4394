//! Local data source contract

use super::models::{
    EvolutionChainEntity, PokemonAndDetail, PokemonDetailEntity, PokemonEntity,
    PokemonSpeciesEntity, RemoteKey,
};
use crate::error::Result;
use async_trait::async_trait;

/// Every row one successful load writes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageBatch {
    pub pokemons: Vec<PokemonEntity>,
    pub remote_keys: Vec<RemoteKey>,
    pub details: Vec<PokemonDetailEntity>,
    pub species: Vec<PokemonSpeciesEntity>,
}

impl PageBatch {
    pub fn len(&self) -> usize {
        self.pokemons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pokemons.is_empty()
    }
}

/// Persistent cache the paging mediator writes into and the UI reads from.
///
/// Every `save_all_*` is an upsert by identifier: saving the same batch twice
/// leaves the cache exactly as saving it once, and saving an empty batch is a
/// no-op.
#[async_trait]
pub trait LocalDataSource: Send + Sync {
    /// Upsert list rows
    async fn save_all_pokemons(&self, pokemons: Vec<PokemonEntity>) -> Result<()>;

    /// Upsert pagination cursors
    async fn save_all_remote_keys(&self, keys: Vec<RemoteKey>) -> Result<()>;

    /// Upsert detail rows
    async fn save_all_pokemon_details(&self, details: Vec<PokemonDetailEntity>) -> Result<()>;

    /// Upsert species rows
    async fn save_all_pokemon_species(&self, species: Vec<PokemonSpeciesEntity>) -> Result<()>;

    /// Upsert one evolution chain
    async fn save_evolution_chain(&self, chain: EvolutionChainEntity) -> Result<()>;

    /// Cursor stored for a Pokémon, if any
    async fn remote_key(&self, pokemon_id: u32) -> Result<Option<RemoteKey>>;

    /// List rows ordered by id
    async fn pokemons(&self, offset: usize, limit: usize) -> Result<Vec<PokemonEntity>>;

    /// Joined record for the details view, looked up by name
    async fn pokemon_and_detail(&self, name: &str) -> Result<Option<PokemonAndDetail>>;

    /// Number of cached list rows
    async fn count(&self) -> Result<usize>;

    /// Drop every cached row of every entity
    async fn clear_all(&self) -> Result<()>;

    /// Write a whole page: list rows, then keys, then details, then species.
    /// With `replace` the cache is cleared first.
    ///
    /// The provided body issues the individual calls and can stop halfway.
    /// Backends that can make the page all-or-nothing override it, so a failed
    /// write leaves the previous rows and their keys in place.
    async fn save_page(&self, batch: PageBatch, replace: bool) -> Result<()> {
        if replace {
            self.clear_all().await?;
        }
        self.save_all_pokemons(batch.pokemons).await?;
        self.save_all_remote_keys(batch.remote_keys).await?;
        self.save_all_pokemon_details(batch.details).await?;
        self.save_all_pokemon_species(batch.species).await
    }
}
