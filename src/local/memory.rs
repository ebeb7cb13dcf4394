//! In-memory cache
//!
//! Process-local tables behind a single `RwLock`. Clones share the same data.

use super::models::{
    EvolutionChainEntity, PokemonAndDetail, PokemonDetailEntity, PokemonEntity,
    PokemonSpeciesEntity, RemoteKey,
};
use super::store::{LocalDataSource, PageBatch};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Tables {
    pokemons: BTreeMap<u32, PokemonEntity>,
    remote_keys: HashMap<u32, RemoteKey>,
    details: HashMap<u32, PokemonDetailEntity>,
    species: HashMap<u32, PokemonSpeciesEntity>,
    chains: HashMap<String, EvolutionChainEntity>,
}

/// [`LocalDataSource`] kept entirely in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl Tables {
    fn put_pokemons(&mut self, pokemons: Vec<PokemonEntity>) {
        for pokemon in pokemons {
            self.pokemons.insert(pokemon.id, pokemon);
        }
    }

    fn put_remote_keys(&mut self, keys: Vec<RemoteKey>) {
        for key in keys {
            self.remote_keys.insert(key.pokemon_id, key);
        }
    }

    fn put_details(&mut self, details: Vec<PokemonDetailEntity>) {
        for detail in details {
            self.details.insert(detail.pokemon_id, detail);
        }
    }

    fn put_species(&mut self, species: Vec<PokemonSpeciesEntity>) {
        for row in species {
            self.species.insert(row.pokemon_id, row);
        }
    }
}

#[async_trait]
impl LocalDataSource for MemoryStore {
    async fn save_all_pokemons(&self, pokemons: Vec<PokemonEntity>) -> Result<()> {
        self.tables.write().await.put_pokemons(pokemons);
        Ok(())
    }

    async fn save_all_remote_keys(&self, keys: Vec<RemoteKey>) -> Result<()> {
        self.tables.write().await.put_remote_keys(keys);
        Ok(())
    }

    async fn save_all_pokemon_details(&self, details: Vec<PokemonDetailEntity>) -> Result<()> {
        self.tables.write().await.put_details(details);
        Ok(())
    }

    async fn save_all_pokemon_species(&self, species: Vec<PokemonSpeciesEntity>) -> Result<()> {
        self.tables.write().await.put_species(species);
        Ok(())
    }

    async fn save_evolution_chain(&self, chain: EvolutionChainEntity) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.chains.insert(chain.url.clone(), chain);
        Ok(())
    }

    async fn remote_key(&self, pokemon_id: u32) -> Result<Option<RemoteKey>> {
        let tables = self.tables.read().await;
        Ok(tables.remote_keys.get(&pokemon_id).cloned())
    }

    async fn pokemons(&self, offset: usize, limit: usize) -> Result<Vec<PokemonEntity>> {
        let tables = self.tables.read().await;
        Ok(tables
            .pokemons
            .values()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn pokemon_and_detail(&self, name: &str) -> Result<Option<PokemonAndDetail>> {
        let tables = self.tables.read().await;

        let Some(pokemon) = tables.pokemons.values().find(|p| p.name == name) else {
            return Ok(None);
        };
        let Some(detail) = tables.details.get(&pokemon.id) else {
            return Ok(None);
        };
        let species = tables.species.get(&pokemon.id).cloned();
        let evolution_chain = species
            .as_ref()
            .and_then(|s| s.evolution_chain_url.as_ref())
            .and_then(|url| tables.chains.get(url))
            .cloned();

        Ok(Some(PokemonAndDetail {
            pokemon: pokemon.clone(),
            detail: detail.clone(),
            species,
            evolution_chain,
        }))
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.tables.read().await.pokemons.len())
    }

    async fn clear_all(&self) -> Result<()> {
        *self.tables.write().await = Tables::default();
        Ok(())
    }

    // one write lock: readers see the old page or the new one, never a mix
    async fn save_page(&self, batch: PageBatch, replace: bool) -> Result<()> {
        let mut tables = self.tables.write().await;
        if replace {
            *tables = Tables::default();
        }
        tables.put_pokemons(batch.pokemons);
        tables.put_remote_keys(batch.remote_keys);
        tables.put_details(batch.details);
        tables.put_species(batch.species);
        Ok(())
    }
}
