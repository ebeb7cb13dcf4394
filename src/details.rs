//! Details lookup
//!
//! Serves the details view out of the cache. Paging stores only the bare
//! species link, so the first lookup of a Pokémon also pulls its species entry
//! and evolution chain and writes them back for later reads.

use crate::error::{Error, Result};
use crate::local::{
    EvolutionChainEntity, LocalDataSource, PokemonAndDetail, PokemonSpeciesEntity,
};
use crate::remote::RemoteDataSource;
use std::sync::Arc;
use tracing::{debug, info};

/// Language used for flavor text unless configured otherwise
pub const DEFAULT_LANGUAGE: &str = "en";

/// Cache-first lookup of everything the details view shows
pub struct DetailsService {
    remote: Arc<dyn RemoteDataSource>,
    local: Arc<dyn LocalDataSource>,
    language: String,
}

impl DetailsService {
    pub fn new(remote: Arc<dyn RemoteDataSource>, local: Arc<dyn LocalDataSource>) -> Self {
        Self {
            remote,
            local,
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }

    /// Use a different flavor text language
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Joined record for `name`, enriching species and evolution data on
    /// first access.
    ///
    /// Only Pokémon already in the cache can be looked up; anything else is
    /// [`Error::NotFound`].
    pub async fn pokemon_and_detail(&self, name: &str) -> Result<PokemonAndDetail> {
        let mut record = self.cached(name).await?;

        let species_missing = !record
            .species
            .as_ref()
            .is_some_and(PokemonSpeciesEntity::is_enriched);
        if species_missing {
            let species = self
                .remote
                .get_pokemon_species(&record.detail.species_name)
                .await?;
            let entity = PokemonSpeciesEntity::from_remote(
                record.pokemon.id,
                record.detail.species_url.clone(),
                &species,
                &self.language,
            );
            debug!(name, species = %entity.name, "enriched species");
            self.local.save_all_pokemon_species(vec![entity]).await?;
            record = self.cached(name).await?;
        }

        let chain_url = record
            .species
            .as_ref()
            .and_then(|s| s.evolution_chain_url.clone());
        if let (Some(url), None) = (chain_url, &record.evolution_chain) {
            let chain = self.remote.get_evolution_chain(&url).await?;
            let entity = EvolutionChainEntity::from_remote(url, &chain);
            debug!(name, chain_id = entity.id, steps = entity.steps.len(), "fetched evolution chain");
            self.local.save_evolution_chain(entity).await?;
            record = self.cached(name).await?;
        }

        info!(name, id = record.pokemon.id, "loaded details");
        Ok(record)
    }

    async fn cached(&self, name: &str) -> Result<PokemonAndDetail> {
        self.local
            .pokemon_and_detail(name)
            .await?
            .ok_or_else(|| Error::not_found("pokemon", name))
    }
}

impl std::fmt::Debug for DetailsService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetailsService")
            .field("language", &self.language)
            .finish_non_exhaustive()
    }
}
