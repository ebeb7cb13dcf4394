//! Remote data source trait and its PokeAPI implementation

use super::models::{
    EvolutionChainRemote, ListPokemonRemote, PokemonDetailRemote, PokemonSpeciesRemote,
};
use crate::error::Result;
use crate::http::{HttpClient, HttpClientConfig};
use async_trait::async_trait;
use tracing::debug;

/// Default PokeAPI endpoint
pub const DEFAULT_BASE_URL: &str = "https://pokeapi.co/api/v2";

/// Network boundary for everything the cache is filled from.
///
/// Implementations own transport concerns (timeouts, retries, throttling);
/// callers see a single `Result` per request.
#[async_trait]
pub trait RemoteDataSource: Send + Sync {
    /// Fetch one page of the Pokémon list
    async fn get_list_pokemon(&self, limit: u32, offset: u32) -> Result<ListPokemonRemote>;

    /// Fetch the full record for one Pokémon, by name or numeric id
    async fn get_pokemon_details(&self, id: &str) -> Result<PokemonDetailRemote>;

    /// Fetch species data (flavor text, evolution chain link)
    async fn get_pokemon_species(&self, name: &str) -> Result<PokemonSpeciesRemote>;

    /// Fetch an evolution chain by its absolute URL
    async fn get_evolution_chain(&self, url: &str) -> Result<EvolutionChainRemote>;
}

/// [`RemoteDataSource`] backed by the public PokeAPI
#[derive(Debug)]
pub struct PokeApiDataSource {
    client: HttpClient,
}

impl PokeApiDataSource {
    /// Wrap an already configured client. The client's base URL must point at
    /// the API root (e.g. `https://pokeapi.co/api/v2`).
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    /// Build a client for `base_url` with default transport settings
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let config = HttpClientConfig::builder().base_url(base_url).build();
        Ok(Self::new(HttpClient::with_config(config)?))
    }
}

#[async_trait]
impl RemoteDataSource for PokeApiDataSource {
    async fn get_list_pokemon(&self, limit: u32, offset: u32) -> Result<ListPokemonRemote> {
        debug!(limit, offset, "fetching pokemon list");
        self.client
            .get_json(
                "pokemon",
                &[("limit", limit.to_string()), ("offset", offset.to_string())],
            )
            .await
    }

    async fn get_pokemon_details(&self, id: &str) -> Result<PokemonDetailRemote> {
        debug!(pokemon = id, "fetching pokemon details");
        self.client.get_json(&format!("pokemon/{id}"), &[]).await
    }

    async fn get_pokemon_species(&self, name: &str) -> Result<PokemonSpeciesRemote> {
        debug!(pokemon = name, "fetching pokemon species");
        self.client
            .get_json(&format!("pokemon-species/{name}"), &[])
            .await
    }

    async fn get_evolution_chain(&self, url: &str) -> Result<EvolutionChainRemote> {
        debug!(url, "fetching evolution chain");
        self.client.get_json(url, &[]).await
    }
}
