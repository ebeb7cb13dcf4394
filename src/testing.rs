//! Shared fixtures for unit tests

use crate::error::{Error, Result};
use crate::local::{
    EvolutionChainEntity, LocalDataSource, MemoryStore, PokemonAndDetail, PokemonDetailEntity,
    PokemonEntity, PokemonSpeciesEntity, RemoteKey,
};
use crate::remote::{
    EvolutionChainRemote, ListPokemonRemote, NamedResource, PokemonDetailRemote,
    PokemonSpeciesRemote, RemoteDataSource,
};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub(crate) const API: &str = "https://pokeapi.co/api/v2";

pub(crate) fn name_for(id: u32) -> String {
    format!("pokemon-{id}")
}

fn id_from_name(name: &str) -> Option<u32> {
    name.strip_prefix("pokemon-")?.parse().ok()
}

pub(crate) fn summary(id: u32) -> NamedResource {
    NamedResource::new(name_for(id), format!("{API}/pokemon/{id}/"))
}

pub(crate) fn detail_json(id: u32, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "height": 7,
        "weight": 69,
        "base_experience": 64,
        "stats": [
            {"base_stat": 45, "effort": 0, "stat": {"name": "hp", "url": format!("{API}/stat/1/")}},
            {"base_stat": 49, "effort": 0, "stat": {"name": "attack", "url": format!("{API}/stat/2/")}}
        ],
        "types": [
            {"slot": 2, "type": {"name": "poison", "url": format!("{API}/type/4/")}},
            {"slot": 1, "type": {"name": "grass", "url": format!("{API}/type/12/")}}
        ],
        "sprites": {
            "front_default": format!("https://img.example/front/{id}.png"),
            "other": {"official-artwork": {"front_default": format!("https://img.example/artwork/{id}.png")}}
        },
        "species": {"name": name, "url": format!("{API}/pokemon-species/{id}/")}
    })
}

pub(crate) fn detail(id: u32) -> PokemonDetailRemote {
    serde_json::from_value(detail_json(id, &name_for(id))).unwrap()
}

pub(crate) fn species_json(id: u32, name: &str, chain_id: Option<u32>) -> Value {
    json!({
        "id": id,
        "name": name,
        "flavor_text_entries": [
            {"flavor_text": "Une graine étrange.", "language": {"name": "fr", "url": "l/5/"}},
            {"flavor_text": "A strange seed was\nplanted on its\u{c}back at birth.",
             "language": {"name": "en", "url": "l/9/"},
             "version": {"name": "red", "url": "v/1/"}}
        ],
        "evolution_chain": chain_id.map(|c| json!({"url": format!("{API}/evolution-chain/{c}/")})),
        "color": {"name": "green", "url": "c/5/"}
    })
}

fn chain_json(chain_id: u32, first: u32) -> Value {
    json!({
        "id": chain_id,
        "chain": {
            "species": {"name": name_for(first), "url": format!("{API}/pokemon-species/{first}/")},
            "evolution_details": [],
            "evolves_to": [{
                "species": {"name": name_for(first + 1), "url": format!("{API}/pokemon-species/{}/", first + 1)},
                "evolution_details": [{"min_level": 16, "trigger": {"name": "level-up", "url": "t/1/"}}],
                "evolves_to": []
            }]
        }
    })
}

/// Page URL in PokeAPI's format
pub(crate) fn page_url(offset: u32, limit: u32) -> String {
    format!("{API}/pokemon?offset={offset}&limit={limit}")
}

enum Script {
    /// Serve `total` Pokémon with ids `1..=total`, paged like PokeAPI
    Paged { total: u32 },
    /// Answer every list request with the same response
    Fixed(ListPokemonRemote),
}

/// In-process stand-in for PokeAPI with call accounting and failure switches
pub(crate) struct FakeRemote {
    script: Script,
    pub list_calls: AtomicUsize,
    pub detail_calls: AtomicUsize,
    pub species_calls: AtomicUsize,
    pub requests: Mutex<Vec<(u32, u32)>>,
    fail_list: Option<u16>,
    fail_detail: Option<String>,
    detail_delay: Option<Duration>,
}

impl FakeRemote {
    pub(crate) fn paged(total: u32) -> Self {
        Self::with_script(Script::Paged { total })
    }

    pub(crate) fn fixed(response: ListPokemonRemote) -> Self {
        Self::with_script(Script::Fixed(response))
    }

    fn with_script(script: Script) -> Self {
        Self {
            script,
            list_calls: AtomicUsize::new(0),
            detail_calls: AtomicUsize::new(0),
            species_calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            fail_list: None,
            fail_detail: None,
            detail_delay: None,
        }
    }

    pub(crate) fn failing_list(self) -> Self {
        self.failing_list_with(503)
    }

    pub(crate) fn failing_list_with(mut self, status: u16) -> Self {
        self.fail_list = Some(status);
        self
    }

    /// Every detail request sleeps this long before answering
    pub(crate) fn slow_details(mut self, delay: Duration) -> Self {
        self.detail_delay = Some(delay);
        self
    }

    pub(crate) fn failing_detail(mut self, name: impl Into<String>) -> Self {
        self.fail_detail = Some(name.into());
        self
    }

    pub(crate) fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn detail_calls(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn species_calls(&self) -> usize {
        self.species_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn requests(&self) -> Vec<(u32, u32)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteDataSource for FakeRemote {
    async fn get_list_pokemon(&self, limit: u32, offset: u32) -> Result<ListPokemonRemote> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push((limit, offset));
        if let Some(status) = self.fail_list {
            return Err(Error::http_status(status, "list unavailable"));
        }

        match &self.script {
            Script::Fixed(response) => Ok(response.clone()),
            Script::Paged { total } => {
                let start = offset.min(*total);
                let end = offset.saturating_add(limit).min(*total);
                let next = (end < *total).then(|| page_url(end, limit));
                let previous = (offset > 0).then(|| page_url(offset.saturating_sub(limit), limit));
                Ok(ListPokemonRemote {
                    count: *total,
                    next,
                    previous,
                    results: (start + 1..=end).map(summary).collect(),
                })
            }
        }
    }

    async fn get_pokemon_details(&self, id: &str) -> Result<PokemonDetailRemote> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.detail_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_detail.as_deref() == Some(id) {
            return Err(Error::Timeout { timeout_ms: 30_000 });
        }
        let numeric = id_from_name(id).or_else(|| id.parse().ok()).unwrap_or(0);
        Ok(serde_json::from_value(detail_json(numeric, id))?)
    }

    async fn get_pokemon_species(&self, name: &str) -> Result<PokemonSpeciesRemote> {
        self.species_calls.fetch_add(1, Ordering::SeqCst);
        let id = id_from_name(name).ok_or_else(|| Error::http_status(404, "Not Found"))?;
        Ok(serde_json::from_value(species_json(id, name, Some(id)))?)
    }

    async fn get_evolution_chain(&self, url: &str) -> Result<EvolutionChainRemote> {
        let chain_id = NamedResource::new("", url)
            .id()
            .ok_or_else(|| Error::http_status(404, "Not Found"))?;
        Ok(serde_json::from_value(chain_json(chain_id, chain_id))?)
    }
}

/// Memory store that records which operations ran, optionally failing one
#[derive(Default)]
pub(crate) struct RecordingStore {
    pub inner: MemoryStore,
    calls: Mutex<Vec<&'static str>>,
    fail_on: Option<&'static str>,
}

impl RecordingStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn failing_on(op: &'static str) -> Self {
        Self {
            fail_on: Some(op),
            ..Self::default()
        }
    }

    /// Write operations in call order (reads are not recorded)
    pub(crate) fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, op: &'static str) -> Result<()> {
        self.calls.lock().unwrap().push(op);
        if self.fail_on == Some(op) {
            return Err(Error::storage(format!("{op} failed")));
        }
        Ok(())
    }
}

#[async_trait]
impl LocalDataSource for RecordingStore {
    async fn save_all_pokemons(&self, pokemons: Vec<PokemonEntity>) -> Result<()> {
        self.record("save_all_pokemons")?;
        self.inner.save_all_pokemons(pokemons).await
    }

    async fn save_all_remote_keys(&self, keys: Vec<RemoteKey>) -> Result<()> {
        self.record("save_all_remote_keys")?;
        self.inner.save_all_remote_keys(keys).await
    }

    async fn save_all_pokemon_details(&self, details: Vec<PokemonDetailEntity>) -> Result<()> {
        self.record("save_all_pokemon_details")?;
        self.inner.save_all_pokemon_details(details).await
    }

    async fn save_all_pokemon_species(&self, species: Vec<PokemonSpeciesEntity>) -> Result<()> {
        self.record("save_all_pokemon_species")?;
        self.inner.save_all_pokemon_species(species).await
    }

    async fn save_evolution_chain(&self, chain: EvolutionChainEntity) -> Result<()> {
        self.record("save_evolution_chain")?;
        self.inner.save_evolution_chain(chain).await
    }

    async fn remote_key(&self, pokemon_id: u32) -> Result<Option<RemoteKey>> {
        if self.fail_on == Some("remote_key") {
            return Err(Error::storage("remote_key failed"));
        }
        self.inner.remote_key(pokemon_id).await
    }

    async fn pokemons(&self, offset: usize, limit: usize) -> Result<Vec<PokemonEntity>> {
        self.inner.pokemons(offset, limit).await
    }

    async fn pokemon_and_detail(&self, name: &str) -> Result<Option<PokemonAndDetail>> {
        self.inner.pokemon_and_detail(name).await
    }

    async fn count(&self) -> Result<usize> {
        self.inner.count().await
    }

    async fn clear_all(&self) -> Result<()> {
        self.record("clear_all")?;
        self.inner.clear_all().await
    }
}
