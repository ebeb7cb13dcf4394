//! Remote mediator
//!
//! Bridges the paginated Pokémon list endpoint and the local cache. One call
//! to [`PokemonRemoteMediator::load`] is one fetch → enrich → persist cycle.

use super::offset::offset_from_url;
use super::types::{LoadOutcome, LoadType, PagingSnapshot};
use crate::error::Result;
use crate::local::{
    LocalDataSource, PageBatch, PokemonDetailEntity, PokemonEntity, PokemonSpeciesEntity,
    RemoteKey,
};
use crate::remote::{NamedResource, PokemonDetailRemote, RemoteDataSource};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Page size requested from the remote, independent of the UI page size
pub const DEFAULT_REMOTE_LIMIT: u32 = 100;

/// Detail requests kept in flight at once
pub const DEFAULT_DETAIL_CONCURRENCY: usize = 8;

/// Mediator tuning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediatorConfig {
    /// `limit` sent with every list request
    pub remote_limit: u32,
    /// Upper bound on concurrent detail fetches
    pub detail_concurrency: usize,
}

impl Default for MediatorConfig {
    fn default() -> Self {
        Self {
            remote_limit: DEFAULT_REMOTE_LIMIT,
            detail_concurrency: DEFAULT_DETAIL_CONCURRENCY,
        }
    }
}

/// Keeps the local cache in step with PokeAPI's list.
///
/// Not meant for overlapping calls: the consumer issues one `load` at a time.
pub struct PokemonRemoteMediator {
    remote: Arc<dyn RemoteDataSource>,
    local: Arc<dyn LocalDataSource>,
    config: MediatorConfig,
}

impl PokemonRemoteMediator {
    pub fn new(remote: Arc<dyn RemoteDataSource>, local: Arc<dyn LocalDataSource>) -> Self {
        Self::with_config(remote, local, MediatorConfig::default())
    }

    pub fn with_config(
        remote: Arc<dyn RemoteDataSource>,
        local: Arc<dyn LocalDataSource>,
        config: MediatorConfig,
    ) -> Self {
        Self {
            remote,
            local,
            config,
        }
    }

    pub fn config(&self) -> &MediatorConfig {
        &self.config
    }

    /// Run one load. Never fails: every error becomes `LoadOutcome::Failure`.
    pub async fn load(
        &self,
        load_type: LoadType,
        snapshot: &PagingSnapshot<PokemonEntity>,
    ) -> LoadOutcome {
        let outcome = LoadOutcome::from(self.try_load(load_type, snapshot).await);
        match &outcome {
            LoadOutcome::Success {
                end_of_pagination_reached,
            } => info!(%load_type, end_of_pagination_reached, "load finished"),
            LoadOutcome::Failure { cause } => warn!(%load_type, error = %cause, "load failed"),
        }
        outcome
    }

    /// `next_offset` stored for the last loaded item, if any
    pub async fn offset_parameter(
        &self,
        snapshot: &PagingSnapshot<PokemonEntity>,
    ) -> Result<Option<u32>> {
        let Some(last) = snapshot.last_item() else {
            return Ok(None);
        };
        let key = self.local.remote_key(last.id).await?;
        if key.is_none() {
            debug!(pokemon_id = last.id, "no remote key for last loaded item");
        }
        Ok(key.and_then(|key| key.next_offset))
    }

    async fn try_load(
        &self,
        load_type: LoadType,
        snapshot: &PagingSnapshot<PokemonEntity>,
    ) -> Result<bool> {
        let offset = match load_type {
            LoadType::Refresh => 0,
            LoadType::Prepend => return Ok(true),
            LoadType::Append => match self.offset_parameter(snapshot).await? {
                Some(offset) => offset,
                None => return Ok(true),
            },
        };

        let response = self
            .remote
            .get_list_pokemon(self.config.remote_limit, offset)
            .await?;
        debug!(
            offset,
            results = response.results.len(),
            has_next = response.next.is_some(),
            "fetched list page"
        );

        // all details before any write: a failed or dropped load persists nothing
        let details = self.fetch_details(&response.results).await?;

        let prev_offset = offset_from_url(response.previous.as_deref())?;
        let next_offset = offset_from_url(response.next.as_deref())?;

        let batch = page_batch(&response.results, &details, prev_offset, next_offset);
        self.local
            .save_page(batch, load_type == LoadType::Refresh)
            .await?;
        debug!(
            count = details.len(),
            ?prev_offset,
            ?next_offset,
            "persisted page"
        );

        Ok(response.results.is_empty() || response.next.is_none())
    }

    /// Fetch every detail with bounded fan-out; the first error aborts the rest
    async fn fetch_details(&self, summaries: &[NamedResource]) -> Result<Vec<PokemonDetailRemote>> {
        stream::iter(summaries)
            .map(|summary| self.remote.get_pokemon_details(&summary.name))
            .boxed()
            .buffered(self.config.detail_concurrency.max(1))
            .try_collect()
            .await
    }
}

/// Rows for one page; every key carries the page's offsets
fn page_batch(
    summaries: &[NamedResource],
    details: &[PokemonDetailRemote],
    prev_offset: Option<u32>,
    next_offset: Option<u32>,
) -> PageBatch {
    PageBatch {
        pokemons: summaries
            .iter()
            .zip(details)
            .map(|(summary, detail)| PokemonEntity::from_remote(summary, detail))
            .collect(),
        remote_keys: details
            .iter()
            .map(|detail| RemoteKey::new(detail.id, prev_offset, next_offset))
            .collect(),
        details: details.iter().map(PokemonDetailEntity::from).collect(),
        species: details
            .iter()
            .map(PokemonSpeciesEntity::from_detail)
            .collect(),
    }
}

impl std::fmt::Debug for PokemonRemoteMediator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PokemonRemoteMediator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
