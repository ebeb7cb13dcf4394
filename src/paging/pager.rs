//! Paging consumer
//!
//! Serves fixed-size pages out of the local cache and calls the mediator when
//! the cache runs dry. Status changes are published on a `watch` channel so a
//! UI (or the HTTP server) can follow along without polling.

use super::mediator::PokemonRemoteMediator;
use super::types::{LoadOutcome, LoadState, LoadType, Page, PagerState, PagingSnapshot};
use crate::error::{Error, Result};
use crate::local::{LocalDataSource, PokemonEntity};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// Default number of rows per consumer page
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Drives a [`PokemonRemoteMediator`] the way a list screen would
pub struct Pager {
    mediator: PokemonRemoteMediator,
    local: Arc<dyn LocalDataSource>,
    page_size: usize,
    pages: Vec<Page<PokemonEntity>>,
    remote_exhausted: bool,
    last_failed: Option<LoadType>,
    state: watch::Sender<PagerState>,
}

impl Pager {
    pub fn new(
        mediator: PokemonRemoteMediator,
        local: Arc<dyn LocalDataSource>,
        page_size: usize,
    ) -> Self {
        let (state, _) = watch::channel(PagerState::default());
        Self {
            mediator,
            local,
            page_size: page_size.max(1),
            pages: Vec::new(),
            remote_exhausted: false,
            last_failed: None,
            state,
        }
    }

    /// Follow state changes
    pub fn subscribe(&self) -> watch::Receiver<PagerState> {
        self.state.subscribe()
    }

    /// Current state
    pub fn state(&self) -> PagerState {
        self.state.borrow().clone()
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Loaded rows in display order
    pub fn items(&self) -> impl Iterator<Item = &PokemonEntity> {
        self.pages.iter().flat_map(|page| page.data.iter())
    }

    /// What the mediator sees of this pager
    pub fn snapshot(&self) -> PagingSnapshot<PokemonEntity> {
        let item_count: usize = self.pages.iter().map(|p| p.data.len()).sum();
        PagingSnapshot::new(
            self.pages.clone(),
            item_count.checked_sub(1),
            self.page_size,
        )
    }

    /// Run one load in the given direction
    pub async fn load(&mut self, load_type: LoadType) {
        match load_type {
            LoadType::Refresh => self.refresh().await,
            LoadType::Prepend => self.prepend().await,
            LoadType::Append => self.append().await,
        }
    }

    /// Resync from offset zero, then show the first cached page
    pub async fn refresh(&mut self) {
        self.set_load_state(LoadType::Refresh, LoadState::Loading);

        let outcome = self
            .mediator
            .load(LoadType::Refresh, &PagingSnapshot::empty(self.page_size))
            .await;
        let end = match outcome {
            LoadOutcome::Success {
                end_of_pagination_reached,
            } => end_of_pagination_reached,
            LoadOutcome::Failure { cause } => return self.fail(LoadType::Refresh, &cause),
        };

        self.pages.clear();
        self.remote_exhausted = end;
        match self.read_page(0).await {
            Ok(page) => {
                if !page.is_empty() {
                    self.pages.push(page);
                }
                self.succeed(LoadType::Refresh, end);
                // a fresh list can append again
                self.set_load_state(LoadType::Append, LoadState::default());
            }
            Err(cause) => self.fail(LoadType::Refresh, &cause),
        }
    }

    /// Backward paging is not supported by the list endpoint
    pub async fn prepend(&mut self) {
        let outcome = self
            .mediator
            .load(LoadType::Prepend, &self.snapshot())
            .await;
        match outcome {
            LoadOutcome::Success {
                end_of_pagination_reached,
            } => self.succeed(LoadType::Prepend, end_of_pagination_reached),
            LoadOutcome::Failure { cause } => self.fail(LoadType::Prepend, &cause),
        }
    }

    /// Show the next page, pulling from the remote when the cache runs short
    pub async fn append(&mut self) {
        if self.state.borrow().append.end_of_pagination_reached() {
            return;
        }
        self.set_load_state(LoadType::Append, LoadState::Loading);

        match self.try_append().await {
            Ok(end) => self.succeed(LoadType::Append, end),
            Err(cause) => self.fail(LoadType::Append, &cause),
        }
    }

    /// Re-run the most recent failed load, if any
    pub async fn retry(&mut self) {
        if let Some(load_type) = self.last_failed {
            debug!(%load_type, "retrying failed load");
            self.load(load_type).await;
        }
    }

    async fn try_append(&mut self) -> Result<bool> {
        let offset: usize = self.pages.iter().map(|p| p.data.len()).sum();
        let mut page = self.read_page(offset).await?;

        if page.data.len() < self.page_size && !self.remote_exhausted {
            let mut snapshot = self.snapshot();
            if !page.is_empty() {
                snapshot.pages.push(page.clone());
            }
            match self.mediator.load(LoadType::Append, &snapshot).await {
                LoadOutcome::Success {
                    end_of_pagination_reached,
                } => self.remote_exhausted = end_of_pagination_reached,
                LoadOutcome::Failure { cause } => return Err(cause),
            }
            page = self.read_page(offset).await?;
        }

        let end = self.remote_exhausted && page.data.len() < self.page_size;
        if !page.is_empty() {
            self.pages.push(page);
        }
        Ok(end)
    }

    async fn read_page(&self, offset: usize) -> Result<Page<PokemonEntity>> {
        let data = self.local.pokemons(offset, self.page_size).await?;
        Ok(Page::new(data, offset))
    }

    fn succeed(&mut self, load_type: LoadType, end_of_pagination_reached: bool) {
        if self.last_failed == Some(load_type) {
            self.last_failed = None;
        }
        self.set_load_state(
            load_type,
            LoadState::NotLoading {
                end_of_pagination_reached,
            },
        );
    }

    fn fail(&mut self, load_type: LoadType, cause: &Error) {
        self.last_failed = Some(load_type);
        self.set_load_state(
            load_type,
            LoadState::Error {
                message: cause.to_string(),
                retryable: cause.is_retryable(),
            },
        );
    }

    fn set_load_state(&self, load_type: LoadType, load_state: LoadState) {
        let item_count = self.pages.iter().map(|p| p.data.len()).sum();
        self.state.send_modify(|state| {
            *state.get_mut(load_type) = load_state;
            state.item_count = item_count;
        });
    }
}

impl std::fmt::Debug for Pager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pager")
            .field("page_size", &self.page_size)
            .field("pages", &self.pages.len())
            .field("remote_exhausted", &self.remote_exhausted)
            .finish_non_exhaustive()
    }
}
