//! Paging module
//!
//! Keeps the local cache synchronized with PokeAPI's paginated list.
//!
//! # Overview
//!
//! - `PokemonRemoteMediator` - one fetch → enrich → persist cycle per load,
//!   reporting a `LoadOutcome` and never an error
//! - `Pager` - the consumer: serves cached pages, asks the mediator for more
//!   and publishes `PagerState` on a watch channel
//! - `offset_from_url` - reads the `offset` parameter out of page links

mod mediator;
mod offset;
mod pager;
mod types;

pub use mediator::{
    MediatorConfig, PokemonRemoteMediator, DEFAULT_DETAIL_CONCURRENCY, DEFAULT_REMOTE_LIMIT,
};
pub use offset::{offset_from_query, offset_from_url, OFFSET_PARAM};
pub use pager::{Pager, DEFAULT_PAGE_SIZE};
pub use types::{LoadOutcome, LoadState, LoadType, Page, PagerState, PagingSnapshot};

#[cfg(test)]
mod tests;
