//! Tests for the paging module

use super::*;
use crate::error::Error;
use crate::local::{DuckDbStore, LocalDataSource, PokemonEntity};
use crate::remote::ListPokemonRemote;
use crate::testing::{detail, page_url, summary, FakeRemote, RecordingStore};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

const ALL_WRITES: [&str; 5] = [
    "clear_all",
    "save_all_pokemons",
    "save_all_remote_keys",
    "save_all_pokemon_details",
    "save_all_pokemon_species",
];

fn mediator(remote: &Arc<FakeRemote>, local: &Arc<RecordingStore>) -> PokemonRemoteMediator {
    PokemonRemoteMediator::new(remote.clone(), local.clone())
}

fn row(id: u32) -> PokemonEntity {
    PokemonEntity::from_remote(&summary(id), &detail(id))
}

fn snapshot_of(ids: &[u32]) -> PagingSnapshot<PokemonEntity> {
    PagingSnapshot::new(
        vec![Page::new(ids.iter().map(|id| row(*id)).collect(), 0)],
        None,
        10,
    )
}

fn scripted(ids: std::ops::RangeInclusive<u32>, previous: Option<String>, next: Option<String>) -> FakeRemote {
    FakeRemote::fixed(ListPokemonRemote {
        count: 1302,
        next,
        previous,
        results: ids.map(summary).collect(),
    })
}

// ============================================================================
// Snapshot Tests
// ============================================================================

#[test]
fn test_snapshot_last_item_skips_trailing_empty_pages() {
    let snapshot = PagingSnapshot::new(
        vec![
            Page::new(vec![row(1), row(2)], 0),
            Page::new(vec![row(3)], 2),
            Page::new(vec![], 3),
        ],
        Some(1),
        2,
    );

    assert_eq!(snapshot.last_item().map(|p| p.id), Some(3));
    assert_eq!(snapshot.first_item().map(|p| p.id), Some(1));
    assert_eq!(snapshot.item_count(), 3);
    assert!(PagingSnapshot::<PokemonEntity>::empty(10).last_item().is_none());
}

#[test]
fn test_load_type_parse_and_display() {
    assert_eq!("Append".parse::<LoadType>().unwrap(), LoadType::Append);
    assert_eq!(LoadType::Refresh.to_string(), "refresh");
    assert!("sideways".parse::<LoadType>().is_err());
}

// ============================================================================
// Mediator: Refresh
// ============================================================================

#[tokio::test]
async fn test_refresh_with_next_link_is_not_end_of_pagination() {
    let remote = Arc::new(scripted(1..=3, None, Some(page_url(100, 100))));
    let local = Arc::new(RecordingStore::new());

    let outcome = mediator(&remote, &local)
        .load(LoadType::Refresh, &snapshot_of(&[50, 51]))
        .await;

    assert_eq!(outcome.end_of_pagination_reached(), Some(false));
    assert_eq!(remote.requests(), vec![(100, 0)]);
}

#[tokio::test]
async fn test_refresh_empty_results_is_end_of_pagination_even_with_next() {
    let remote = Arc::new(scripted(1..=0, None, Some(page_url(100, 100))));
    let local = Arc::new(RecordingStore::new());

    let outcome = mediator(&remote, &local)
        .load(LoadType::Refresh, &PagingSnapshot::empty(10))
        .await;

    assert_eq!(outcome.end_of_pagination_reached(), Some(true));
    assert_eq!(remote.detail_calls(), 0);
    // the empty batch is still written
    assert_eq!(local.calls(), ALL_WRITES.to_vec());
    assert_eq!(local.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_refresh_list_failure_persists_nothing() {
    let remote = Arc::new(FakeRemote::paged(30).failing_list());
    let local = Arc::new(RecordingStore::new());

    let outcome = mediator(&remote, &local)
        .load(LoadType::Refresh, &PagingSnapshot::empty(10))
        .await;

    assert!(!outcome.is_success());
    assert!(matches!(
        outcome.error(),
        Some(Error::HttpStatus { status: 503, .. })
    ));
    assert!(local.calls().is_empty());
}

fn fan_out_of_four(remote: &Arc<FakeRemote>, local: Arc<dyn LocalDataSource>) -> PokemonRemoteMediator {
    PokemonRemoteMediator::with_config(
        remote.clone(),
        local,
        MediatorConfig {
            remote_limit: 100,
            detail_concurrency: 4,
        },
    )
}

#[tokio::test]
async fn test_refresh_detail_failure_fails_whole_page() {
    let remote = Arc::new(FakeRemote::paged(30).failing_detail("pokemon-7"));
    let local = Arc::new(RecordingStore::new());

    let outcome = fan_out_of_four(&remote, local.clone())
        .load(LoadType::Refresh, &PagingSnapshot::empty(10))
        .await;

    assert!(matches!(outcome.error(), Some(Error::Timeout { .. })));
    assert!(local.calls().is_empty());
    assert_eq!(local.count().await.unwrap(), 0);
    // the failure stops the fan-out: at most one window past item 7 started
    let calls = remote.detail_calls();
    assert!((7..=10).contains(&calls), "{calls} detail requests");
}

#[tokio::test]
async fn test_dropped_refresh_writes_nothing() {
    let remote = Arc::new(FakeRemote::paged(30).slow_details(Duration::from_secs(5)));
    let local = Arc::new(RecordingStore::new());
    local.inner.save_all_pokemons(vec![row(999)]).await.unwrap();
    let mediator = fan_out_of_four(&remote, local.clone());

    let snapshot = PagingSnapshot::empty(10);
    let load = mediator.load(LoadType::Refresh, &snapshot);
    assert!(tokio::time::timeout(Duration::from_millis(50), load)
        .await
        .is_err());

    assert_eq!(remote.detail_calls(), 4);
    assert!(local.calls().is_empty());
    // not even the refresh clear ran
    assert_eq!(local.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_refresh_persists_in_order_and_clears_first() {
    let remote = Arc::new(FakeRemote::paged(30));
    let local = Arc::new(RecordingStore::new());
    let mediator = mediator(&remote, &local);

    // stale row from an earlier sync
    local.inner.save_all_pokemons(vec![row(999)]).await.unwrap();

    let outcome = mediator
        .load(LoadType::Refresh, &PagingSnapshot::empty(10))
        .await;

    assert_eq!(outcome.end_of_pagination_reached(), Some(true));
    assert_eq!(local.calls(), ALL_WRITES.to_vec());
    assert_eq!(local.count().await.unwrap(), 30);
    assert!(local
        .pokemons(0, 100)
        .await
        .unwrap()
        .iter()
        .all(|p| p.id != 999));
}

#[tokio::test]
async fn test_refresh_storage_failure_is_failure_outcome() {
    let remote = Arc::new(FakeRemote::paged(30));
    let local = Arc::new(RecordingStore::failing_on("save_all_remote_keys"));

    let outcome = mediator(&remote, &local)
        .load(LoadType::Refresh, &PagingSnapshot::empty(10))
        .await;

    let cause = outcome.error().unwrap();
    assert!(cause.is_storage());
    assert_eq!(
        local.calls(),
        vec!["clear_all", "save_all_pokemons", "save_all_remote_keys"]
    );
}

#[tokio::test]
async fn test_failed_refresh_on_duckdb_keeps_previous_page_and_keys() {
    let remote = Arc::new(FakeRemote::paged(30));
    let store = Arc::new(DuckDbStore::in_memory().unwrap());
    let mediator = PokemonRemoteMediator::with_config(
        remote.clone(),
        store.clone(),
        MediatorConfig {
            remote_limit: 10,
            detail_concurrency: 4,
        },
    );

    let outcome = mediator
        .load(LoadType::Refresh, &PagingSnapshot::empty(10))
        .await;
    assert_eq!(outcome.end_of_pagination_reached(), Some(false));

    store.execute_batch("DROP TABLE pokemon_species").unwrap();
    let outcome = mediator
        .load(LoadType::Refresh, &PagingSnapshot::empty(10))
        .await;
    assert!(outcome.error().unwrap().is_storage());

    let cached = store.pokemons(0, 100).await.unwrap();
    assert_eq!(cached.len(), 10);
    let snapshot = PagingSnapshot::new(vec![Page::new(cached, 0)], None, 10);
    assert_eq!(mediator.offset_parameter(&snapshot).await.unwrap(), Some(10));
}

#[tokio::test]
async fn test_refresh_scenario_ten_results() {
    let remote = Arc::new(scripted(
        1..=10,
        None,
        Some("https://pokeapi.co/api/v2/pokemon?offset=10&limit=10".to_string()),
    ));
    let local = Arc::new(RecordingStore::new());

    let outcome = mediator(&remote, &local)
        .load(LoadType::Refresh, &PagingSnapshot::empty(10))
        .await;

    assert_eq!(outcome.end_of_pagination_reached(), Some(false));
    assert_eq!(remote.detail_calls(), 10);
    assert_eq!(local.count().await.unwrap(), 10);
    for id in 1..=10 {
        let key = local.remote_key(id).await.unwrap().unwrap();
        assert_eq!((key.prev_offset, key.next_offset), (None, Some(10)));
    }
}

#[tokio::test]
async fn test_refresh_with_fan_out_of_one_keeps_order() {
    let remote = Arc::new(FakeRemote::paged(12));
    let local = Arc::new(RecordingStore::new());
    let mediator = PokemonRemoteMediator::with_config(
        remote.clone(),
        local.clone(),
        MediatorConfig {
            remote_limit: 5,
            detail_concurrency: 0,
        },
    );

    let outcome = mediator
        .load(LoadType::Refresh, &PagingSnapshot::empty(5))
        .await;

    assert_eq!(outcome.end_of_pagination_reached(), Some(false));
    let ids: Vec<u32> = local
        .pokemons(0, 10)
        .await
        .unwrap()
        .iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn test_malformed_next_link_fails_before_writing() {
    let remote = Arc::new(scripted(1..=3, None, Some("not a url".to_string())));
    let local = Arc::new(RecordingStore::new());

    let outcome = mediator(&remote, &local)
        .load(LoadType::Refresh, &PagingSnapshot::empty(10))
        .await;

    assert!(outcome.error().unwrap().is_transport());
    assert!(local.calls().is_empty());
}

// ============================================================================
// Mediator: Prepend / Append
// ============================================================================

#[tokio::test]
async fn test_prepend_is_always_end_without_io() {
    let remote = Arc::new(FakeRemote::paged(30));
    let local = Arc::new(RecordingStore::new());

    let outcome = mediator(&remote, &local)
        .load(LoadType::Prepend, &snapshot_of(&[1, 2, 3]))
        .await;

    assert_eq!(outcome.end_of_pagination_reached(), Some(true));
    assert_eq!(remote.list_calls(), 0);
    assert!(local.calls().is_empty());
}

#[tokio::test]
async fn test_append_without_remote_key_short_circuits() {
    let remote = Arc::new(FakeRemote::paged(30));
    let local = Arc::new(RecordingStore::new());
    let mediator = mediator(&remote, &local);
    let snapshot = snapshot_of(&[1, 2]);

    assert_eq!(mediator.offset_parameter(&snapshot).await.unwrap(), None);

    let outcome = mediator.load(LoadType::Append, &snapshot).await;
    assert_eq!(outcome.end_of_pagination_reached(), Some(true));
    assert_eq!(remote.list_calls(), 0);
    assert!(local.calls().is_empty());
}

#[tokio::test]
async fn test_append_with_empty_snapshot_short_circuits() {
    let remote = Arc::new(FakeRemote::paged(30));
    let local = Arc::new(RecordingStore::new());

    let outcome = mediator(&remote, &local)
        .load(LoadType::Append, &PagingSnapshot::empty(10))
        .await;

    assert_eq!(outcome.end_of_pagination_reached(), Some(true));
    assert_eq!(remote.list_calls(), 0);
}

#[tokio::test]
async fn test_append_uses_stored_next_offset_and_keeps_cache() {
    let remote = Arc::new(FakeRemote::paged(250));
    let local = Arc::new(RecordingStore::new());
    let mediator = mediator(&remote, &local);

    mediator
        .load(LoadType::Refresh, &PagingSnapshot::empty(10))
        .await;
    let outcome = mediator.load(LoadType::Append, &snapshot_of(&[99, 100])).await;

    assert_eq!(outcome.end_of_pagination_reached(), Some(false));
    assert_eq!(remote.requests(), vec![(100, 0), (100, 100)]);
    assert_eq!(local.count().await.unwrap(), 200);
    assert!(!local.calls()[5..].contains(&"clear_all"));

    let key = local.remote_key(150).await.unwrap().unwrap();
    assert_eq!((key.prev_offset, key.next_offset), (Some(0), Some(200)));
}

#[tokio::test]
async fn test_append_after_last_page_stops() {
    let remote = Arc::new(FakeRemote::paged(150));
    let local = Arc::new(RecordingStore::new());
    let mediator = mediator(&remote, &local);

    mediator
        .load(LoadType::Refresh, &PagingSnapshot::empty(10))
        .await;
    let last = mediator.load(LoadType::Append, &snapshot_of(&[100])).await;
    assert_eq!(last.end_of_pagination_reached(), Some(true));

    // the final page's keys carry no next offset
    assert_eq!(
        mediator.offset_parameter(&snapshot_of(&[150])).await.unwrap(),
        None
    );
    let after = mediator.load(LoadType::Append, &snapshot_of(&[150])).await;
    assert_eq!(after.end_of_pagination_reached(), Some(true));
    assert_eq!(remote.list_calls(), 2);
}

#[tokio::test]
async fn test_offset_parameter_roundtrip() {
    let remote = Arc::new(FakeRemote::paged(500));
    let local = Arc::new(RecordingStore::new());
    let mediator = mediator(&remote, &local);

    mediator
        .load(LoadType::Refresh, &PagingSnapshot::empty(10))
        .await;

    assert_eq!(
        mediator.offset_parameter(&snapshot_of(&[100])).await.unwrap(),
        Some(100)
    );
}

#[tokio::test]
async fn test_offset_lookup_failure_is_failure_outcome() {
    let remote = Arc::new(FakeRemote::paged(30));
    let local = Arc::new(RecordingStore::failing_on("remote_key"));

    let outcome = mediator(&remote, &local)
        .load(LoadType::Append, &snapshot_of(&[1]))
        .await;

    assert!(outcome.error().unwrap().is_storage());
    assert_eq!(remote.list_calls(), 0);
}

// ============================================================================
// Pager
// ============================================================================

fn pager(remote: &Arc<FakeRemote>, local: &Arc<RecordingStore>, page_size: usize) -> Pager {
    let mediator = PokemonRemoteMediator::with_config(
        remote.clone(),
        local.clone(),
        MediatorConfig {
            remote_limit: 10,
            detail_concurrency: 4,
        },
    );
    Pager::new(mediator, local.clone(), page_size)
}

#[tokio::test]
async fn test_pager_refresh_then_append_through_the_list() {
    let remote = Arc::new(FakeRemote::paged(25));
    let local = Arc::new(RecordingStore::new());
    let mut pager = pager(&remote, &local, 4);

    pager.refresh().await;
    assert!(!pager.state().refresh.is_loading());
    assert_eq!(pager.items().count(), 4);
    assert_eq!(
        pager.state().refresh,
        LoadState::NotLoading {
            end_of_pagination_reached: false
        }
    );

    // cached rows first, remote only when the cache runs short
    pager.append().await;
    pager.append().await;
    assert_eq!(pager.items().count(), 12);
    assert_eq!(remote.list_calls(), 2);

    while !pager.state().append.end_of_pagination_reached() {
        pager.append().await;
        assert!(!pager.state().append.is_error());
    }

    let ids: Vec<u32> = pager.items().map(|p| p.id).collect();
    assert_eq!(ids, (1..=25).collect::<Vec<_>>());
    assert_eq!(remote.list_calls(), 3);
    assert_eq!(pager.state().item_count, 25);

    // further appends are no-ops
    pager.append().await;
    assert_eq!(remote.list_calls(), 3);
}

#[tokio::test]
async fn test_pager_refresh_failure_then_retry() {
    let remote = Arc::new(FakeRemote::paged(25).failing_list());
    let local = Arc::new(RecordingStore::new());
    let mut pager = pager(&remote, &local, 4);

    pager.refresh().await;
    let state = pager.state();
    assert!(state.refresh.is_error());
    assert!(matches!(
        state.refresh,
        LoadState::Error {
            retryable: true,
            ..
        }
    ));
    assert_eq!(pager.items().count(), 0);

    pager.retry().await;
    assert_eq!(remote.list_calls(), 2);
    assert!(pager.state().refresh.is_error());
}

#[tokio::test]
async fn test_pager_not_found_is_not_retryable() {
    let remote = Arc::new(FakeRemote::paged(25).failing_list_with(404));
    let local = Arc::new(RecordingStore::new());
    let mut pager = pager(&remote, &local, 4);

    pager.refresh().await;
    assert!(matches!(
        pager.state().refresh,
        LoadState::Error {
            retryable: false,
            ..
        }
    ));
}

#[tokio::test]
async fn test_pager_publishes_state_changes() {
    let remote = Arc::new(FakeRemote::paged(8));
    let local = Arc::new(RecordingStore::new());
    let mut pager = pager(&remote, &local, 4);
    let mut rx = pager.subscribe();

    pager.refresh().await;

    assert!(rx.has_changed().unwrap());
    let seen = rx.borrow_and_update().clone();
    assert_eq!(seen.item_count, 4);
    assert_eq!(
        seen.refresh,
        LoadState::NotLoading {
            end_of_pagination_reached: true
        }
    );
}

#[tokio::test]
async fn test_pager_prepend_is_end_of_pagination() {
    let remote = Arc::new(FakeRemote::paged(8));
    let local = Arc::new(RecordingStore::new());
    let mut pager = pager(&remote, &local, 4);

    pager.load(LoadType::Prepend).await;

    assert!(pager.state().prepend.end_of_pagination_reached());
    assert_eq!(remote.list_calls(), 0);
}

#[tokio::test]
async fn test_pager_serves_persisted_cache_without_refresh() {
    let remote = Arc::new(FakeRemote::paged(25));
    let local = Arc::new(RecordingStore::new());

    // a previous session filled the first remote page
    pager(&remote, &local, 4).refresh().await;
    assert_eq!(remote.list_calls(), 1);

    let mut restarted = pager(&remote, &local, 4);
    restarted.append().await;
    restarted.append().await;
    assert_eq!(restarted.items().count(), 8);
    assert_eq!(remote.list_calls(), 1);

    // the third page crosses the cached range and resumes from the stored key
    restarted.append().await;
    assert_eq!(restarted.items().count(), 12);
    assert_eq!(remote.requests().last(), Some(&(10, 10)));
}
