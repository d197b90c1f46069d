//! Tests for the bounded single-flight resource cache

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use common::{counting_loader, WAIT};
use panelkit::cache::{CacheError, InvalidationSink, Lookup, ResourceCache, DEFAULT_CAPACITY};

fn keys<V>(cache: &ResourceCache<&'static str, V>) -> Vec<&'static str>
where
    V: Clone + Send + 'static,
{
    cache.keys_by_recency().copied().collect()
}

// ============================================================================
// Eviction
// ============================================================================

#[test]
fn test_capacity_plus_one_evicts_oldest() {
    let capacity = 4;
    let mut cache = ResourceCache::new(capacity);

    let mut evicted = Vec::new();
    for key in 0..=capacity {
        evicted.extend(cache.insert(key, key * 10));
    }

    assert_eq!(cache.len(), capacity);
    assert_eq!(evicted, vec![0]);
    assert!(!cache.contains(&0));
    assert!((1..=capacity).all(|key| cache.contains(&key)));
}

#[test]
fn test_get_hit_refreshes_recency() {
    let capacity = 3;
    let mut cache = ResourceCache::new(capacity);
    cache.insert("touched", 0);
    cache.insert("b", 1);
    cache.insert("c", 2);

    assert_eq!(cache.get(&"touched"), Some(0));
    for key in ["d", "e"] {
        cache.insert(key, 9);
    }
    assert!(cache.contains(&"touched"));

    // Once `capacity` other keys arrive it is the oldest again.
    cache.insert("f", 9);
    assert!(!cache.contains(&"touched"));
}

#[test]
fn test_touched_key_outlives_capacity_minus_one_inserts() {
    let capacity = 3;
    let mut cache = ResourceCache::new(capacity);
    for key in ["a", "b", "c"] {
        cache.insert(key, 0);
    }

    cache.get(&"a");
    // `capacity - 1` newer keys push out everything untouched but `a`.
    for key in ["x", "y"] {
        cache.insert(key, 1);
    }
    assert_eq!(keys(&cache), vec!["a", "x", "y"]);

    // The `capacity`-th one evicts it.
    cache.insert("z", 1);
    assert!(!cache.contains(&"a"));
    assert_eq!(keys(&cache), vec!["x", "y", "z"]);
}

#[test]
fn test_lru_scenario_capacity_two() {
    let mut cache = ResourceCache::new(2);
    cache.insert("A", 1);
    cache.insert("B", 2);
    assert_eq!(keys(&cache), vec!["A", "B"]);

    assert_eq!(cache.get(&"A"), Some(1));
    assert_eq!(keys(&cache), vec!["B", "A"]);

    assert_eq!(cache.insert("C", 3), Some("B"));
    assert_eq!(keys(&cache), vec!["A", "C"]);
    assert!(!cache.contains(&"B"));
}

#[test]
fn test_default_capacity() {
    assert_eq!(DEFAULT_CAPACITY, 6);
}

// ============================================================================
// Single flight
// ============================================================================

#[test]
fn test_overlapping_requests_share_one_loader() {
    let mut cache: ResourceCache<&str, u32> = ResourceCache::new(2);
    let calls = Arc::new(AtomicUsize::new(0));
    let (release_tx, release_rx) = mpsc::channel::<()>();

    let first = {
        let calls = Arc::clone(&calls);
        cache.request("wallpaper", move || {
            calls.fetch_add(1, Ordering::SeqCst);
            release_rx.recv_timeout(WAIT)?;
            Ok(42)
        })
    };
    let second = cache.request("wallpaper", counting_loader(&calls, 7));

    let first = first.pending().expect("first request should miss");
    let second = second.pending().expect("second request should miss");
    assert!(first.started_fetch());
    assert!(!second.started_fetch());
    assert_eq!(cache.in_flight_len(), 1);

    release_tx.send(()).unwrap();
    assert_eq!(cache.wait(&first, WAIT), Ok(42));
    assert_eq!(second.try_take(), Some(Ok(42)));

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(cache.peek(&"wallpaper"), Some(&42));
    assert!(!cache.is_in_flight(&"wallpaper"));
}

#[test]
fn test_request_hit_is_synchronous() {
    let mut cache = ResourceCache::new(2);
    cache.insert("k", 5);

    let calls = Arc::new(AtomicUsize::new(0));
    let lookup = cache.request("k", counting_loader(&calls, 99));

    assert!(lookup.is_hit());
    assert_eq!(lookup.hit(), Some(5));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_prefetch_skips_cached_and_in_flight_keys() {
    let mut cache: ResourceCache<&str, u32> = ResourceCache::new(2);
    let calls = Arc::new(AtomicUsize::new(0));

    assert!(cache.prefetch("a", counting_loader(&calls, 1)));
    assert!(!cache.prefetch("a", counting_loader(&calls, 2)));
    assert!(cache.wait_idle(WAIT));
    assert!(!cache.prefetch("a", counting_loader(&calls, 3)));

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(cache.get(&"a"), Some(1));
}

#[test]
fn test_completed_fetch_evicts_like_insert() {
    let mut cache: ResourceCache<&str, u32> = ResourceCache::new(1);
    cache.insert("old", 0);

    let calls = Arc::new(AtomicUsize::new(0));
    cache.prefetch("new", counting_loader(&calls, 1));
    assert!(cache.wait_idle(WAIT));

    assert_eq!(keys(&cache), vec!["new"]);
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_loader_failure_inserts_nothing_and_allows_retry() {
    let mut cache: ResourceCache<&str, u32> = ResourceCache::new(1);
    cache.insert("resident", 1);

    let ticket = cache
        .request("broken", || anyhow::bail!("file is not an image"))
        .pending()
        .unwrap();
    let err = cache.wait(&ticket, WAIT).unwrap_err();

    match err {
        CacheError::Load { key, message } => {
            assert!(key.contains("broken"));
            assert!(message.contains("not an image"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(keys(&cache), vec!["resident"]);
    assert!(!cache.is_in_flight(&"broken"));

    let calls = Arc::new(AtomicUsize::new(0));
    let retry = cache.request("broken", counting_loader(&calls, 2));
    let retry = retry.pending().unwrap();
    assert!(retry.started_fetch());
    assert_eq!(cache.wait(&retry, WAIT), Ok(2));
}

#[test]
fn test_wait_times_out() {
    let mut cache: ResourceCache<&str, u32> = ResourceCache::new(1);
    let (_keep_open, rx) = mpsc::channel::<()>();

    let ticket = cache
        .request("slow", move || {
            let _ = rx.recv_timeout(Duration::from_secs(2));
            Ok(1)
        })
        .pending()
        .unwrap();

    let timeout = Duration::from_millis(20);
    assert_eq!(cache.wait(&ticket, timeout), Err(CacheError::Timeout(timeout)));
    assert!(cache.is_in_flight(&"slow"));
}

#[test]
fn test_ticket_reports_disconnect_when_cache_dropped() {
    let mut cache: ResourceCache<&str, u32> = ResourceCache::new(1);
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let ticket = cache
        .request("k", move || {
            let _ = release_rx.recv_timeout(WAIT);
            Ok(1)
        })
        .pending()
        .unwrap();

    drop(cache);
    let _ = release_tx.send(());
    assert_eq!(ticket.try_take(), Some(Err(CacheError::Disconnected)));
}

// ============================================================================
// Clear and invalidation
// ============================================================================

/// Start a fetch for `key` that finishes once the returned sender fires
fn held_fetch(
    cache: &mut ResourceCache<&'static str, u32>,
    key: &'static str,
    value: u32,
    awaited: bool,
) -> (mpsc::Sender<()>, Option<panelkit::cache::Ticket<u32>>) {
    let (tx, rx) = mpsc::channel::<()>();
    let loader = move || {
        rx.recv_timeout(WAIT)?;
        Ok(value)
    };
    if awaited {
        let ticket = cache.request(key, loader).pending();
        (tx, ticket)
    } else {
        assert!(cache.prefetch(key, loader));
        (tx, None)
    }
}

#[test]
fn test_clear_discards_unawaited_results_only() {
    let mut cache = ResourceCache::new(4);
    cache.insert("cached", 0);

    let (release_bg, _) = held_fetch(&mut cache, "background", 1, false);
    let (release_fg, ticket) = held_fetch(&mut cache, "foreground", 2, true);
    let ticket = ticket.unwrap();

    cache.clear();
    assert!(cache.is_empty());

    release_bg.send(()).unwrap();
    release_fg.send(()).unwrap();
    assert_eq!(cache.wait(&ticket, WAIT), Ok(2));
    assert!(cache.wait_idle(WAIT));

    assert!(!cache.contains(&"background"));
    assert!(cache.contains(&"foreground"));
    assert!(!cache.contains(&"cached"));
}

#[test]
fn test_clear_discards_fetch_whose_ticket_was_dropped() {
    let mut cache = ResourceCache::new(4);
    let (release, ticket) = held_fetch(&mut cache, "abandoned", 7, true);
    assert!(ticket.is_some());
    drop(ticket);

    cache.clear();
    release.send(()).unwrap();
    assert!(cache.wait_idle(WAIT));

    assert!(!cache.contains(&"abandoned"));
    assert!(cache.is_empty());
}

#[test]
fn test_invalidate_drops_entry() {
    let mut cache = ResourceCache::new(3);
    cache.insert("a", 1);
    cache.insert("b", 2);

    cache.on_invalidate(&"a");
    assert_eq!(keys(&cache), vec!["b"]);

    cache.invalidate_all();
    assert!(cache.is_empty());
}

#[test]
fn test_invalidated_fetch_delivers_but_is_not_cached() {
    let mut cache = ResourceCache::new(3);
    let (release, ticket) = held_fetch(&mut cache, "wall", 1, true);
    let ticket = ticket.unwrap();

    cache.on_invalidate(&"wall");
    assert!(!cache.is_in_flight(&"wall"));

    release.send(()).unwrap();
    assert_eq!(cache.wait(&ticket, WAIT), Ok(1));
    assert!(!cache.contains(&"wall"));
}

#[test]
fn test_request_after_invalidation_starts_fresh_load() {
    let mut cache = ResourceCache::new(3);
    let (release_stale, _) = held_fetch(&mut cache, "wall", 1, false);

    cache.invalidate_all();

    let calls = Arc::new(AtomicUsize::new(0));
    let fresh = cache
        .request("wall", counting_loader(&calls, 2))
        .pending()
        .unwrap();
    assert!(fresh.started_fetch());
    assert_eq!(cache.wait(&fresh, WAIT), Ok(2));

    // The superseded load finishing later must not overwrite the fresh value.
    release_stale.send(()).unwrap();
    assert!(cache.wait_idle(WAIT));
    assert_eq!(cache.get(&"wall"), Some(2));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_lookup_variants() {
    let mut cache: ResourceCache<&str, u32> = ResourceCache::new(1);
    let calls = Arc::new(AtomicUsize::new(0));
    let lookup = cache.request("k", counting_loader(&calls, 3));
    assert!(matches!(lookup, Lookup::Pending(_)));
    assert!(lookup.hit().is_none());
    assert!(cache.wait_idle(WAIT));
}
