//! Bounded resource cache with single-flight fetching
//!
//! A [`ResourceCache`] maps keys to expensive-to-produce values (decoded
//! wallpaper thumbnails, for instance). It holds at most `capacity` entries
//! and evicts the least recently used one when a new entry pushes it over.
//!
//! ## Owner context
//!
//! The cache is owned and mutated by one thread. Misses spawn the loader on
//! a worker thread; the worker only sends its result back over a channel.
//! The owner applies results in [`ResourceCache::poll`] (or while blocking
//! in [`ResourceCache::wait`]), which is where entries are inserted,
//! evicted, and handed to whoever is waiting on them.
//!
//! ## Single flight
//!
//! At most one live loader runs per key. Requests that miss while a fetch
//! for the same key is running join it and receive the same outcome.
//!
//! Invalidating a key detaches its running fetch: callers already waiting
//! still get its result, but the result is not cached and the next request
//! starts a fresh load.

mod recency;

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

pub use recency::RecencyOrder;

/// Capacity used when none is configured
pub const DEFAULT_CAPACITY: usize = 6;

/// Errors delivered to callers waiting on a fetch
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    /// The loader failed. Nothing was inserted or evicted.
    #[error("failed to load {key}: {message}")]
    Load { key: String, message: String },
    /// The cache went away before the fetch finished
    #[error("cache dropped before the fetch completed")]
    Disconnected,
    /// [`ResourceCache::wait`] gave up
    #[error("fetch did not complete within {0:?}")]
    Timeout(Duration),
}

/// Outcome of [`ResourceCache::request`]
#[derive(Debug)]
pub enum Lookup<V> {
    /// Cached value, returned synchronously
    Hit(V),
    /// A fetch is running; the ticket resolves once the owner applies it
    Pending(Ticket<V>),
}

impl<V> Lookup<V> {
    pub fn is_hit(&self) -> bool {
        matches!(self, Lookup::Hit(_))
    }

    /// The cached value, if this was a hit
    pub fn hit(self) -> Option<V> {
        match self {
            Lookup::Hit(value) => Some(value),
            Lookup::Pending(_) => None,
        }
    }

    /// The ticket, if this was a miss
    pub fn pending(self) -> Option<Ticket<V>> {
        match self {
            Lookup::Hit(_) => None,
            Lookup::Pending(ticket) => Some(ticket),
        }
    }
}

/// Receives the outcome of one in-flight fetch
#[derive(Debug)]
pub struct Ticket<V> {
    rx: Receiver<Result<V, CacheError>>,
    started_fetch: bool,
    /// Kept alive while the caller holds the ticket
    _alive: Arc<()>,
}

impl<V> Ticket<V> {
    /// `true` if this request started the loader, `false` if it joined
    /// a fetch that was already running
    pub fn started_fetch(&self) -> bool {
        self.started_fetch
    }

    /// Take the outcome if the owner has already applied it
    pub fn try_take(&self) -> Option<Result<V, CacheError>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(CacheError::Disconnected)),
        }
    }
}

/// Receives invalidation events from an external watcher
pub trait InvalidationSink<K> {
    /// The resource behind `key` changed
    fn on_invalidate(&mut self, key: &K);

    /// Everything may have changed
    fn invalidate_all(&mut self);
}

struct Waiter<V> {
    tx: Sender<Result<V, CacheError>>,
    ticket: Weak<()>,
}

impl<V> Waiter<V> {
    /// Whether the caller still holds its ticket
    fn is_waiting(&self) -> bool {
        self.ticket.strong_count() > 0
    }

    fn deliver(self, result: Result<V, CacheError>) {
        // A dropped ticket just means nobody reads it.
        let _ = self.tx.send(result);
    }
}

type Waiters<V> = Vec<Waiter<V>>;

struct InFlight<V> {
    id: u64,
    waiters: Waiters<V>,
}

struct Completion<K, V> {
    id: u64,
    key: K,
    result: anyhow::Result<V>,
}

/// Bounded LRU cache with single-flight asynchronous loading
pub struct ResourceCache<K, V> {
    capacity: usize,
    entries: HashMap<K, V>,
    order: RecencyOrder<K>,
    in_flight: HashMap<K, InFlight<V>>,
    /// Fetches superseded by invalidation, by fetch id
    detached: HashMap<u64, Waiters<V>>,
    next_fetch_id: u64,
    completion_tx: Sender<Completion<K, V>>,
    completion_rx: Receiver<Completion<K, V>>,
}

impl<K, V> ResourceCache<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug + Send + 'static,
    V: Clone + Send + 'static,
{
    /// Create a cache holding at most `capacity` entries (at least one)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (completion_tx, completion_rx) = mpsc::channel();
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity + 1),
            order: RecencyOrder::with_capacity(capacity),
            in_flight: HashMap::new(),
            detached: HashMap::new(),
            next_fetch_id: 0,
            completion_tx,
            completion_rx,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Membership test that does not count as a use
    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Read without refreshing recency
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn is_in_flight(&self, key: &K) -> bool {
        self.in_flight.contains_key(key)
    }

    pub fn in_flight_len(&self) -> usize {
        self.in_flight.len()
    }

    /// Cached keys from least to most recently used
    pub fn keys_by_recency(&self) -> impl Iterator<Item = &K> {
        self.order.iter()
    }

    /// Cached value for `key`. A hit moves the key to the MRU position.
    /// Never starts a fetch.
    pub fn get(&mut self, key: &K) -> Option<V> {
        let value = self.entries.get(key)?.clone();
        self.order.touch(key);
        tracing::trace!(?key, "cache hit");
        Some(value)
    }

    /// Insert at the MRU position, evicting the LRU entry if over capacity.
    ///
    /// The entry just inserted is never the one evicted. Returns the evicted
    /// key, if any.
    pub fn insert(&mut self, key: K, value: V) -> Option<K> {
        self.entries.insert(key.clone(), value);
        self.order.touch(&key);
        self.prune(&key)
    }

    fn prune(&mut self, keep: &K) -> Option<K> {
        let mut evicted = None;
        while self.entries.len() > self.capacity {
            let Some(lru) = self.order.pop_lru() else {
                break;
            };
            if &lru == keep {
                self.order.touch(&lru);
                break;
            }
            self.entries.remove(&lru);
            tracing::debug!(key = ?lru, "cache evicted least recently used entry");
            evicted = Some(lru);
        }
        evicted
    }

    /// Return the cached value or start (or join) a fetch for it.
    ///
    /// `loader` runs on a worker thread only if no fetch for `key` is in
    /// flight; otherwise it is dropped unused and the returned ticket
    /// shares the running fetch's outcome.
    pub fn request<F>(&mut self, key: K, loader: F) -> Lookup<V>
    where
        F: FnOnce() -> anyhow::Result<V> + Send + 'static,
    {
        if let Some(value) = self.get(&key) {
            return Lookup::Hit(value);
        }

        let (tx, rx) = mpsc::channel();
        let alive = Arc::new(());
        let waiter = Waiter {
            tx,
            ticket: Arc::downgrade(&alive),
        };
        let started_fetch = self.begin_fetch(key, loader, Some(waiter));
        Lookup::Pending(Ticket {
            rx,
            started_fetch,
            _alive: alive,
        })
    }

    /// Start a fetch nobody waits on, unless the key is cached or in flight.
    ///
    /// Returns whether a loader was started.
    pub fn prefetch<F>(&mut self, key: K, loader: F) -> bool
    where
        F: FnOnce() -> anyhow::Result<V> + Send + 'static,
    {
        if self.entries.contains_key(&key) {
            return false;
        }
        self.begin_fetch(key, loader, None)
    }

    fn begin_fetch<F>(
        &mut self,
        key: K,
        loader: F,
        waiter: Option<Waiter<V>>,
    ) -> bool
    where
        F: FnOnce() -> anyhow::Result<V> + Send + 'static,
    {
        if let Some(flight) = self.in_flight.get_mut(&key) {
            flight.waiters.extend(waiter);
            tracing::debug!(?key, waiters = flight.waiters.len(), "joined in-flight fetch");
            return false;
        }

        let id = self.next_fetch_id;
        self.next_fetch_id += 1;
        self.in_flight.insert(
            key.clone(),
            InFlight {
                id,
                waiters: waiter.into_iter().collect(),
            },
        );

        let tx = self.completion_tx.clone();
        let worker_key = key.clone();
        let spawned = std::thread::Builder::new()
            .name("cache-fetch".to_string())
            .spawn(move || {
                let result = panic::catch_unwind(AssertUnwindSafe(loader))
                    .unwrap_or_else(|_| Err(anyhow::anyhow!("loader panicked")));
                // The cache may have been dropped meanwhile; then nobody cares.
                let _ = tx.send(Completion {
                    id,
                    key: worker_key,
                    result,
                });
            });

        match spawned {
            Ok(_) => {
                tracing::debug!(?key, "started fetch");
                true
            }
            Err(err) => {
                tracing::error!(?key, "failed to spawn fetch worker: {}", err);
                self.complete(Completion {
                    id,
                    key,
                    result: Err(anyhow::Error::new(err).context("failed to spawn fetch worker")),
                });
                false
            }
        }
    }

    /// Apply every finished fetch without blocking.
    ///
    /// Returns the number of completions applied.
    pub fn poll(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.completion_rx.try_recv() {
            self.complete(completion);
            applied += 1;
        }
        applied
    }

    /// Block the owner until `ticket` resolves, applying completions as they
    /// arrive.
    pub fn wait(&mut self, ticket: &Ticket<V>, timeout: Duration) -> Result<V, CacheError> {
        let deadline = Instant::now() + timeout;
        loop {
            self.poll();
            if let Some(result) = ticket.try_take() {
                return result;
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.completion_rx.recv_timeout(remaining) {
                Ok(completion) => self.complete(completion),
                Err(RecvTimeoutError::Timeout) => return Err(CacheError::Timeout(timeout)),
                // The cache holds a sender itself, so this cannot happen while it lives.
                Err(RecvTimeoutError::Disconnected) => return Err(CacheError::Disconnected),
            }
        }
    }

    /// Block until no fetch is running, detached ones included, or until
    /// `timeout` elapses.
    ///
    /// Returns `true` if everything settled.
    pub fn wait_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        self.poll();
        while !self.in_flight.is_empty() || !self.detached.is_empty() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.completion_rx.recv_timeout(remaining) {
                Ok(completion) => self.complete(completion),
                Err(_) => return false,
            }
        }
        true
    }

    fn complete(&mut self, completion: Completion<K, V>) {
        let Completion { id, key, result } = completion;
        let live = self
            .in_flight
            .get(&key)
            .is_some_and(|flight| flight.id == id);

        let (waiters, retain) = if live {
            let waiters = self
                .in_flight
                .remove(&key)
                .map(|flight| flight.waiters)
                .unwrap_or_default();
            (waiters, true)
        } else if let Some(waiters) = self.detached.remove(&id) {
            (waiters, false)
        } else {
            tracing::warn!(?key, id, "completion for a fetch that is not in flight");
            return;
        };

        match result {
            Ok(value) => {
                if retain {
                    self.insert(key.clone(), value.clone());
                    tracing::debug!(?key, len = self.entries.len(), "fetch completed");
                } else {
                    tracing::debug!(?key, "fetch completed after invalidation, not cached");
                }
                for waiter in waiters {
                    waiter.deliver(Ok(value.clone()));
                }
            }
            Err(err) => {
                tracing::warn!(?key, "fetch failed: {:#}", err);
                let error = CacheError::Load {
                    key: format!("{:?}", key),
                    message: format!("{:#}", err),
                };
                for waiter in waiters {
                    waiter.deliver(Err(error.clone()));
                }
            }
        }
    }

    /// Drop every entry.
    ///
    /// Running fetches with callers still holding a ticket deliver to them
    /// and are cached as usual. Those nobody waits on, including ones whose
    /// tickets were dropped, are detached and their result is discarded.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
        for flight in self.in_flight.values_mut() {
            flight.waiters.retain(Waiter::is_waiting);
        }
        let unawaited: Vec<K> = self
            .in_flight
            .iter()
            .filter(|(_, flight)| flight.waiters.is_empty())
            .map(|(key, _)| key.clone())
            .collect();
        for key in &unawaited {
            self.detach(key);
        }
        tracing::debug!(
            in_flight = self.in_flight.len(),
            discarded = unawaited.len(),
            "cache cleared"
        );
    }

    fn detach(&mut self, key: &K) {
        if let Some(flight) = self.in_flight.remove(key) {
            self.detached.insert(flight.id, flight.waiters);
        }
    }
}

impl<K, V> InvalidationSink<K> for ResourceCache<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug + Send + 'static,
    V: Clone + Send + 'static,
{
    fn on_invalidate(&mut self, key: &K) {
        let removed = self.entries.remove(key).is_some();
        self.order.remove(key);
        self.detach(key);
        tracing::debug!(?key, removed, "cache entry invalidated");
    }

    fn invalidate_all(&mut self) {
        self.entries.clear();
        self.order.clear();
        let keys: Vec<K> = self.in_flight.keys().cloned().collect();
        for key in &keys {
            self.detach(key);
        }
        tracing::debug!(detached = keys.len(), "cache invalidated");
    }
}

impl<K, V> fmt::Debug for ResourceCache<K, V>
where
    K: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceCache")
            .field("capacity", &self.capacity)
            .field("keys", &self.order)
            .field("in_flight", &self.in_flight.keys().collect::<Vec<_>>())
            .field("detached", &self.detached.len())
            .finish()
    }
}
