//! Process-wide entity cache with request coalescing and stale-while-revalidate reads.
//!
//! Each [`ResourceKey`] owns one entry. The entry, not the caller, tracks whether a fetch is
//! in flight, so any number of subscribers and `revalidate` calls share a single request.
//! Fetches are spawned on the runtime handle the cache was built with; completion writes the
//! entry and then notifies subscribers on that same task.

use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
};

use shared::{Collection, FetchError, ResourceKey};
use tokio::{runtime::Handle, sync::watch};
use tracing::{debug, info, warn};

use crate::transport::FetchTransport;

/// Read-only view of one cache entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheSnapshot {
    pub data: Option<Arc<Collection>>,
    pub error: Option<FetchError>,
    /// First load only: a fetch is running and nothing has settled for this key yet.
    pub is_loading: bool,
    pub is_validating: bool,
}

/// Tri-state reading of a snapshot. Loading wins over Error, Error wins over data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FetchResult<'a> {
    Loading,
    Error(&'a FetchError),
    /// Settled without error. `None` when no collection has been stored.
    Success(Option<&'a Collection>),
}

impl CacheSnapshot {
    pub fn result(&self) -> FetchResult<'_> {
        if self.is_loading {
            FetchResult::Loading
        } else if let Some(error) = &self.error {
            FetchResult::Error(error)
        } else {
            FetchResult::Success(self.data.as_deref())
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheOptions {
    /// Revalidate in the background when a new subscriber attaches to a key that already
    /// holds data.
    pub revalidate_on_mount: bool,
}

type SubscriberId = u64;

struct Subscriber {
    active: AtomicBool,
    on_change: Box<dyn Fn(&CacheSnapshot) + Send + Sync>,
}

struct CacheEntry {
    value: Option<Arc<Collection>>,
    error: Option<FetchError>,
    in_flight: bool,
    // Ids are allocated monotonically, so iteration order is subscription order.
    subscribers: BTreeMap<SubscriberId, Arc<Subscriber>>,
    settlements: watch::Sender<u64>,
}

impl CacheEntry {
    fn new() -> Self {
        let (settlements, _) = watch::channel(0);
        Self {
            value: None,
            error: None,
            in_flight: false,
            subscribers: BTreeMap::new(),
            settlements,
        }
    }

    fn has_settled(&self) -> bool {
        self.value.is_some() || self.error.is_some()
    }

    fn snapshot(&self) -> CacheSnapshot {
        CacheSnapshot {
            data: self.value.clone(),
            error: self.error.clone(),
            is_loading: self.in_flight && !self.has_settled(),
            is_validating: self.in_flight,
        }
    }

    fn subscribers(&self) -> Vec<Arc<Subscriber>> {
        self.subscribers.values().cloned().collect()
    }
}

pub struct EntityCache {
    transport: Arc<dyn FetchTransport>,
    runtime: Handle,
    options: CacheOptions,
    entries: Mutex<HashMap<ResourceKey, CacheEntry>>,
    next_subscriber_id: AtomicU64,
}

impl fmt::Debug for EntityCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityCache")
            .field("options", &self.options)
            .field("entries", &self.lock_entries().len())
            .finish()
    }
}

impl EntityCache {
    pub fn new(transport: Arc<dyn FetchTransport>, runtime: Handle) -> Arc<Self> {
        Self::with_options(transport, runtime, CacheOptions::default())
    }

    pub fn with_options(
        transport: Arc<dyn FetchTransport>,
        runtime: Handle,
        options: CacheOptions,
    ) -> Arc<Self> {
        Arc::new(Self {
            transport,
            runtime,
            options,
            entries: Mutex::new(HashMap::new()),
            next_subscriber_id: AtomicU64::new(1),
        })
    }

    /// Registers `on_change` for `key` and starts the first fetch if nothing has been
    /// fetched for it yet. The callback runs after every fetch start and settlement until
    /// the returned [`Subscription`] is dropped.
    pub fn subscribe<F>(self: &Arc<Self>, key: ResourceKey, on_change: F) -> Subscription
    where
        F: Fn(&CacheSnapshot) + Send + Sync + 'static,
    {
        let id = self.next_subscriber_id.fetch_add(1, Ordering::Relaxed);
        let subscriber = Arc::new(Subscriber {
            active: AtomicBool::new(true),
            on_change: Box::new(on_change),
        });

        let (should_fetch, settlements) = {
            let mut entries = self.lock_entries();
            let entry = entries.entry(key.clone()).or_insert_with(CacheEntry::new);
            entry.subscribers.insert(id, subscriber);
            let should_fetch = !entry.has_settled()
                || (self.options.revalidate_on_mount && entry.value.is_some());
            (should_fetch, entry.settlements.subscribe())
        };
        debug!(key = %key, subscriber = id, "cache: subscribed");

        if should_fetch {
            self.start_fetch(&key);
        }

        Subscription {
            cache: Arc::clone(self),
            key,
            id,
            settlements,
        }
    }

    /// Current state of `key`. Unseen keys read as an empty, idle snapshot.
    pub fn snapshot(&self, key: &ResourceKey) -> CacheSnapshot {
        self.lock_entries()
            .get(key)
            .map(CacheEntry::snapshot)
            .unwrap_or_default()
    }

    /// Starts a fetch for `key` unless one is already in flight. Returns whether a new
    /// request was issued.
    pub fn revalidate(self: &Arc<Self>, key: &ResourceKey) -> bool {
        self.start_fetch(key)
    }

    /// Drops cached data and error for `key`. Live subscribers get a fresh first load;
    /// an entry nobody watches is forgotten.
    pub fn invalidate(self: &Arc<Self>, key: &ResourceKey) {
        let (spawn, notice) = {
            let mut entries = self.lock_entries();
            let Some(entry) = entries.get_mut(key) else {
                return;
            };
            entry.value = None;
            entry.error = None;

            if entry.subscribers.is_empty() {
                if !entry.in_flight {
                    entries.remove(key);
                }
                (false, None)
            } else {
                // Claim the refetch under the same lock so no reader sees an idle, empty entry.
                let spawn = !entry.in_flight;
                entry.in_flight = true;
                (spawn, Some((entry.snapshot(), entry.subscribers())))
            }
        };
        info!(key = %key, refetch = spawn, "cache: invalidated");

        if let Some((snapshot, subscribers)) = notice {
            notify(&snapshot, &subscribers);
        }
        if spawn {
            self.spawn_fetch(key);
        }
    }

    pub fn subscriber_count(&self, key: &ResourceKey) -> usize {
        self.lock_entries()
            .get(key)
            .map_or(0, |entry| entry.subscribers.len())
    }

    fn start_fetch(self: &Arc<Self>, key: &ResourceKey) -> bool {
        let (snapshot, subscribers) = {
            let mut entries = self.lock_entries();
            let entry = entries.entry(key.clone()).or_insert_with(CacheEntry::new);
            if entry.in_flight {
                debug!(key = %key, "cache: fetch already in flight; coalescing");
                return false;
            }
            entry.in_flight = true;
            (entry.snapshot(), entry.subscribers())
        };
        info!(key = %key, stale = snapshot.data.is_some(), "cache: fetch started");
        notify(&snapshot, &subscribers);
        self.spawn_fetch(key);
        true
    }

    /// Runs the transport for `key`. The caller has already marked the entry in flight.
    fn spawn_fetch(self: &Arc<Self>, key: &ResourceKey) {
        let cache = Arc::clone(self);
        let transport = Arc::clone(&self.transport);
        let key = key.clone();
        self.runtime.spawn(async move {
            let outcome = transport.fetch(&key).await;
            cache.settle(&key, outcome);
        });
    }

    fn settle(&self, key: &ResourceKey, outcome: Result<Collection, FetchError>) {
        let (snapshot, subscribers) = {
            let mut entries = self.lock_entries();
            let Some(entry) = entries.get_mut(key) else {
                debug!(key = %key, "cache: entry gone before fetch settled; dropping result");
                return;
            };
            entry.in_flight = false;
            match outcome {
                Ok(collection) => {
                    info!(key = %key, items = collection.len(), "cache: fetch settled");
                    entry.value = Some(Arc::new(collection));
                    entry.error = None;
                }
                Err(err) => {
                    warn!(
                        key = %key,
                        error = %err,
                        stale = entry.value.is_some(),
                        "cache: fetch failed"
                    );
                    entry.error = Some(err);
                }
            }
            entry.settlements.send_modify(|generation| *generation += 1);
            (entry.snapshot(), entry.subscribers())
        };
        notify(&snapshot, &subscribers);
    }

    fn unsubscribe(&self, key: &ResourceKey, id: SubscriberId) {
        let mut entries = self.lock_entries();
        if let Some(entry) = entries.get_mut(key) {
            if let Some(subscriber) = entry.subscribers.remove(&id) {
                subscriber.active.store(false, Ordering::Release);
            }
        }
        debug!(key = %key, subscriber = id, "cache: unsubscribed");
    }

    fn lock_entries(&self) -> MutexGuard<'_, HashMap<ResourceKey, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn notify(snapshot: &CacheSnapshot, subscribers: &[Arc<Subscriber>]) {
    for subscriber in subscribers {
        if subscriber.active.load(Ordering::Acquire) {
            (subscriber.on_change)(snapshot);
        }
    }
}

/// Live registration on one key. Dropping it unsubscribes; an in-flight fetch keeps
/// running and still fills the cache.
pub struct Subscription {
    cache: Arc<EntityCache>,
    key: ResourceKey,
    id: SubscriberId,
    settlements: watch::Receiver<u64>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("key", &self.key)
            .field("id", &self.id)
            .finish()
    }
}

impl Subscription {
    pub fn key(&self) -> &ResourceKey {
        &self.key
    }

    pub fn snapshot(&self) -> CacheSnapshot {
        self.cache.snapshot(&self.key)
    }

    pub fn revalidate(&self) -> bool {
        self.cache.revalidate(&self.key)
    }

    /// Waits for the next settlement of this key that this subscription has not observed.
    /// Returns `false` if the entry went away.
    pub async fn changed(&mut self) -> bool {
        self.settlements.changed().await.is_ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cache.unsubscribe(&self.key, self.id);
    }
}

#[cfg(test)]
#[path = "tests/cache_tests.rs"]
mod tests;
