use super::*;
use std::{collections::VecDeque, sync::atomic::AtomicUsize};

use async_trait::async_trait;
use shared::Item;
use tokio::sync::Semaphore;

/// Transport that blocks each fetch until the test releases a permit, then replays the
/// next scripted outcome.
struct GatedTransport {
    calls: AtomicUsize,
    outcomes: Mutex<VecDeque<Result<Collection, FetchError>>>,
    gate: Semaphore,
}

impl GatedTransport {
    fn new(outcomes: Vec<Result<Collection, FetchError>>) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            outcomes: Mutex::new(outcomes.into()),
            gate: Semaphore::new(0),
        })
    }

    fn release(&self, fetches: usize) {
        self.gate.add_permits(fetches);
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FetchTransport for GatedTransport {
    async fn fetch(&self, _key: &ResourceKey) -> Result<Collection, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|_| FetchError::new("gate closed"))?;
        permit.forget();
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(FetchError::new("no scripted outcome")))
    }
}

fn characters() -> Collection {
    vec![
        Item::new()
            .with_field("title", "Luke Skywalker")
            .with_field("description", "Jedi")
            .with_field("image", "/luke.jpg"),
        Item::new()
            .with_field("title", "Leia Organa")
            .with_field("description", "Princess")
            .with_field("image", "/leia.jpg"),
    ]
    .into()
}

fn planets() -> Collection {
    vec![Item::new().with_field("title", "Hoth")].into()
}

fn key() -> ResourceKey {
    ResourceKey::new("http://catalog.test/api/characters")
}

fn recorder() -> (
    Arc<Mutex<Vec<CacheSnapshot>>>,
    impl Fn(&CacheSnapshot) + Send + Sync + 'static,
) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    (seen, move |snapshot: &CacheSnapshot| {
        sink.lock().unwrap().push(snapshot.clone())
    })
}

async fn drain_tasks() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn first_subscription_reports_loading_until_fetch_settles() {
    let transport = GatedTransport::new(vec![Ok(characters())]);
    let cache = EntityCache::new(transport.clone(), Handle::current());

    let mut subscription = cache.subscribe(key(), |_| {});
    let pending = subscription.snapshot();
    assert!(pending.is_loading);
    assert!(pending.is_validating);
    assert!(pending.data.is_none());
    assert_eq!(pending.result(), FetchResult::Loading);

    transport.release(1);
    assert!(subscription.changed().await);

    let settled = subscription.snapshot();
    assert!(!settled.is_loading);
    assert!(!settled.is_validating);
    assert!(settled.error.is_none());
    assert_eq!(settled.data.as_deref(), Some(&characters()));
    assert_eq!(settled.result(), FetchResult::Success(Some(&characters())));
}

#[tokio::test]
async fn concurrent_subscribers_share_a_single_fetch() {
    let transport = GatedTransport::new(vec![Ok(characters())]);
    let cache = EntityCache::new(transport.clone(), Handle::current());

    let mut subscriptions: Vec<_> = (0..5).map(|_| cache.subscribe(key(), |_| {})).collect();
    transport.release(5);
    assert!(subscriptions[0].changed().await);
    drain_tasks().await;

    assert_eq!(transport.calls(), 1);
    for subscription in &subscriptions {
        assert_eq!(subscription.snapshot().data.as_deref(), Some(&characters()));
    }
    assert_eq!(cache.subscriber_count(&key()), 5);
    subscriptions.clear();
    assert_eq!(cache.subscriber_count(&key()), 0);
}

#[tokio::test]
async fn revalidate_during_flight_is_coalesced() {
    let transport = GatedTransport::new(vec![Ok(characters()), Ok(planets())]);
    let cache = EntityCache::new(transport.clone(), Handle::current());

    let mut subscription = cache.subscribe(key(), |_| {});
    assert!(!subscription.revalidate());
    assert!(!cache.revalidate(&key()));

    transport.release(2);
    assert!(subscription.changed().await);
    drain_tasks().await;

    assert_eq!(transport.calls(), 1);
    assert_eq!(subscription.snapshot().data.as_deref(), Some(&characters()));
}

#[tokio::test]
async fn background_revalidation_never_regresses_to_loading() {
    let transport = GatedTransport::new(vec![Ok(characters()), Ok(planets())]);
    let cache = EntityCache::new(transport.clone(), Handle::current());
    let (seen, on_change) = recorder();

    let mut subscription = cache.subscribe(key(), on_change);
    transport.release(1);
    assert!(subscription.changed().await);
    seen.lock().unwrap().clear();

    assert!(subscription.revalidate());
    let refreshing = subscription.snapshot();
    assert!(!refreshing.is_loading);
    assert!(refreshing.is_validating);
    assert_eq!(refreshing.data.as_deref(), Some(&characters()));

    transport.release(1);
    assert!(subscription.changed().await);

    let refreshed = subscription.snapshot();
    assert!(!refreshed.is_validating);
    assert_eq!(refreshed.data.as_deref(), Some(&planets()));

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2, "one notice on start, one on settle");
    assert!(seen.iter().all(|snapshot| !snapshot.is_loading));
    assert!(seen[0].is_validating);
    assert!(!seen[1].is_validating);
}

#[tokio::test]
async fn failed_revalidation_keeps_stale_data() {
    let transport = GatedTransport::new(vec![
        Ok(characters()),
        Err(FetchError::new("catalog returned 503")),
    ]);
    let cache = EntityCache::new(transport.clone(), Handle::current());

    let mut subscription = cache.subscribe(key(), |_| {});
    transport.release(1);
    assert!(subscription.changed().await);

    assert!(subscription.revalidate());
    transport.release(1);
    assert!(subscription.changed().await);

    let snapshot = subscription.snapshot();
    assert_eq!(snapshot.data.as_deref(), Some(&characters()));
    assert_eq!(snapshot.error, Some(FetchError::new("catalog returned 503")));
    assert!(!snapshot.is_loading);
    assert_eq!(
        snapshot.result(),
        FetchResult::Error(&FetchError::new("catalog returned 503"))
    );
}

#[tokio::test]
async fn first_failure_then_retry_fetches_exactly_once_more() {
    let transport = GatedTransport::new(vec![
        Err(FetchError::new("connection refused")),
        Ok(characters()),
    ]);
    let cache = EntityCache::new(transport.clone(), Handle::current());

    let mut subscription = cache.subscribe(key(), |_| {});
    transport.release(1);
    assert!(subscription.changed().await);

    let failed = subscription.snapshot();
    assert!(failed.data.is_none());
    assert_eq!(failed.error, Some(FetchError::new("connection refused")));
    assert!(!failed.is_loading);

    assert!(subscription.revalidate());
    let retrying = subscription.snapshot();
    assert!(
        retrying.error.is_some(),
        "retry must not clear the error before the fetch settles"
    );
    assert!(!retrying.is_loading);
    assert!(retrying.is_validating);

    transport.release(1);
    assert!(subscription.changed().await);
    assert_eq!(transport.calls(), 2);

    let recovered = subscription.snapshot();
    assert!(recovered.error.is_none());
    assert_eq!(recovered.data.as_deref(), Some(&characters()));
}

#[tokio::test]
async fn dropped_subscription_receives_no_further_notifications() {
    let transport = GatedTransport::new(vec![Ok(characters())]);
    let cache = EntityCache::new(transport.clone(), Handle::current());
    let (kept_seen, kept) = recorder();
    let (dropped_seen, dropped) = recorder();

    let mut kept = cache.subscribe(key(), kept);
    let dropped = cache.subscribe(key(), dropped);
    assert_eq!(cache.subscriber_count(&key()), 2);
    drop(dropped);
    assert_eq!(cache.subscriber_count(&key()), 1);

    transport.release(1);
    assert!(kept.changed().await);

    assert_eq!(kept_seen.lock().unwrap().len(), 2);
    assert!(dropped_seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn unmount_lets_in_flight_fetch_fill_the_cache() {
    let transport = GatedTransport::new(vec![Ok(characters())]);
    let cache = EntityCache::new(transport.clone(), Handle::current());

    drop(cache.subscribe(key(), |_| {}));
    transport.release(1);
    drain_tasks().await;

    let later = cache.subscribe(key(), |_| {});
    let snapshot = later.snapshot();
    assert!(!snapshot.is_loading);
    assert!(!snapshot.is_validating);
    assert_eq!(snapshot.data.as_deref(), Some(&characters()));
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn revalidate_on_mount_refreshes_settled_keys() {
    let transport = GatedTransport::new(vec![Ok(characters()), Ok(planets())]);
    let cache = EntityCache::with_options(
        transport.clone(),
        Handle::current(),
        CacheOptions {
            revalidate_on_mount: true,
        },
    );

    let mut first = cache.subscribe(key(), |_| {});
    transport.release(1);
    assert!(first.changed().await);

    let mut second = cache.subscribe(key(), |_| {});
    let stale = second.snapshot();
    assert!(stale.is_validating);
    assert!(!stale.is_loading);
    assert_eq!(stale.data.as_deref(), Some(&characters()));

    transport.release(1);
    assert!(second.changed().await);
    assert_eq!(transport.calls(), 2);
    assert_eq!(first.snapshot().data.as_deref(), Some(&planets()));
}

#[tokio::test]
async fn invalidate_with_subscribers_starts_a_fresh_first_load() {
    let transport = GatedTransport::new(vec![Ok(characters()), Ok(planets())]);
    let cache = EntityCache::new(transport.clone(), Handle::current());

    let mut subscription = cache.subscribe(key(), |_| {});
    transport.release(1);
    assert!(subscription.changed().await);

    cache.invalidate(&key());
    let reloading = subscription.snapshot();
    assert!(reloading.is_loading);
    assert!(reloading.data.is_none());

    transport.release(1);
    assert!(subscription.changed().await);
    assert_eq!(subscription.snapshot().data.as_deref(), Some(&planets()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn invalidated_entries_never_read_as_settled_and_empty() {
    let transport = GatedTransport::new((0..20).map(|_| Ok(characters())).collect());
    let cache = EntityCache::new(transport.clone(), Handle::current());
    let (seen, on_change) = recorder();
    let mut subscription = cache.subscribe(key(), on_change);
    transport.release(1);
    assert!(subscription.changed().await);

    let stop = Arc::new(AtomicBool::new(false));
    let reader = {
        let cache = Arc::clone(&cache);
        let stop = Arc::clone(&stop);
        std::thread::spawn(move || {
            let mut empty_reads = 0;
            while !stop.load(Ordering::SeqCst) {
                if cache.snapshot(&key()).result() == FetchResult::Success(None) {
                    empty_reads += 1;
                }
            }
            empty_reads
        })
    };

    for _ in 0..19 {
        seen.lock().unwrap().clear();
        cache.invalidate(&key());
        let notices = seen.lock().unwrap().clone();
        assert!(notices.iter().any(|notice| notice.is_loading));
        assert!(notices
            .iter()
            .all(|notice| notice.result() != FetchResult::Success(None)));
        transport.release(1);
        assert!(subscription.changed().await);
    }
    stop.store(true, Ordering::SeqCst);

    assert_eq!(reader.join().expect("reader thread"), 0);
    assert_eq!(transport.calls(), 20);
}

#[tokio::test]
async fn invalidate_without_subscribers_forgets_the_entry() {
    let transport = GatedTransport::new(vec![Ok(characters()), Ok(planets())]);
    let cache = EntityCache::new(transport.clone(), Handle::current());

    let mut subscription = cache.subscribe(key(), |_| {});
    transport.release(1);
    assert!(subscription.changed().await);
    drop(subscription);

    cache.invalidate(&key());
    assert_eq!(cache.snapshot(&key()), CacheSnapshot::default());

    let fresh = cache.subscribe(key(), |_| {});
    assert!(fresh.snapshot().is_loading);
    transport.release(1);
    drain_tasks().await;
    assert_eq!(fresh.snapshot().data.as_deref(), Some(&planets()));
    assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn keys_are_cached_independently() {
    let transport = GatedTransport::new(vec![Ok(characters()), Ok(planets())]);
    let cache = EntityCache::new(transport.clone(), Handle::current());
    let other = ResourceKey::new("http://catalog.test/api/planets");

    let mut a = cache.subscribe(key(), |_| {});
    let mut b = cache.subscribe(other.clone(), |_| {});
    transport.release(2);
    assert!(a.changed().await);
    assert!(b.changed().await);

    assert_eq!(transport.calls(), 2);
    assert!(cache.snapshot(&key()).data.is_some());
    assert!(cache.snapshot(&other).data.is_some());
}

#[test]
fn unseen_key_reads_as_idle_snapshot() {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime");
    let cache = EntityCache::new(GatedTransport::new(Vec::new()), runtime.handle().clone());
    let snapshot = cache.snapshot(&key());
    assert_eq!(snapshot, CacheSnapshot::default());
    assert_eq!(snapshot.result(), FetchResult::Success(None));
}
