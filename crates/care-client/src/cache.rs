//! Query cache shared by every consumer of remote data.
//!
//! Entries are addressed by [`QueryKey`] and hold the last JSON payload the
//! backend returned for that key. The cache guarantees:
//!
//! - at most one in-flight fetch per key; concurrent readers join it and all
//!   observe the same resolved [`QueryState`]
//! - responses are applied in generation order, so a slow response never
//!   overwrites data from a fetch issued after it
//! - once a key is invalidated it is never reported `Fresh` again until a
//!   fetch issued after the invalidation completes
//!
//! The cache is an ordinary value. Construct one per application (or per
//! test) and hand clones to whoever needs it.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use care_types::QueryKey;
use chrono::{DateTime, Utc};
use futures_util::future::{BoxFuture, FutureExt, Shared};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{ApiError, ApiResult};

pub type FetchResult = ApiResult<Value>;

type Listener = Arc<dyn Fn(&QueryState) + Send + Sync>;
type PendingFetch = Shared<BoxFuture<'static, QueryState>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryStatus {
    /// Never fetched, or cleared
    Idle,
    Loading,
    Fresh,
    Stale,
    Error,
}

#[derive(Clone, Debug, PartialEq)]
pub struct QueryState {
    pub key: QueryKey,
    pub data: Option<Value>,
    pub status: QueryStatus,
    pub error: Option<ApiError>,
    pub last_fetched_at: Option<DateTime<Utc>>,
}

impl QueryState {
    pub fn idle(key: &QueryKey) -> Self {
        Self {
            key: key.clone(),
            data: None,
            status: QueryStatus::Idle,
            error: None,
            last_fetched_at: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Loading
    }

    /// Validates the cached payload against `T`.
    ///
    /// A payload that does not match the schema yields status `Error` with
    /// [`ApiError::Parse`] rather than partially-populated data.
    pub fn decode<T: DeserializeOwned>(&self) -> QueryResult<T> {
        match &self.data {
            Some(value) => match T::deserialize(value) {
                Ok(data) => QueryResult {
                    data: Some(data),
                    status: self.status,
                    error: self.error.clone(),
                },
                Err(e) => QueryResult {
                    data: None,
                    status: QueryStatus::Error,
                    error: Some(ApiError::Parse(format!("{}: {e}", self.key))),
                },
            },
            None => QueryResult {
                data: None,
                status: self.status,
                error: self.error.clone(),
            },
        }
    }
}

/// Typed view of a [`QueryState`].
#[derive(Clone, Debug, PartialEq)]
pub struct QueryResult<T> {
    pub data: Option<T>,
    pub status: QueryStatus,
    pub error: Option<ApiError>,
}

impl<T> QueryResult<T> {
    /// Result of a disabled query.
    pub fn idle() -> Self {
        Self {
            data: None,
            status: QueryStatus::Idle,
            error: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Loading
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReadOptions {
    /// When false the read never touches the network and returns the current snapshot.
    pub enabled: bool,
    /// Start a new fetch even if the entry is fresh or already loading.
    pub force: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            force: false,
        }
    }
}

impl ReadOptions {
    pub fn enabled_when(enabled: bool) -> Self {
        Self {
            enabled,
            ..Self::default()
        }
    }
}

struct InFlight {
    generation: u64,
    pending: PendingFetch,
}

struct Entry {
    data: Option<Value>,
    status: QueryStatus,
    error: Option<ApiError>,
    last_fetched_at: Option<DateTime<Utc>>,
    // Highest generation whose outcome has been applied (or that is superseded).
    applied: u64,
    // Completions at or below this generation started before an invalidation.
    invalidated_through: u64,
    in_flight: Option<InFlight>,
    listeners: Vec<(u64, Listener)>,
}

impl Entry {
    fn new(floor: u64) -> Self {
        Self {
            data: None,
            status: QueryStatus::Idle,
            error: None,
            last_fetched_at: None,
            applied: floor,
            invalidated_through: floor,
            in_flight: None,
            listeners: Vec::new(),
        }
    }

    fn snapshot(&self, key: &QueryKey) -> QueryState {
        QueryState {
            key: key.clone(),
            data: self.data.clone(),
            status: self.status,
            error: self.error.clone(),
            last_fetched_at: self.last_fetched_at,
        }
    }

    fn listeners(&self) -> Vec<Listener> {
        self.listeners.iter().map(|(_, l)| Arc::clone(l)).collect()
    }

    fn reset(&mut self, floor: u64) {
        self.data = None;
        self.status = QueryStatus::Idle;
        self.error = None;
        self.last_fetched_at = None;
        self.applied = floor;
        self.invalidated_through = floor;
        self.in_flight = None;
    }
}

#[derive(Default)]
struct Inner {
    entries: Mutex<HashMap<QueryKey, Entry>>,
    generation: AtomicU64,
    next_listener: AtomicU64,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, HashMap<QueryKey, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn complete(&self, key: &QueryKey, generation: u64, result: FetchResult) -> QueryState {
        let (state, listeners) = {
            let mut entries = self.lock();
            let Some(entry) = entries.get_mut(key) else {
                debug!(%key, generation, "entry removed while fetching; dropping response");
                return detached_state(key, result);
            };

            if entry
                .in_flight
                .as_ref()
                .is_some_and(|f| f.generation == generation)
            {
                entry.in_flight = None;
            }

            if generation <= entry.applied {
                debug!(%key, generation, applied = entry.applied, "discarding out-of-order response");
                return entry.snapshot(key);
            }
            entry.applied = generation;

            match result {
                Ok(value) => {
                    entry.data = Some(value);
                    entry.error = None;
                    entry.last_fetched_at = Some(Utc::now());
                    entry.status = if generation <= entry.invalidated_through {
                        QueryStatus::Stale
                    } else {
                        QueryStatus::Fresh
                    };
                }
                Err(error) => {
                    warn!(%key, %error, "fetch failed");
                    entry.error = Some(error);
                    entry.status = QueryStatus::Error;
                }
            }
            (entry.snapshot(key), entry.listeners())
        };
        notify(&listeners, &state);
        state
    }
}

fn detached_state(key: &QueryKey, result: FetchResult) -> QueryState {
    let mut state = QueryState::idle(key);
    match result {
        Ok(value) => {
            state.data = Some(value);
            state.status = QueryStatus::Stale;
            state.last_fetched_at = Some(Utc::now());
        }
        Err(error) => {
            state.error = Some(error);
            state.status = QueryStatus::Error;
        }
    }
    state
}

fn notify(listeners: &[Listener], state: &QueryState) {
    for listener in listeners {
        listener(state);
    }
}

/// Handle to the process-wide query cache. Clones share state.
#[derive(Clone, Default)]
pub struct QueryClient {
    inner: Arc<Inner>,
}

impl QueryClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns cached data for `key` when fresh; otherwise runs (or joins) a fetch.
    ///
    /// `fetcher` is only invoked when this call starts a new fetch, and only
    /// once the cache lock is released, so it may use this client freely.
    /// Failures are reported through the returned state, never as a panic.
    pub async fn read<F, Fut>(&self, key: &QueryKey, fetcher: F, options: ReadOptions) -> QueryState
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = FetchResult> + Send + 'static,
    {
        if !options.enabled {
            return self.snapshot(key);
        }

        let (pending, started) = {
            let mut entries = self.inner.lock();
            let floor = self.inner.current_generation();
            let entry = entries.entry(key.clone()).or_insert_with(|| Entry::new(floor));

            let joinable = if options.force {
                None
            } else {
                entry.in_flight.as_ref().map(|f| (f.generation, f.pending.clone()))
            };

            match joinable {
                Some((generation, pending)) => {
                    debug!(%key, generation, "joining in-flight fetch");
                    (pending, None)
                }
                None if !options.force && entry.status == QueryStatus::Fresh => {
                    debug!(%key, "cache hit");
                    return entry.snapshot(key);
                }
                None => {
                    let pending = self.start_fetch(key, entry, async move { fetcher().await });
                    (pending, Some((entry.snapshot(key), entry.listeners())))
                }
            }
        };

        if let Some((state, listeners)) = started {
            notify(&listeners, &state);
        }
        pending.await
    }

    /// Starts a new fetch for `key` even if one is already running.
    pub async fn refetch<F, Fut>(&self, key: &QueryKey, fetcher: F) -> QueryState
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = FetchResult> + Send + 'static,
    {
        let options = ReadOptions {
            enabled: true,
            force: true,
        };
        self.read(key, fetcher, options).await
    }

    /// Runs a side-effecting call and, on success, invalidates every key
    /// matching an entry of `invalidates`. On failure the cache is untouched.
    pub async fn write<T, Fut>(&self, mutation: Fut, invalidates: &[QueryKey]) -> ApiResult<T>
    where
        Fut: Future<Output = ApiResult<T>>,
    {
        match mutation.await {
            Ok(value) => {
                self.invalidate(invalidates);
                Ok(value)
            }
            Err(error) => {
                warn!(%error, "mutation failed; cache left untouched");
                Err(error)
            }
        }
    }

    /// Marks every entry whose key starts with one of `prefixes` as stale.
    /// Returns how many entries were affected.
    pub fn invalidate(&self, prefixes: &[QueryKey]) -> usize {
        let notices: Vec<(QueryState, Vec<Listener>)> = {
            let mut entries = self.inner.lock();
            let floor = self.inner.current_generation();
            entries
                .iter_mut()
                .filter(|(key, _)| prefixes.iter().any(|p| key.starts_with(p)))
                .map(|(key, entry)| {
                    entry.invalidated_through = floor;
                    entry.in_flight = None;
                    if entry.status == QueryStatus::Fresh {
                        entry.status = QueryStatus::Stale;
                    }
                    debug!(%key, "invalidated");
                    (entry.snapshot(key), entry.listeners())
                })
                .collect()
        };
        for (state, listeners) in &notices {
            notify(listeners, state);
        }
        notices.len()
    }

    /// Replaces the cached payload for `key`. Older in-flight responses are discarded.
    pub fn set_data(&self, key: &QueryKey, value: Value) {
        let (state, listeners) = {
            let mut entries = self.inner.lock();
            let floor = self.inner.current_generation();
            let entry = entries.entry(key.clone()).or_insert_with(|| Entry::new(floor));
            entry.data = Some(value);
            entry.error = None;
            entry.status = QueryStatus::Fresh;
            entry.last_fetched_at = Some(Utc::now());
            entry.applied = floor;
            entry.in_flight = None;
            (entry.snapshot(key), entry.listeners())
        };
        notify(&listeners, &state);
    }

    pub fn snapshot(&self, key: &QueryKey) -> QueryState {
        self.inner
            .lock()
            .get(key)
            .map(|entry| entry.snapshot(key))
            .unwrap_or_else(|| QueryState::idle(key))
    }

    /// Typed snapshot, see [`QueryState::decode`].
    pub fn get<T: DeserializeOwned>(&self, key: &QueryKey) -> QueryResult<T> {
        self.snapshot(key).decode()
    }

    /// Registers `listener` for every state change of `key` until the
    /// returned [`Subscription`] is dropped.
    pub fn subscribe<L>(&self, key: &QueryKey, listener: L) -> Subscription
    where
        L: Fn(&QueryState) + Send + Sync + 'static,
    {
        let id = self.inner.next_listener.fetch_add(1, Ordering::SeqCst);
        let mut entries = self.inner.lock();
        let floor = self.inner.current_generation();
        entries
            .entry(key.clone())
            .or_insert_with(|| Entry::new(floor))
            .listeners
            .push((id, Arc::new(listener)));
        Subscription {
            inner: Arc::downgrade(&self.inner),
            key: key.clone(),
            id,
        }
    }

    pub fn subscriber_count(&self, key: &QueryKey) -> usize {
        self.inner
            .lock()
            .get(key)
            .map_or(0, |entry| entry.listeners.len())
    }

    /// Forgets cached data for keys matching `prefix`. Subscribers stay registered.
    pub fn remove(&self, prefix: &QueryKey) {
        self.reset_where(|key| key.starts_with(prefix));
    }

    /// Forgets all cached data, e.g. on sign-out.
    pub fn clear(&self) {
        self.reset_where(|_| true);
    }

    fn reset_where(&self, matches: impl Fn(&QueryKey) -> bool) {
        let notices: Vec<(QueryState, Vec<Listener>)> = {
            let mut entries = self.inner.lock();
            // Fetches already issued must not repopulate a reset entry.
            let floor = self.inner.next_generation();
            entries.retain(|key, entry| !matches(key) || !entry.listeners.is_empty());
            entries
                .iter_mut()
                .filter(|(key, _)| matches(key))
                .map(|(key, entry)| {
                    entry.reset(floor);
                    (entry.snapshot(key), entry.listeners())
                })
                .collect()
        };
        for (state, listeners) in &notices {
            notify(listeners, state);
        }
    }

    fn start_fetch<Fut>(&self, key: &QueryKey, entry: &mut Entry, fetch: Fut) -> PendingFetch
    where
        Fut: Future<Output = FetchResult> + Send + 'static,
    {
        let generation = self.inner.next_generation();
        debug!(%key, generation, "starting fetch");
        entry.status = QueryStatus::Loading;

        let inner = Arc::downgrade(&self.inner);
        let fetchKey = key.clone();
        let pending = async move {
            let result = fetch.await;
            match inner.upgrade() {
                Some(inner) => inner.complete(&fetchKey, generation, result),
                None => detached_state(&fetchKey, result),
            }
        }
        .boxed()
        .shared();

        entry.in_flight = Some(InFlight {
            generation,
            pending: pending.clone(),
        });
        pending
    }
}

/// Keeps a listener registered. Dropping it unsubscribes; any response that
/// lands afterwards still updates the cache but is not delivered here.
pub struct Subscription {
    inner: Weak<Inner>,
    key: QueryKey,
    id: u64,
}

impl Subscription {
    pub fn key(&self) -> &QueryKey {
        &self.key
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        let mut entries = inner.lock();
        if let Some(entry) = entries.get_mut(&self.key) {
            entry.listeners.retain(|(id, _)| *id != self.id);
        }
    }
}

/// Decodes a raw JSON payload into `T`, reporting mismatches as [`ApiError::Parse`].
pub fn decode_value<T: DeserializeOwned>(value: &Value) -> ApiResult<T> {
    T::deserialize(value).map_err(ApiError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    fn key() -> QueryKey {
        QueryKey::new("events")
    }

    #[tokio::test]
    async fn fresh_entry_is_served_from_cache() {
        let client = QueryClient::new();
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let calls = Arc::clone(&calls);
            let state = client
                .read(
                    &key(),
                    move || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok(json!([1, 2, 3]))
                    },
                    ReadOptions::default(),
                )
                .await;
            assert_eq!(state.status, QueryStatus::Fresh);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn disabled_read_never_fetches() {
        let client = QueryClient::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let state = client
            .read(
                &key(),
                move || async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(Value::Null)
                },
                ReadOptions::enabled_when(false),
            )
            .await;
        assert_eq!(state.status, QueryStatus::Idle);
        assert!(state.data.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failure_keeps_previous_data() {
        let client = QueryClient::new();
        client
            .read(&key(), || async { Ok(json!(["old"])) }, ReadOptions::default())
            .await;
        let state = client
            .refetch(&key(), || async { Err(ApiError::from_status(500, None)) })
            .await;
        assert_eq!(state.status, QueryStatus::Error);
        assert_eq!(state.data, Some(json!(["old"])));
        assert!(matches!(state.error, Some(ApiError::ServerFailure { status: 500, .. })));
    }

    #[tokio::test]
    async fn decode_reports_schema_mismatch() {
        let client = QueryClient::new();
        client.set_data(&key(), json!({"not": "a list"}));
        let result: QueryResult<Vec<u32>> = client.get(&key());
        assert_eq!(result.status, QueryStatus::Error);
        assert!(matches!(result.error, Some(ApiError::Parse(_))));
        assert!(result.data.is_none());
    }

    #[tokio::test]
    async fn failed_write_leaves_cache_fresh() {
        let client = QueryClient::new();
        client.set_data(&key(), json!([]));
        let outcome: ApiResult<()> = client
            .write(async { Err(ApiError::from_status(422, None)) }, &[key()])
            .await;
        assert!(outcome.is_err());
        assert_eq!(client.snapshot(&key()).status, QueryStatus::Fresh);
    }

    #[tokio::test]
    async fn clear_keeps_subscribers_and_resets_data() {
        let client = QueryClient::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _subscription = client.subscribe(&key(), move |state| {
            sink.lock().unwrap().push(state.status);
        });
        client.set_data(&key(), json!([1]));
        client.clear();

        assert_eq!(client.snapshot(&key()).status, QueryStatus::Idle);
        assert_eq!(client.subscriber_count(&key()), 1);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![QueryStatus::Fresh, QueryStatus::Idle]
        );
    }

    #[tokio::test]
    async fn response_landing_after_clear_is_dropped() {
        let client = QueryClient::new();
        let key = key();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let read = client.read(
            &key,
            move || async move {
                let _ = rx.await;
                Ok(json!(["before sign-out"]))
            },
            ReadOptions::default(),
        );
        let driver = async {
            tokio::task::yield_now().await;
            client.clear();
            let _ = tx.send(());
        };
        let (state, ()) = tokio::join!(read, driver);
        assert_eq!(state.status, QueryStatus::Stale);
        assert!(client.snapshot(&key).data.is_none());
    }
}
