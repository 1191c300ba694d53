//! Client-side query cache.
//!
//! Process-wide cache keyed by [`QueryKey`] tuples. Concurrent fetches of an
//! identical key share one in-flight request, stale entries are served while
//! a revalidation runs in the background, and mutations seed + invalidate
//! cache state. Write-backs are epoch-checked: a response that arrives after
//! its entry was invalidated or reseeded is discarded.

mod key;

pub use key::QueryKey;

use dashmap::DashMap;
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::error::{ApiError, Result};

type SharedFetch = Shared<BoxFuture<'static, std::result::Result<Value, Arc<ApiError>>>>;

/// Per-query execution policy.
#[derive(Debug, Clone)]
pub struct QueryOptions {
    /// Enablement predicate result: a disabled query issues no request.
    pub enabled: bool,

    /// Whether failures are retried. Identity-sensitive queries turn this
    /// off so a 401 surfaces immediately as "not logged in".
    pub retry: bool,

    /// How long a cached value counts as fresh.
    pub stale_time: Duration,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            retry: true,
            stale_time: Duration::from_secs(60),
        }
    }
}

impl QueryOptions {
    pub fn no_retry() -> Self {
        Self {
            retry: false,
            ..Self::default()
        }
    }

    /// Gate the query on a precondition.
    pub fn when(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Attempts made when retry is on.
const RETRY_ATTEMPTS: u32 = 3;

#[derive(Default)]
struct CacheEntry {
    data: Option<Value>,
    fetched_at: Option<Instant>,
    stale: bool,
    /// Bumped on every invalidation/reseed; stale write-backs check it.
    epoch: u64,
    inflight: Option<SharedFetch>,
}

struct Inner {
    entries: DashMap<QueryKey, CacheEntry>,
    invalidations: broadcast::Sender<QueryKey>,
}

/// Shared query cache. Cloning is cheap and clones observe the same state.
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<Inner>,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

enum Plan {
    /// Cached value, fresh enough to serve as-is.
    Fresh(Value),
    /// Stale cached value served now; revalidation may run in the background.
    Stale(Value, Option<(SharedFetch, u64)>),
    /// Someone else's request is in flight; share it.
    Join(SharedFetch),
    /// Nothing cached; this caller runs the request.
    Run(SharedFetch, u64),
}

impl QueryCache {
    pub fn new() -> Self {
        let (invalidations, _) = broadcast::channel(64);
        Self {
            inner: Arc::new(Inner {
                entries: DashMap::new(),
                invalidations,
            }),
        }
    }

    /// Execute a query through the cache.
    ///
    /// Returns `Ok(None)` when the query is disabled, otherwise the cached or
    /// freshly fetched value.
    pub async fn fetch<T, F, Fut>(
        &self,
        key: QueryKey,
        options: QueryOptions,
        fetch: F,
    ) -> Result<Option<T>>
    where
        T: Serialize + DeserializeOwned + Send,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        if !options.enabled {
            debug!("Query {} disabled, skipping", key);
            return Ok(None);
        }

        let plan = {
            let mut entry = self
                .inner
                .entries
                .entry(key.clone())
                .or_insert_with(CacheEntry::default);

            let fresh = entry.data.is_some()
                && !entry.stale
                && entry
                    .fetched_at
                    .is_some_and(|t| t.elapsed() < options.stale_time);

            if fresh {
                Plan::Fresh(entry.data.clone().unwrap_or(Value::Null))
            } else if let Some(data) = entry.data.clone() {
                let revalidate = if entry.inflight.is_none() {
                    let fut = shared_fetch(fetch, options.retry);
                    entry.inflight = Some(fut.clone());
                    Some((fut, entry.epoch))
                } else {
                    None
                };
                Plan::Stale(data, revalidate)
            } else if let Some(inflight) = entry.inflight.clone() {
                Plan::Join(inflight)
            } else {
                let fut = shared_fetch(fetch, options.retry);
                entry.inflight = Some(fut.clone());
                Plan::Run(fut, entry.epoch)
            }
        };

        let value = match plan {
            Plan::Fresh(value) => value,
            Plan::Stale(value, revalidate) => {
                if let Some((fut, epoch)) = revalidate {
                    let cache = self.clone();
                    let key = key.clone();
                    tokio::spawn(async move {
                        let result = fut.await;
                        cache.apply(&key, epoch, result);
                    });
                }
                value
            }
            Plan::Join(fut) => fut.await.map_err(|e| e.cloned())?,
            Plan::Run(fut, epoch) => {
                let result = fut.await;
                self.apply(&key, epoch, result.clone());
                result.map_err(|e| e.cloned())?
            }
        };

        Ok(Some(serde_json::from_value(value)?))
    }

    /// Write a fetch result back, unless the entry moved on in the meantime.
    fn apply(&self, key: &QueryKey, epoch: u64, result: std::result::Result<Value, Arc<ApiError>>) {
        let Some(mut entry) = self.inner.entries.get_mut(key) else {
            return;
        };
        if entry.epoch != epoch {
            debug!("Discarding late response for {}", key);
            return;
        }
        entry.inflight = None;
        match result {
            Ok(value) => {
                entry.data = Some(value);
                entry.fetched_at = Some(Instant::now());
                entry.stale = false;
            }
            Err(e) => {
                debug!("Query {} failed: {}", key, e);
            }
        }
    }

    /// Seed the cache for `key` with `value` (mutation responses, prefetches).
    pub fn set_data<T: Serialize>(&self, key: &QueryKey, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)?;
        let mut entry = self
            .inner
            .entries
            .entry(key.clone())
            .or_insert_with(CacheEntry::default);
        entry.epoch += 1;
        entry.inflight = None;
        entry.data = Some(value);
        entry.fetched_at = Some(Instant::now());
        entry.stale = false;
        Ok(())
    }

    /// Peek at cached data without fetching.
    pub fn data<T: DeserializeOwned>(&self, key: &QueryKey) -> Option<T> {
        let entry = self.inner.entries.get(key)?;
        let value = entry.data.clone()?;
        serde_json::from_value(value).ok()
    }

    /// Mark every entry under `prefix` stale and notify subscribers. The next
    /// interested reader triggers a refetch; keys outside the prefix are
    /// untouched.
    pub fn invalidate(&self, prefix: &QueryKey) {
        let mut hit = 0usize;
        for mut kv in self.inner.entries.iter_mut() {
            if kv.key().starts_with(prefix) {
                kv.stale = true;
                kv.epoch += 1;
                kv.inflight = None;
                hit += 1;
            }
        }
        debug!("Invalidated {} entries under {}", hit, prefix);
        let _ = self.inner.invalidations.send(prefix.clone());
    }

    /// Stream of invalidated prefixes, for views that refetch while mounted.
    pub fn subscribe(&self) -> broadcast::Receiver<QueryKey> {
        self.inner.invalidations.subscribe()
    }

    /// Run exactly one write request. On success the response body seeds the
    /// entity's own key and the given prefixes are invalidated; on failure
    /// the cache is left untouched and the error propagates.
    pub async fn mutate<T, Fut>(
        &self,
        request: Fut,
        entity_key: impl FnOnce(&T) -> Option<QueryKey>,
        invalidates: &[QueryKey],
    ) -> Result<T>
    where
        T: Serialize,
        Fut: Future<Output = Result<T>>,
    {
        let value = request.await?;
        if let Some(key) = entity_key(&value) {
            if let Err(e) = self.set_data(&key, &value) {
                warn!("Could not seed cache for {}: {}", key, e);
            }
        }
        for prefix in invalidates {
            self.invalidate(prefix);
        }
        Ok(value)
    }
}

/// Box the fetch (with its retry loop) into a shareable future.
fn shared_fetch<T, F, Fut>(fetch: F, retry: bool) -> SharedFetch
where
    T: Serialize + DeserializeOwned + Send,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    async move {
        let attempts = if retry { RETRY_ATTEMPTS } else { 1 };
        let mut attempt = 0;
        loop {
            attempt += 1;
            match fetch().await {
                Ok(value) => {
                    return serde_json::to_value(value)
                        .map_err(|e| Arc::new(ApiError::from(e)))
                }
                Err(e) if attempt < attempts => {
                    debug!("Query attempt {} failed: {}, retrying", attempt, e);
                    tokio::time::sleep(Duration::from_millis(100 * u64::from(attempt))).await;
                }
                Err(e) => return Err(Arc::new(e)),
            }
        }
    }
    .boxed()
    .shared()
}
