//! Read cache and refresh policy
//!
//! Async wrapper over [`bantay_cache_core::StalenessCache`]. Each queryable
//! remote collection has one [`CacheKey`]; raw wire documents are cached and
//! decoded on read. Aggregate/metrics reads get a 30-second staleness window;
//! listing reads use a zero window and are refetched on every explicit call,
//! since seeing one's own just-submitted mutation matters more than saving a
//! cheap list fetch.

use crate::error::Result;
use bantay_cache_core::{CacheStats, StalenessCache};
use serde_json::Value;
use std::future::Future;
use std::time::Instant;
use tokio::sync::Mutex;

pub use crate::config::DEFAULT_METRICS_STALE_MS;

/// Queryable remote collections and aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Transactions,
    Wallets,
    Allocations,
    Events,
    CivicBodies,
    Audit,
    HighValue,
    Recovery,
    SystemMetrics,
    SecurityMetrics,
    ServiceMetrics,
    CategoryDistribution,
    MonthlyExpenditure,
}

impl CacheKey {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Transactions => "transactions",
            Self::Wallets => "wallets",
            Self::Allocations => "allocations",
            Self::Events => "events",
            Self::CivicBodies => "civic_bodies",
            Self::Audit => "audit",
            Self::HighValue => "high_value",
            Self::Recovery => "recovery",
            Self::SystemMetrics => "system_metrics",
            Self::SecurityMetrics => "security_metrics",
            Self::ServiceMetrics => "service_metrics",
            Self::CategoryDistribution => "category_distribution",
            Self::MonthlyExpenditure => "monthly_expenditure",
        }
    }

    /// Default staleness window. Zero means refetch on every explicit call.
    pub fn stale_ms(self) -> u64 {
        match self {
            Self::SystemMetrics
            | Self::SecurityMetrics
            | Self::ServiceMetrics
            | Self::CategoryDistribution
            | Self::MonthlyExpenditure => DEFAULT_METRICS_STALE_MS,
            _ => 0,
        }
    }
}

type Clock = Box<dyn Fn() -> u64 + Send + Sync>;

/// Staleness-bounded cache of raw wire documents, one slot per [`CacheKey`].
pub struct ReadCache {
    inner: Mutex<StalenessCache<Value>>,
    clock: Clock,
}

impl ReadCache {
    pub fn new() -> Self {
        let anchor = Instant::now();
        Self::with_clock(Box::new(move || anchor.elapsed().as_millis() as u64))
    }

    /// Construct with an injected monotonic-milliseconds clock (tests).
    pub fn with_clock(clock: Clock) -> Self {
        Self {
            inner: Mutex::new(StalenessCache::new()),
            clock,
        }
    }

    fn now(&self) -> u64 {
        (self.clock)()
    }

    /// Serve from cache when fresh, otherwise run the fetcher and store its
    /// result. A failed fetch leaves any previous entry untouched and
    /// propagates the error. A completion superseded by a newer fetch or a
    /// credential swap is returned to its caller but not stored.
    pub async fn get_or_fetch<F, Fut>(&self, key: CacheKey, stale_ms: u64, fetch: F) -> Result<Value>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value>>,
    {
        let ticket = {
            let mut cache = self.inner.lock().await;
            if let Some(value) = cache.fresh(key.as_str(), self.now(), stale_ms) {
                return Ok(value.clone());
            }
            cache.begin(key.as_str())
        };

        match fetch().await {
            Ok(value) => {
                let mut cache = self.inner.lock().await;
                cache.admit(&ticket, value.clone(), self.now());
                Ok(value)
            }
            Err(e) => {
                self.inner.lock().await.abandon(&ticket);
                Err(e)
            }
        }
    }

    /// Fetch unconditionally, bypassing any fresh entry.
    pub async fn force_refresh<F, Fut>(&self, key: CacheKey, fetch: F) -> Result<Value>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value>>,
    {
        self.get_or_fetch(key, 0, fetch).await
    }

    /// Last known value regardless of age (stale-while-revalidate display).
    pub async fn peek(&self, key: CacheKey) -> Option<Value> {
        self.inner.lock().await.any(key.as_str()).cloned()
    }

    /// Drop the listed keys. Applied by the mutation gateway after a
    /// confirmed ok, never partially.
    pub async fn invalidate(&self, keys: &[CacheKey]) {
        let mut cache = self.inner.lock().await;
        for key in keys {
            cache.invalidate(key.as_str());
        }
    }

    /// Drop everything and invalidate in-flight fetches (credential swap).
    pub async fn clear(&self) {
        self.inner.lock().await.clear();
    }

    pub async fn stats(&self) -> CacheStats {
        self.inner.lock().await.stats()
    }
}

impl Default for ReadCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use serde_json::json;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    fn manual_clock() -> (Arc<AtomicU64>, ReadCache) {
        let now = Arc::new(AtomicU64::new(0));
        let clock_now = now.clone();
        let cache = ReadCache::with_clock(Box::new(move || clock_now.load(Ordering::SeqCst)));
        (now, cache)
    }

    #[tokio::test]
    async fn second_read_within_window_skips_fetcher() {
        let (_, cache) = manual_clock();
        let calls = Arc::new(AtomicU64::new(0));

        for _ in 0..2 {
            let calls = calls.clone();
            let value = cache
                .get_or_fetch(CacheKey::SystemMetrics, 30_000, move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(json!({"total": 1}))
                })
                .await
                .unwrap();
            assert_eq!(value, json!({"total": 1}));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn read_after_window_elapses_fetches_again() {
        let (now, cache) = manual_clock();
        let calls = Arc::new(AtomicU64::new(0));

        let fetch = |calls: Arc<AtomicU64>| {
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(json!(1))
            }
        };

        cache
            .get_or_fetch(CacheKey::SystemMetrics, 30_000, fetch(calls.clone()))
            .await
            .unwrap();
        now.store(30_000, Ordering::SeqCst);
        cache
            .get_or_fetch(CacheKey::SystemMetrics, 30_000, fetch(calls.clone()))
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn zero_window_listing_always_refetches() {
        let (_, cache) = manual_clock();
        let calls = Arc::new(AtomicU64::new(0));

        for _ in 0..3 {
            let calls = calls.clone();
            cache
                .get_or_fetch(CacheKey::Transactions, CacheKey::Transactions.stale_ms(), move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(json!([]))
                })
                .await
                .unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn failed_fetch_propagates_and_keeps_previous_value() {
        let (now, cache) = manual_clock();

        cache
            .get_or_fetch(CacheKey::SystemMetrics, 30_000, || async { Ok(json!("v1")) })
            .await
            .unwrap();

        now.store(60_000, Ordering::SeqCst);
        let err = cache
            .get_or_fetch(CacheKey::SystemMetrics, 30_000, || async {
                Err(ClientError::Transport("connection refused".into()))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));

        // Stale value remains displayable.
        assert_eq!(cache.peek(CacheKey::SystemMetrics).await, Some(json!("v1")));
    }

    #[tokio::test]
    async fn clear_discards_in_flight_completion() {
        let (_, cache) = manual_clock();

        // Start a fetch whose completion arrives after a credential swap.
        let ticket = cache.inner.lock().await.begin(CacheKey::Allocations.as_str());
        cache.clear().await;

        let admitted = cache
            .inner
            .lock()
            .await
            .admit(&ticket, json!("stale identity data"), 0);
        assert!(!admitted);
        assert_eq!(cache.peek(CacheKey::Allocations).await, None);
    }

    #[tokio::test]
    async fn invalidation_is_per_key() {
        let (_, cache) = manual_clock();

        cache
            .get_or_fetch(CacheKey::SystemMetrics, 30_000, || async { Ok(json!(1)) })
            .await
            .unwrap();
        cache
            .get_or_fetch(CacheKey::SecurityMetrics, 30_000, || async { Ok(json!(2)) })
            .await
            .unwrap();

        cache.invalidate(&[CacheKey::SystemMetrics]).await;

        assert_eq!(cache.peek(CacheKey::SystemMetrics).await, None);
        assert_eq!(cache.peek(CacheKey::SecurityMetrics).await, Some(json!(2)));
    }
}
