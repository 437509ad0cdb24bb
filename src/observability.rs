//! Observability hooks for cache behavior.
//!
//! Implement [`CacheMetrics`] to feed hits, misses, fetch failures, and
//! invalidations into your monitoring system:
//!
//! ```ignore
//! use discovery_cache::observability::CacheMetrics;
//!
//! struct PrometheusMetrics;
//!
//! impl CacheMetrics for PrometheusMetrics {
//!     fn record_hit(&self, _key: &str) {
//!         // counter!("discovery_cache_hits").inc();
//!     }
//!     // ... other methods
//! }
//!
//! // let client = CachedDiscoveryClient::new(source)
//! //     .with_metrics(Box::new(PrometheusMetrics));
//! ```
//!
//! The default implementation logs via the `log` crate; [`NoOpMetrics`]
//! silences everything.

/// Trait for cache metrics collection.
///
/// Keys are the lookup identifiers the client uses internally: a
/// group/version string, `"groups"`, or `"openapi-root"`.
pub trait CacheMetrics: Send + Sync {
    /// Record a lookup answered from cache without a fetch.
    fn record_hit(&self, key: &str) {
        debug!("Cache HIT: {}", key);
    }

    /// Record a lookup that had to go to the discovery source.
    fn record_miss(&self, key: &str) {
        debug!("Cache MISS: {}", key);
    }

    /// Record a fetch failure, with its classification.
    fn record_fetch_error(&self, key: &str, error: &str, retryable: bool) {
        warn!(
            "Fetch FAILED for {} (retryable: {}): {}",
            key, retryable, error
        );
    }

    /// Record an invalidation turning over the epoch.
    fn record_invalidation(&self) {
        debug!("Cache invalidated");
    }
}

/// Default metrics implementation (no-op).
#[derive(Clone, Default)]
pub struct NoOpMetrics;

impl CacheMetrics for NoOpMetrics {
    fn record_hit(&self, _key: &str) {}
    fn record_miss(&self, _key: &str) {}
    fn record_fetch_error(&self, _key: &str, _error: &str, _retryable: bool) {}
    fn record_invalidation(&self) {}
}
