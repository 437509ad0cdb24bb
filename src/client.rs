//! Cached discovery client - main entry point for cache operations.

use crate::classify::{DefaultClassifier, ErrorClassifier};
use crate::error::Result;
use crate::observability::{CacheMetrics, NoOpMetrics};
use crate::resources::{Lookup, ResourceCache};
use crate::schema::PathIndex;
use crate::source::DiscoverySource;
use crate::types::{GroupList, ResourceList};
use std::sync::{Arc, Mutex, MutexGuard};

const GROUPS_KEY: &str = "groups";
const OPENAPI_KEY: &str = "openapi-root";

/// All cached state, guarded by one mutex on the client.
///
/// Everything in here belongs to the epoch named by `epoch`; `invalidate`
/// turns all of it over in one critical section, so no caller can observe
/// a mix of pre- and post-invalidation data. The schema index is not
/// deep-cleared on invalidation: it carries its own epoch tag and a stale
/// tag simply stops matching.
struct CacheState<S> {
    epoch: u64,
    fresh: bool,
    groups: Option<Arc<GroupList>>,
    resources: ResourceCache,
    schema_index: Option<Arc<PathIndex<S>>>,
}

/// Caching façade over a [`DiscoverySource`].
///
/// Lookups are answered from memory when possible and delegated to the
/// source otherwise; fetch failures go through the [`ErrorClassifier`] to
/// decide whether they are remembered (permanent) or re-attempted on the
/// next call (retryable). [`invalidate`](CachedDiscoveryClient::invalidate)
/// atomically discards everything.
///
/// The client performs no background work and no periodic refresh: the
/// source is only contacted from inside a caller's lookup.
///
/// # Concurrency
///
/// All cached state sits behind a single mutex, released around every
/// outbound fetch so unrelated keys never block each other. A fetch
/// captures the epoch before going out and re-validates it before
/// committing; a fetch that straddles an invalidation is returned to its
/// caller but never stored.
///
/// # Example
///
/// ```ignore
/// use discovery_cache::CachedDiscoveryClient;
///
/// let client = CachedDiscoveryClient::new(source);
/// assert!(!client.fresh());
///
/// let groups = client.server_groups().await?;
/// assert!(client.fresh());
///
/// let list = client.server_resources_for_group_version("astronomy/v8beta1").await?;
///
/// client.invalidate();   // next lookups re-fetch everything
/// ```
pub struct CachedDiscoveryClient<S, C = DefaultClassifier> {
    source: Arc<S>,
    classifier: C,
    metrics: Box<dyn CacheMetrics>,
    state: Mutex<CacheState<S>>,
}

impl<S: DiscoverySource> CachedDiscoveryClient<S, DefaultClassifier> {
    /// Create a client over `source` with the default error classification.
    pub fn new(source: S) -> Self {
        CachedDiscoveryClient {
            source: Arc::new(source),
            classifier: DefaultClassifier,
            metrics: Box::new(NoOpMetrics),
            state: Mutex::new(CacheState {
                epoch: 0,
                fresh: false,
                groups: None,
                resources: ResourceCache::new(),
                schema_index: None,
            }),
        }
    }
}

impl<S: DiscoverySource, C: ErrorClassifier> CachedDiscoveryClient<S, C> {
    /// Swap in a custom error classification policy.
    pub fn with_classifier<C2: ErrorClassifier>(
        self,
        classifier: C2,
    ) -> CachedDiscoveryClient<S, C2> {
        CachedDiscoveryClient {
            source: self.source,
            classifier,
            metrics: self.metrics,
            state: self.state,
        }
    }

    /// Set custom metrics handler.
    pub fn with_metrics(mut self, metrics: Box<dyn CacheMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Get a reference to the underlying discovery source.
    pub fn source(&self) -> &S {
        &self.source
    }

    fn locked(&self) -> MutexGuard<'_, CacheState<S>> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Whether the group list has been fetched successfully at least once
    /// since the last invalidation. No side effects, no network access.
    pub fn fresh(&self) -> bool {
        self.locked().fresh
    }

    /// Atomically discard the group snapshot, every per-key resource
    /// outcome, and the schema index, and reset freshness.
    ///
    /// Always succeeds and is idempotent. Does not block on or abort any
    /// in-flight fetch; a fetch that completes after this call observes the
    /// new epoch and is discarded instead of stored.
    pub fn invalidate(&self) {
        let mut state = self.locked();
        state.epoch += 1;
        state.fresh = false;
        state.groups = None;
        state.resources.clear();
        // schema_index stays in place: its epoch tag no longer matches, so
        // it is dead to readers and replaced on the next openapi_paths().
        debug!("✓ Cache invalidated, epoch {}", state.epoch);
        self.metrics.record_invalidation();
    }

    /// Return the cached group list, fetching it if none is cached.
    ///
    /// A successful fetch stores the snapshot and establishes freshness. A
    /// failed fetch is returned as-is and remembered under *neither*
    /// policy: every subsequent call re-attempts, so an unreachable server
    /// cannot freeze the client in a permanently failed state.
    ///
    /// # Errors
    /// Returns whatever the source produced, unmodified.
    pub async fn server_groups(&self) -> Result<Arc<GroupList>> {
        let epoch = {
            let state = self.locked();
            if let Some(groups) = &state.groups {
                self.metrics.record_hit(GROUPS_KEY);
                return Ok(groups.clone());
            }
            state.epoch
        };

        self.metrics.record_miss(GROUPS_KEY);
        let fetched = self.source.fetch_groups().await;

        let mut state = self.locked();
        match fetched {
            Ok(list) => {
                if let Some(groups) = &state.groups {
                    // Another caller landed first; share its snapshot.
                    return Ok(groups.clone());
                }
                let list = Arc::new(list);
                if state.epoch == epoch {
                    state.groups = Some(list.clone());
                    state.fresh = true;
                    debug!("✓ Group list cached ({} groups)", list.groups.len());
                } else {
                    debug!("Group fetch crossed an invalidation, not stored");
                }
                Ok(list)
            }
            Err(err) => {
                self.metrics
                    .record_fetch_error(GROUPS_KEY, &err.to_string(), true);
                Err(err)
            }
        }
    }

    /// Return the resource list for `group_version`, consulting the
    /// per-key cache first.
    ///
    /// A cached success or remembered permanent failure is served without
    /// contacting the source. Otherwise the source is called and the
    /// outcome committed under the retry/remember policy: successes and
    /// permanent failures are terminal for the epoch, retryable failures
    /// are returned but re-attempted on the very next call.
    ///
    /// # Errors
    /// Returns whatever the source produced (or the remembered copy of it).
    pub async fn server_resources_for_group_version(
        &self,
        group_version: &str,
    ) -> Result<Arc<ResourceList>> {
        let epoch = {
            let state = self.locked();
            match state.resources.lookup(group_version) {
                Lookup::Hit(list) => {
                    self.metrics.record_hit(group_version);
                    return Ok(list);
                }
                Lookup::Failed(err) => {
                    self.metrics.record_hit(group_version);
                    return Err(err);
                }
                Lookup::NeedsFetch => state.epoch,
            }
        };

        self.metrics.record_miss(group_version);
        let fetched = self
            .source
            .fetch_resources_for_group_version(group_version)
            .await;

        let mut state = self.locked();
        let stale = state.epoch != epoch;
        match fetched {
            Ok(list) => {
                let list = Arc::new(list);
                if stale {
                    debug!(
                        "Resource fetch for {} crossed an invalidation, not stored",
                        group_version
                    );
                    return Ok(list);
                }
                Ok(state.resources.commit_success(group_version, list))
            }
            Err(err) => {
                let retryable = self.classifier.is_retryable(&err);
                self.metrics
                    .record_fetch_error(group_version, &err.to_string(), retryable);
                if stale {
                    return Err(err);
                }
                state.resources.commit_failure(group_version, err, retryable)
            }
        }
    }

    /// Return the schema path index for the current epoch, fetching the
    /// OpenAPI root if no index has been built since the last invalidation.
    ///
    /// Every call within an epoch returns the identical index object; the
    /// handles inside memoize documents per content type the same way (see
    /// [`SchemaHandle::schema`](crate::schema::SchemaHandle::schema)). Root
    /// fetch failures are never remembered.
    ///
    /// # Errors
    /// Returns whatever the source produced, unmodified.
    pub async fn openapi_paths(&self) -> Result<Arc<PathIndex<S>>> {
        let epoch = {
            let state = self.locked();
            if let Some(index) = &state.schema_index {
                if index.epoch() == state.epoch {
                    self.metrics.record_hit(OPENAPI_KEY);
                    return Ok(index.clone());
                }
            }
            state.epoch
        };

        self.metrics.record_miss(OPENAPI_KEY);
        let fetched = self.source.fetch_openapi_root().await;

        let mut state = self.locked();
        match fetched {
            Ok(root) => {
                if let Some(index) = &state.schema_index {
                    if index.epoch() == state.epoch {
                        // Another caller built the index meanwhile.
                        return Ok(index.clone());
                    }
                }
                let index = Arc::new(PathIndex::build(epoch, root, self.source.clone()));
                if state.epoch == epoch {
                    state.schema_index = Some(index.clone());
                    debug!("✓ OpenAPI path index cached ({} paths)", index.len());
                } else {
                    debug!("OpenAPI root fetch crossed an invalidation, not stored");
                }
                Ok(index)
            }
            Err(err) => {
                self.metrics
                    .record_fetch_error(OPENAPI_KEY, &err.to_string(), true);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::source::StaticSource;
    use crate::types::{Group, GroupVersion};

    fn astronomy_groups() -> GroupList {
        GroupList {
            groups: vec![Group {
                name: "astronomy".to_string(),
                versions: vec![GroupVersion {
                    group_version: "astronomy/v8beta1".to_string(),
                    version: "v8beta1".to_string(),
                }],
                preferred_version: None,
            }],
        }
    }

    #[test]
    fn test_new_client_is_not_fresh() {
        let client = CachedDiscoveryClient::new(StaticSource::new());
        assert!(!client.fresh());
    }

    #[tokio::test]
    async fn test_freshness_transitions() {
        let client = CachedDiscoveryClient::new(StaticSource::new());
        client.source().set_groups(astronomy_groups());

        client.server_groups().await.expect("Failed to fetch groups");
        assert!(client.fresh());

        client.invalidate();
        assert!(!client.fresh());
    }

    #[test]
    fn test_invalidate_is_idempotent_when_empty() {
        let client = CachedDiscoveryClient::new(StaticSource::new());
        client.invalidate();
        client.invalidate();
        assert!(!client.fresh());
    }

    #[tokio::test]
    async fn test_failed_group_fetch_leaves_not_fresh() {
        let client = CachedDiscoveryClient::new(StaticSource::new());
        client
            .source()
            .set_groups_error(Some(Error::Other("some error".to_string())));

        assert!(client.server_groups().await.is_err());
        assert!(!client.fresh());
    }

    #[tokio::test]
    async fn test_custom_classifier_is_consulted() {
        // Treat everything as retryable: even a NotFound must be re-fetched.
        let client = CachedDiscoveryClient::new(StaticSource::new())
            .with_classifier(|_: &Error| true);
        let gv = "astronomy/v8beta1";

        assert!(client.server_resources_for_group_version(gv).await.is_err());
        assert!(client.server_resources_for_group_version(gv).await.is_err());
        assert_eq!(client.source().resource_fetches(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_lookups_share_one_snapshot() {
        let client = Arc::new(CachedDiscoveryClient::new(StaticSource::new()));
        client.source().set_groups(astronomy_groups());

        let mut handles = vec![];
        for _ in 0..10 {
            let client = Arc::clone(&client);
            handles.push(tokio::spawn(async move {
                client.server_groups().await.expect("Failed to fetch groups")
            }));
        }

        let mut snapshots = vec![];
        for handle in handles {
            snapshots.push(handle.await.expect("Task failed"));
        }

        // Once a snapshot is cached, everyone sees the same Arc.
        let cached = client.server_groups().await.expect("Failed to fetch groups");
        for snapshot in &snapshots {
            assert_eq!(**snapshot, *cached);
        }
        assert!(client.fresh());
    }
}
