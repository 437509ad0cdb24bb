//! Discovery source trait for abstracting the remote discovery service.
//!
//! The `DiscoverySource` trait decouples the cache from the transport,
//! authentication, and wire serialization of the real discovery endpoint.
//! The cache only ever calls these four operations; everything about how
//! they reach the server is the implementation's business.
//!
//! # Mocking for Tests
//!
//! [`StaticSource`] in this module is a complete in-memory implementation
//! backed by plain maps, with per-operation call counters. Tests use the
//! counters to assert that a cached lookup did *not* reach the source.

use crate::error::{Error, Result};
use crate::types::{GroupList, ResourceList, SchemaDocument};
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Index returned by an OpenAPI root fetch: discovery path to the
/// server-relative URL its schema document is served from.
pub type OpenApiRoot = BTreeMap<String, String>;

/// Trait for remote discovery service implementations.
///
/// All methods use `&self`; implementations needing mutable state should
/// use interior mutability. Each operation may fail independently, and the
/// cache layers above decide which failures are remembered.
///
/// **ASYNC:** All methods are async and must be awaited.
#[allow(async_fn_in_trait)]
pub trait DiscoverySource: Send + Sync {
    /// Fetch the full group list in one round trip.
    ///
    /// # Errors
    /// Returns `Err` if the server cannot be reached or rejects the request.
    async fn fetch_groups(&self) -> Result<GroupList>;

    /// Fetch the resource list for a single group/version key.
    ///
    /// # Errors
    /// Returns `Err` on failure, including `Error::NotFound` when the
    /// group/version does not exist on the server.
    async fn fetch_resources_for_group_version(&self, group_version: &str)
        -> Result<ResourceList>;

    /// Fetch the root of the OpenAPI document tree: the index of paths and
    /// the server-relative URL each schema document lives at.
    ///
    /// # Errors
    /// Returns `Err` if the root document cannot be fetched or decoded.
    async fn fetch_openapi_root(&self) -> Result<OpenApiRoot>;

    /// Fetch and decode one schema document.
    ///
    /// `url` is a server-relative URL from a previous
    /// [`fetch_openapi_root`](DiscoverySource::fetch_openapi_root) call.
    /// Each call produces a freshly decoded document; memoization is the
    /// cache's job, not the source's.
    ///
    /// # Errors
    /// Returns `Err` on fetch or decode failure.
    async fn fetch_schema(&self, url: &str, content_type: &str) -> Result<SchemaDocument>;
}

// ============================================================================
// In-Memory Test Source
// ============================================================================

#[derive(Default)]
struct StaticSourceState {
    groups: Option<GroupList>,
    groups_error: Option<Error>,
    resources: HashMap<String, Result<ResourceList>>,
    openapi_root: OpenApiRoot,
    root_error: Option<Error>,
    schemas: HashMap<(String, String), serde_json::Value>,
}

/// In-memory discovery source for testing cache behavior.
///
/// Backing data is behind a `Mutex`, so a test can mutate the "server"
/// through a shared reference while a client built on top of it is live.
/// This is how the retry/remember scenarios are exercised: flip an entry
/// from error to success and observe whether the cache re-fetches.
///
/// Every fetch bumps a per-operation counter. `resource_fetches()` staying
/// flat across a lookup is the test-visible proof that the cache answered
/// from memory.
#[derive(Default)]
pub struct StaticSource {
    state: Mutex<StaticSourceState>,
    group_fetches: AtomicUsize,
    resource_fetches: AtomicUsize,
    root_fetches: AtomicUsize,
    schema_fetches: AtomicUsize,
}

impl StaticSource {
    /// Create an empty source. Every fetch fails with `Error::NotFound`
    /// until backing data is supplied.
    pub fn new() -> Self {
        StaticSource::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, StaticSourceState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Set the group list returned by `fetch_groups`.
    pub fn set_groups(&self, groups: GroupList) {
        self.state().groups = Some(groups);
    }

    /// Force `fetch_groups` to fail with `error` (pass `None` to clear).
    pub fn set_groups_error(&self, error: Option<Error>) {
        self.state().groups_error = error;
    }

    /// Set the outcome of `fetch_resources_for_group_version` for one key.
    pub fn set_resources(&self, group_version: &str, outcome: Result<ResourceList>) {
        self.state()
            .resources
            .insert(group_version.to_string(), outcome);
    }

    /// Remove a group/version entry; fetches for it return `Error::NotFound`.
    pub fn remove_resources(&self, group_version: &str) {
        self.state().resources.remove(group_version);
    }

    /// Set the path index returned by `fetch_openapi_root`.
    pub fn set_openapi_root(&self, root: OpenApiRoot) {
        self.state().openapi_root = root;
    }

    /// Force `fetch_openapi_root` to fail with `error` (pass `None` to clear).
    pub fn set_openapi_root_error(&self, error: Option<Error>) {
        self.state().root_error = error;
    }

    /// Set the document body served for a `(url, content_type)` pair.
    pub fn set_schema(&self, url: &str, content_type: &str, document: serde_json::Value) {
        self.state()
            .schemas
            .insert((url.to_string(), content_type.to_string()), document);
    }

    /// Number of `fetch_groups` calls made so far.
    pub fn group_fetches(&self) -> usize {
        self.group_fetches.load(Ordering::SeqCst)
    }

    /// Number of `fetch_resources_for_group_version` calls made so far.
    pub fn resource_fetches(&self) -> usize {
        self.resource_fetches.load(Ordering::SeqCst)
    }

    /// Number of `fetch_openapi_root` calls made so far.
    pub fn root_fetches(&self) -> usize {
        self.root_fetches.load(Ordering::SeqCst)
    }

    /// Number of `fetch_schema` calls made so far.
    pub fn schema_fetches(&self) -> usize {
        self.schema_fetches.load(Ordering::SeqCst)
    }
}

impl DiscoverySource for StaticSource {
    async fn fetch_groups(&self) -> Result<GroupList> {
        self.group_fetches.fetch_add(1, Ordering::SeqCst);
        let state = self.state();
        if let Some(err) = &state.groups_error {
            return Err(err.clone());
        }
        state
            .groups
            .clone()
            .ok_or_else(|| Error::NotFound("no group list configured".to_string()))
    }

    async fn fetch_resources_for_group_version(
        &self,
        group_version: &str,
    ) -> Result<ResourceList> {
        self.resource_fetches.fetch_add(1, Ordering::SeqCst);
        match self.state().resources.get(group_version) {
            Some(outcome) => outcome.clone(),
            None => Err(Error::NotFound(format!(
                "no resource list for {}",
                group_version
            ))),
        }
    }

    async fn fetch_openapi_root(&self) -> Result<OpenApiRoot> {
        self.root_fetches.fetch_add(1, Ordering::SeqCst);
        let state = self.state();
        if let Some(err) = &state.root_error {
            return Err(err.clone());
        }
        Ok(state.openapi_root.clone())
    }

    async fn fetch_schema(&self, url: &str, content_type: &str) -> Result<SchemaDocument> {
        self.schema_fetches.fetch_add(1, Ordering::SeqCst);
        match self
            .state()
            .schemas
            .get(&(url.to_string(), content_type.to_string()))
        {
            // Decoded fresh on every call: a new SchemaDocument object each
            // time, value-equal to previous ones while the data is unchanged.
            Some(doc) => Ok(SchemaDocument {
                content_type: content_type.to_string(),
                document: doc.clone(),
            }),
            None => Err(Error::NotFound(format!(
                "no schema for {} as {}",
                url, content_type
            ))),
        }
    }
}
