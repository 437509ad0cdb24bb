//! Lazily fetched, identity-stable OpenAPI schema cache.
//!
//! The schema layer is an arena of per-path handles built from one root
//! fetch. The arena ([`PathIndex`]) is tagged with the epoch it was built
//! in; the client compares that tag against its current epoch to decide
//! whether the whole arena can be reused or must be rebuilt. Invalidation
//! never walks into the handles: turning the epoch over orphans the entire
//! arena at once.
//!
//! Each handle memoizes decoded documents per content type. Within an
//! epoch, repeated `schema()` calls hand out the *same* `Arc`, not merely
//! an equal value; after invalidation a rebuilt arena produces new handles
//! and therefore newly decoded documents.

use crate::error::Result;
use crate::source::{DiscoverySource, OpenApiRoot};
use crate::types::SchemaDocument;
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Lazy schema accessor for one discovery path.
///
/// Obtained from [`PathIndex::get`]. Cheap to hold; the document fetch
/// happens on the first [`schema`](SchemaHandle::schema) call per content
/// type.
pub struct SchemaHandle<S> {
    path: String,
    url: String,
    source: Arc<S>,
    documents: DashMap<String, Arc<SchemaDocument>>,
}

impl<S: DiscoverySource> SchemaHandle<S> {
    fn new(path: String, url: String, source: Arc<S>) -> Self {
        SchemaHandle {
            path,
            url,
            source,
            documents: DashMap::new(),
        }
    }

    /// The discovery path this handle serves.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The server-relative URL the document is fetched from.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch-or-reuse the schema document for `content_type`.
    ///
    /// The first successful call per content type fetches and memoizes the
    /// document; every later call returns the identical `Arc`. Failures are
    /// not memoized and are re-attempted on the next call.
    ///
    /// # Errors
    /// Returns `Err` if the source fails to fetch or decode the document.
    pub async fn schema(&self, content_type: &str) -> Result<Arc<SchemaDocument>> {
        if let Some(doc) = self.documents.get(content_type) {
            debug!("✓ Schema {} [{}] -> memoized", self.path, content_type);
            return Ok(doc.clone());
        }

        debug!("Schema {} [{}] -> fetching", self.path, content_type);
        let fetched = Arc::new(self.source.fetch_schema(&self.url, content_type).await?);

        // First writer wins: if a concurrent call memoized a document while
        // ours was in flight, hand out that one so identity stays stable.
        let entry = self
            .documents
            .entry(content_type.to_string())
            .or_insert(fetched);
        Ok(entry.value().clone())
    }
}

/// Epoch-tagged index of schema handles, one per discovery path.
///
/// Shared by all callers of the same epoch; a fresh index (with fresh
/// handles) is built after each invalidation. Comparing `Arc`s from
/// different epochs with [`Arc::ptr_eq`] always yields `false`.
pub struct PathIndex<S> {
    epoch: u64,
    entries: BTreeMap<String, Arc<SchemaHandle<S>>>,
}

impl<S: DiscoverySource> PathIndex<S> {
    /// Build an index from a fetched OpenAPI root, tagged with the epoch
    /// the root fetch was started in.
    pub(crate) fn build(epoch: u64, root: OpenApiRoot, source: Arc<S>) -> Self {
        let entries = root
            .into_iter()
            .map(|(path, url)| {
                let handle = Arc::new(SchemaHandle::new(path.clone(), url, source.clone()));
                (path, handle)
            })
            .collect();
        PathIndex { epoch, entries }
    }

    pub(crate) fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Look up the handle for one path.
    pub fn get(&self, path: &str) -> Option<Arc<SchemaHandle<S>>> {
        self.entries.get(path).cloned()
    }

    /// Iterate all paths in the index, in sorted order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| k.as_str())
    }

    /// Number of paths in the index.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return true if the index has no paths.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
