//! Per-group/version resource cache with the retry/remember policy.
//!
//! Each group/version key holds an independent outcome: a cached success,
//! a remembered permanent failure, or nothing. The policy in one line:
//! successes and permanent failures are terminal for the epoch, retryable
//! failures are not remembered at all.
//!
//! This module is pure bookkeeping. It never touches the network and is
//! always driven under the client's lock; the split between [`lookup`]
//! (before a fetch) and the `commit_*` methods (after) exists because the
//! client releases that lock around the outbound call and must re-validate
//! the entry when it comes back.
//!
//! [`lookup`]: ResourceCache::lookup

use crate::error::{Error, Result};
use crate::types::ResourceList;
use std::collections::HashMap;
use std::sync::Arc;

/// Remembered outcome for one group/version key.
#[derive(Clone, Debug)]
enum CachedOutcome {
    /// Fetch succeeded; final for the epoch.
    Success(Arc<ResourceList>),
    /// Fetch failed. `retryable: false` is replayed until invalidation;
    /// `retryable: true` only records what the last caller saw and is
    /// re-fetched on the very next lookup.
    Failed { error: Error, retryable: bool },
}

/// Decision for a lookup, taken before any fetch.
#[derive(Clone, Debug)]
pub enum Lookup {
    /// Cached success; return it, no fetch.
    Hit(Arc<ResourceList>),
    /// Remembered permanent failure; replay it, no fetch.
    Failed(Error),
    /// No entry, or a retryable failure: the source must be consulted.
    NeedsFetch,
}

/// Map of group/version key to remembered outcome.
///
/// Entries for distinct keys are fully independent: a permanent failure on
/// one group/version never affects lookups on another.
#[derive(Default)]
pub struct ResourceCache {
    entries: HashMap<String, CachedOutcome>,
}

impl ResourceCache {
    pub fn new() -> Self {
        ResourceCache::default()
    }

    /// Decide how to serve a lookup for `group_version` from current state.
    pub fn lookup(&self, group_version: &str) -> Lookup {
        match self.entries.get(group_version) {
            Some(CachedOutcome::Success(list)) => Lookup::Hit(list.clone()),
            Some(CachedOutcome::Failed {
                error,
                retryable: false,
            }) => Lookup::Failed(error.clone()),
            Some(CachedOutcome::Failed {
                retryable: true, ..
            })
            | None => Lookup::NeedsFetch,
        }
    }

    /// Commit a successful fetch for `group_version`.
    ///
    /// If another caller already committed a success for the same key while
    /// this fetch was in flight, the earlier entry wins and is returned, so
    /// every caller in the epoch sees the same object.
    pub fn commit_success(
        &mut self,
        group_version: &str,
        list: Arc<ResourceList>,
    ) -> Arc<ResourceList> {
        match self.entries.get(group_version) {
            Some(CachedOutcome::Success(existing)) => existing.clone(),
            _ => {
                self.entries.insert(
                    group_version.to_string(),
                    CachedOutcome::Success(list.clone()),
                );
                list
            }
        }
    }

    /// Commit a failed fetch for `group_version`.
    ///
    /// A terminal outcome committed concurrently wins: an existing cached
    /// success is returned instead of the error, and an existing permanent
    /// failure is replayed instead of the newer one. Otherwise the failure
    /// is stored (permanent entries short-circuit future lookups; retryable
    /// entries do not) and returned.
    pub fn commit_failure(
        &mut self,
        group_version: &str,
        error: Error,
        retryable: bool,
    ) -> Result<Arc<ResourceList>> {
        match self.entries.get(group_version) {
            Some(CachedOutcome::Success(existing)) => Ok(existing.clone()),
            Some(CachedOutcome::Failed {
                error: existing,
                retryable: false,
            }) => Err(existing.clone()),
            _ => {
                self.entries.insert(
                    group_version.to_string(),
                    CachedOutcome::Failed {
                        error: error.clone(),
                        retryable,
                    },
                );
                Err(error)
            }
        }
    }

    /// Discard every entry. Called on invalidation.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of keys with a remembered outcome.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return true if no outcome is remembered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
