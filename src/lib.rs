//! # discovery-cache
//!
//! An in-memory, invalidation-driven cache for API capability discovery.
//!
//! Discovery means asking a remote service which resource groups/versions
//! it supports, which resource kinds exist under each, and optionally for
//! the OpenAPI documents describing them. Those answers cost round trips
//! and change rarely, so this crate caches them until a caller explicitly
//! invalidates.
//!
//! ## Features
//!
//! - **Source Agnostic:** Works over any [`DiscoverySource`] implementation;
//!   transport, auth, and wire decoding stay out of the cache
//! - **Retry/Remember Policy:** Permanent failures are remembered per key
//!   and replayed until invalidation, transient ones are re-attempted on
//!   the next call - classification is pluggable via [`ErrorClassifier`]
//! - **Identity-Stable Schemas:** OpenAPI path indexes and schema documents
//!   are memoized per invalidation epoch and handed out as the same `Arc`
//!   on every call, until `invalidate()` turns the epoch over
//! - **Thread Safe:** One coarse lock over all cached state, released
//!   around outbound fetches; invalidation never blocks on a fetch
//!
//! ## Quick Start
//!
//! ```ignore
//! use discovery_cache::{CachedDiscoveryClient, DiscoverySource};
//!
//! // 1. Implement DiscoverySource for your transport
//! let source = MyDiscoveryClient::connect(config)?;
//!
//! // 2. Wrap it in the caching client
//! let client = CachedDiscoveryClient::new(source);
//!
//! // 3. Query cheaply and repeatedly
//! let groups = client.server_groups().await?;
//! let resources = client
//!     .server_resources_for_group_version("astronomy/v8beta1")
//!     .await?;
//! let paths = client.openapi_paths().await?;
//! if let Some(handle) = paths.get("apis/astronomy/v8beta1") {
//!     let schema = handle.schema("application/json").await?;
//! }
//!
//! // 4. Force a refresh when the server's shape may have changed
//! client.invalidate();
//! ```
//!
//! The cache holds nothing across process restarts and runs no background
//! refresh: staleness is entirely under the caller's control.

#[macro_use]
extern crate log;

pub mod classify;
pub mod client;
pub mod error;
pub mod observability;
pub mod resources;
pub mod schema;
pub mod source;
pub mod types;

// Re-exports for convenience
pub use classify::{DefaultClassifier, ErrorClassifier};
pub use client::CachedDiscoveryClient;
pub use error::{Error, Result};
pub use observability::CacheMetrics;
pub use schema::{PathIndex, SchemaHandle};
pub use source::{DiscoverySource, OpenApiRoot, StaticSource};
pub use types::{ApiResource, Group, GroupList, GroupVersion, ResourceList, SchemaDocument};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
