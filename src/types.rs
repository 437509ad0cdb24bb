//! Data model for discovery results.
//!
//! These are the shapes a [`DiscoverySource`](crate::source::DiscoverySource)
//! hands back: the group list, per-group/version resource lists, and decoded
//! schema documents. The cache stores them behind `Arc` and treats them as
//! immutable snapshots; it never inspects or rewrites their contents.

use serde::{Deserialize, Serialize};

/// One version of a resource group, as reported by the server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupVersion {
    /// Full group/version key, e.g. `"astronomy/v8beta1"`.
    pub group_version: String,
    /// Version component alone, e.g. `"v8beta1"`.
    pub version: String,
}

/// A resource group with the versions the server supports for it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    pub versions: Vec<GroupVersion>,
    /// The version the server prefers clients to use, if it declared one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_version: Option<GroupVersion>,
}

/// The full group list returned by one discovery round trip.
///
/// Replaced wholesale on every successful fetch; the cache never merges
/// group lists across fetches.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupList {
    pub groups: Vec<Group>,
}

impl GroupList {
    /// Iterate every group/version key in the list, in server order.
    pub fn group_versions(&self) -> impl Iterator<Item = &str> {
        self.groups
            .iter()
            .flat_map(|g| g.versions.iter())
            .map(|v| v.group_version.as_str())
    }
}

/// One concrete resource kind under a group/version.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResource {
    pub name: String,
    pub singular_name: String,
    pub namespaced: bool,
    pub kind: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub short_names: Vec<String>,
}

/// The resource kinds the server exposes under one group/version.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceList {
    pub group_version: String,
    pub resources: Vec<ApiResource>,
}

/// A decoded schema document for one path and content type.
///
/// Decoding happens in the source; the cache only memoizes the result.
/// Two fetches of unchanged server content yield value-equal documents,
/// but the cache guarantees a *pointer*-stable document per epoch, which
/// is why callers receive `Arc<SchemaDocument>`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SchemaDocument {
    pub content_type: String,
    pub document: serde_json::Value,
}
