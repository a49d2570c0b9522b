//! Domain Entities - Core business objects
//!
//! The configuration model for dispatchable Proxmox clusters. Descriptors
//! are built once by the configuration loader and never mutated afterwards;
//! the snapshot is the read-only table every selection runs against.

use crate::domain::value_objects::Credentials;
use serde::Serialize;

/// Immutable configuration for one Proxmox cluster.
///
/// A descriptor carries everything needed to build a live client for the
/// cluster plus routing hints. Identity (`name`) is unique across the
/// snapshot; uniqueness is guaranteed by the configuration loader.
#[derive(Debug, Clone)]
pub struct ClusterDescriptor {
    /// Unique, human-chosen cluster name (e.g. "prod")
    pub name: String,
    /// Base URL of the cluster API (e.g. "https://pve1.example:8006")
    pub api_url: String,
    /// API token material; never logged or echoed
    pub credentials: Credentials,
    /// Whether to verify the cluster's TLS certificate
    pub verify_tls: bool,
    /// Default node hint for operation wrappers, unused by selection
    pub default_node: Option<String>,
    /// Default storage hint for operation wrappers
    pub default_storage: Option<String>,
    /// Default network bridge hint for operation wrappers
    pub default_bridge: Option<String>,
    /// Free-form display/filtering tags (region, tier, ...); never used
    /// by selection logic
    pub metadata: Vec<MetadataTag>,
    /// Resource-name prefixes that route to this cluster
    pub name_patterns: Vec<String>,
}

impl ClusterDescriptor {
    /// Credential-free view of this descriptor, safe to serialize and show.
    pub fn view(&self) -> ClusterView {
        ClusterView {
            name: self.name.clone(),
            api_url: self.api_url.clone(),
            token_user: self.credentials.user().to_string(),
            verify_tls: self.verify_tls,
            default_node: self.default_node.clone(),
            default_storage: self.default_storage.clone(),
            default_bridge: self.default_bridge.clone(),
            metadata: self.metadata.clone(),
            name_patterns: self.name_patterns.clone(),
        }
    }
}

/// One free-form key/value tag on a cluster (e.g. region=eu, tier=prod).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetadataTag {
    pub key: String,
    pub value: String,
}

impl MetadataTag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// What `describe` returns: a descriptor with the secret stripped.
#[derive(Debug, Clone, Serialize)]
pub struct ClusterView {
    pub name: String,
    pub api_url: String,
    /// `user@realm` part of the token id; the token name and secret stay out
    pub token_user: String,
    pub verify_tls: bool,
    pub default_node: Option<String>,
    pub default_storage: Option<String>,
    pub default_bridge: Option<String>,
    pub metadata: Vec<MetadataTag>,
    pub name_patterns: Vec<String>,
}

/// The full set of configured clusters, insertion order preserved.
///
/// Built once at process start from the configuration loader's output and
/// read-only for the process lifetime. The loader guarantees at least one
/// cluster and unique names; the snapshot does not re-validate.
#[derive(Debug, Clone)]
pub struct RegistrySnapshot {
    clusters: Vec<ClusterDescriptor>,
    default_cluster: String,
    patterns_ignore_case: bool,
}

impl RegistrySnapshot {
    /// Build a snapshot. The first cluster becomes the default.
    pub fn new(clusters: Vec<ClusterDescriptor>) -> Self {
        let default_cluster = clusters
            .first()
            .map(|c| c.name.clone())
            .unwrap_or_default();
        Self {
            clusters,
            default_cluster,
            patterns_ignore_case: false,
        }
    }

    /// Override the default cluster (must name a configured cluster).
    pub fn with_default(mut self, name: impl Into<String>) -> Self {
        self.default_cluster = name.into();
        self
    }

    /// Make prefix matching case-insensitive.
    pub fn with_ignore_case(mut self, ignore_case: bool) -> Self {
        self.patterns_ignore_case = ignore_case;
        self
    }

    /// All descriptors, insertion order.
    pub fn clusters(&self) -> &[ClusterDescriptor] {
        &self.clusters
    }

    /// Look up one descriptor by name.
    pub fn get(&self, name: &str) -> Option<&ClusterDescriptor> {
        self.clusters.iter().find(|c| c.name == name)
    }

    /// Whether a cluster with this name is configured.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// The cluster used when nothing else selects.
    pub fn default_cluster(&self) -> &str {
        &self.default_cluster
    }

    /// Whether prefix matching ignores case.
    pub fn patterns_ignore_case(&self) -> bool {
        self.patterns_ignore_case
    }

    /// Number of configured clusters.
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }
}
