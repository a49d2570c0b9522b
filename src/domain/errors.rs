//! Dispatch Errors
//!
//! The error taxonomy surfaced by cluster selection and handle acquisition.
//! Selection errors are deterministic and never retried by this layer;
//! connection errors may be retried by the caller.

/// Errors raised by the registry and its collaborators.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DispatchError {
    /// An explicitly named cluster does not exist in the snapshot.
    #[error("cluster not found: {0}")]
    ClusterNotFound(String),

    /// A resource name matched the patterns of more than one cluster.
    ///
    /// Carries every candidate so the caller can add an explicit cluster
    /// argument or fix the pattern overlap. Never resolved silently.
    #[error(
        "ambiguous cluster selection for '{resource}': candidates {}; \
         specify the cluster explicitly",
        .candidates.join(", ")
    )]
    AmbiguousSelection {
        resource: String,
        candidates: Vec<String>,
    },

    /// Building a live client for a cluster failed.
    #[error("cannot connect to cluster '{cluster}': {reason}")]
    Connection { cluster: String, reason: String },
}

impl DispatchError {
    /// The cluster name a connection failure is tagged with, if any.
    pub fn cluster(&self) -> Option<&str> {
        match self {
            Self::ClusterNotFound(name) => Some(name),
            Self::Connection { cluster, .. } => Some(cluster),
            Self::AmbiguousSelection { .. } => None,
        }
    }
}
