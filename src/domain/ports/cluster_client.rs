//! Cluster Client Port
//!
//! Defines the interface for live per-cluster client handles and the
//! factory that builds them. The registry core only ever talks to these
//! traits; the actual Proxmox protocol lives in an outbound adapter.

use crate::domain::entities::ClusterDescriptor;
use crate::domain::errors::DispatchError;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

/// A live, ready-to-use client bound to one cluster.
///
/// Handles are expensive to build and are shared behind `Arc` by the handle
/// cache; implementations must tolerate concurrent calls.
#[async_trait]
pub trait ClusterClient: Send + Sync + std::fmt::Debug {
    /// Minimal no-op reachability probe.
    async fn ping(&self) -> Result<PingReport, ClientError>;

    /// Status summary for aggregate reporting.
    async fn summary(&self) -> Result<ClusterSummary, ClientError>;
}

/// Builds live cluster clients from descriptors.
///
/// Safe to call repeatedly and concurrently with different descriptors.
/// Failures must surface as [`DispatchError::Connection`] tagged with the
/// cluster name, never as a panic. Timeout policy belongs to the factory
/// configuration; the cache and registry only forward it.
#[async_trait]
pub trait ClientFactory: Send + Sync {
    async fn construct(
        &self,
        descriptor: &ClusterDescriptor,
    ) -> Result<Arc<dyn ClusterClient>, DispatchError>;
}

/// Result of a reachability probe.
#[derive(Debug, Clone)]
pub struct PingReport {
    /// Number of nodes the cluster reported
    pub node_count: usize,
}

/// One node as reported by the cluster.
#[derive(Debug, Clone, Serialize)]
pub struct NodeSummary {
    pub name: String,
    pub status: String,
}

/// Per-cluster status summary, produced by the handle.
#[derive(Debug, Clone, Serialize)]
pub struct ClusterSummary {
    pub nodes: Vec<NodeSummary>,
    pub vm_count: usize,
    pub lxc_count: usize,
    pub storage_count: usize,
}

/// Failures of a live handle talking to its cluster.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClientError {
    /// Transport-level failure (connect, DNS, timeout)
    #[error("request failed: {0}")]
    Request(String),
    /// The cluster answered with a non-success HTTP status
    #[error("unexpected status {0}")]
    Status(u16),
    /// The cluster answered with a body this client cannot interpret
    #[error("invalid response: {0}")]
    Decode(String),
}
