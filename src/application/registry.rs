//! Cluster Registry - Main application use case
//!
//! The facade callers use to reach a cluster: selection, handle caching,
//! redacted description, and aggregate health/status reporting. One registry
//! instance is constructed explicitly at composition time and its reference
//! passed to every call site; there is no global singleton.

use crate::domain::entities::{ClusterDescriptor, ClusterView, MetadataTag, RegistrySnapshot};
use crate::domain::errors::DispatchError;
use crate::domain::ports::{ClientFactory, ClusterClient, NodeSummary};
use crate::domain::services::SelectionPolicy;
use crate::infrastructure::HandleCache;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Reachability of one cluster, as reported by [`ClusterRegistry::validate_all`].
#[derive(Debug, Clone, Serialize)]
pub struct ClusterHealth {
    pub reachable: bool,
    pub message: String,
}

/// Aggregate status of one cluster.
///
/// Produced by the cluster's own handle; the registry only adds fan-out and
/// per-cluster failure isolation. An unreachable cluster yields an entry
/// with `online: false` and the error message instead of aborting the call.
#[derive(Debug, Clone, Serialize)]
pub struct ClusterStatus {
    pub cluster: String,
    pub api_url: String,
    pub metadata: Vec<MetadataTag>,
    pub online: bool,
    pub nodes: Vec<NodeSummary>,
    pub vm_count: usize,
    pub lxc_count: usize,
    pub storage_count: usize,
    pub error: Option<String>,
}

/// Central registry for dispatching calls across configured clusters.
pub struct ClusterRegistry {
    snapshot: Arc<RegistrySnapshot>,
    cache: Arc<HandleCache>,
}

impl ClusterRegistry {
    /// Create a registry over a snapshot and a client factory.
    pub fn new(
        snapshot: RegistrySnapshot,
        factory: Arc<dyn ClientFactory>,
        cache_ttl: Duration,
    ) -> Self {
        tracing::info!(
            "initialized cluster registry with {} cluster(s), default '{}'",
            snapshot.len(),
            snapshot.default_cluster()
        );
        Self {
            snapshot: Arc::new(snapshot),
            cache: Arc::new(HandleCache::new(factory, cache_ttl)),
        }
    }

    /// The configuration this registry serves from.
    pub fn snapshot(&self) -> &RegistrySnapshot {
        &self.snapshot
    }

    /// Resolve and return a live handle for a call.
    ///
    /// Selection precedence: explicit cluster name, then resource-name
    /// patterns, then the default cluster. The handle is cached; repeated
    /// calls within the TTL return the same instance.
    pub async fn get_handle(
        &self,
        cluster: Option<&str>,
        resource: Option<&str>,
    ) -> Result<Arc<dyn ClusterClient>, DispatchError> {
        let selected = SelectionPolicy::select(&self.snapshot, cluster, resource)?;
        let descriptor = self
            .snapshot
            .get(&selected)
            .ok_or_else(|| DispatchError::ClusterNotFound(selected.clone()))?;
        self.cache.get(descriptor).await
    }

    /// All configured cluster names, insertion order.
    pub fn list_clusters(&self) -> Vec<String> {
        self.snapshot
            .clusters()
            .iter()
            .map(|c| c.name.clone())
            .collect()
    }

    /// Credential-free description of one cluster.
    pub fn describe(&self, name: &str) -> Result<ClusterView, DispatchError> {
        self.snapshot
            .get(name)
            .map(ClusterDescriptor::view)
            .ok_or_else(|| DispatchError::ClusterNotFound(name.to_string()))
    }

    /// Probe connectivity to every cluster.
    ///
    /// Never fails as a whole: each cluster gets a `(reachable, message)`
    /// entry and unreachable clusters degrade to `reachable: false`.
    pub async fn validate_all(&self) -> HashMap<String, ClusterHealth> {
        let mut results = HashMap::new();

        for descriptor in self.snapshot.clusters() {
            let health = match self.cache.get(descriptor).await {
                Ok(handle) => match handle.ping().await {
                    Ok(report) => {
                        tracing::info!("cluster '{}' is healthy", descriptor.name);
                        ClusterHealth {
                            reachable: true,
                            message: format!("OK ({} nodes)", report.node_count),
                        }
                    }
                    Err(e) => {
                        tracing::warn!("cluster '{}' validation failed: {}", descriptor.name, e);
                        ClusterHealth {
                            reachable: false,
                            message: e.to_string(),
                        }
                    }
                },
                Err(e) => {
                    tracing::warn!("cluster '{}' validation failed: {}", descriptor.name, e);
                    ClusterHealth {
                        reachable: false,
                        message: e.to_string(),
                    }
                }
            };
            results.insert(descriptor.name.clone(), health);
        }

        results
    }

    /// Gather the status of every cluster, in parallel.
    ///
    /// One task per cluster; an unreachable cluster produces an offline
    /// entry and never aborts the others.
    pub async fn aggregate_status(&self) -> HashMap<String, ClusterStatus> {
        let mut tasks = Vec::new();

        for descriptor in self.snapshot.clusters() {
            let cache = self.cache.clone();
            let descriptor = descriptor.clone();
            tasks.push(tokio::spawn(async move {
                let status = Self::status_of(&cache, &descriptor).await;
                (descriptor.name, status)
            }));
        }

        let mut results = HashMap::new();
        for task in tasks {
            if let Ok((name, status)) = task.await {
                results.insert(name, status);
            }
        }
        results
    }

    /// Status of one cluster; `None` targets the default cluster.
    ///
    /// Connectivity problems degrade to an offline entry; only an unknown
    /// name is an error.
    pub async fn status(&self, cluster: Option<&str>) -> Result<ClusterStatus, DispatchError> {
        let name = cluster.unwrap_or_else(|| self.snapshot.default_cluster());
        let descriptor = self
            .snapshot
            .get(name)
            .ok_or_else(|| DispatchError::ClusterNotFound(name.to_string()))?;
        Ok(Self::status_of(&self.cache, descriptor).await)
    }

    /// Evict the cached handle for one cluster.
    pub async fn invalidate(&self, name: &str) -> bool {
        self.cache.invalidate(name).await
    }

    /// Evict every cached handle.
    pub async fn clear_cache(&self) {
        self.cache.clear().await;
    }

    async fn status_of(cache: &HandleCache, descriptor: &ClusterDescriptor) -> ClusterStatus {
        let offline = |error: String| ClusterStatus {
            cluster: descriptor.name.clone(),
            api_url: descriptor.api_url.clone(),
            metadata: descriptor.metadata.clone(),
            online: false,
            nodes: Vec::new(),
            vm_count: 0,
            lxc_count: 0,
            storage_count: 0,
            error: Some(error),
        };

        let handle = match cache.get(descriptor).await {
            Ok(handle) => handle,
            Err(e) => {
                tracing::warn!("failed to get status for cluster '{}': {}", descriptor.name, e);
                return offline(e.to_string());
            }
        };

        match handle.summary().await {
            Ok(summary) => ClusterStatus {
                cluster: descriptor.name.clone(),
                api_url: descriptor.api_url.clone(),
                metadata: descriptor.metadata.clone(),
                online: true,
                nodes: summary.nodes,
                vm_count: summary.vm_count,
                lxc_count: summary.lxc_count,
                storage_count: summary.storage_count,
                error: None,
            },
            Err(e) => {
                tracing::warn!("failed to get status for cluster '{}': {}", descriptor.name, e);
                offline(e.to_string())
            }
        }
    }
}
