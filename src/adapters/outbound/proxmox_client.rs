//! Proxmox API Client
//!
//! Outbound adapter implementing the cluster client ports over the Proxmox
//! VE REST API. Authentication uses API tokens
//! (`Authorization: PVEAPIToken=user@realm!name=secret`); every request runs
//! under the factory's bounded timeout.

use crate::domain::entities::ClusterDescriptor;
use crate::domain::errors::DispatchError;
use crate::domain::ports::{
    ClientError, ClientFactory, ClusterClient, ClusterSummary, NodeSummary, PingReport,
};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

/// Default per-request timeout for cluster API calls.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Builds [`ProxmoxApiClient`] handles from descriptors.
///
/// Construction probes the cluster once so an unreachable endpoint fails
/// eagerly with a `Connection` error instead of surfacing later on first
/// use.
pub struct ProxmoxClientFactory {
    request_timeout: Duration,
}

impl ProxmoxClientFactory {
    /// Create a factory with a per-request timeout.
    pub fn new(request_timeout: Duration) -> Self {
        Self { request_timeout }
    }
}

impl Default for ProxmoxClientFactory {
    fn default() -> Self {
        Self::new(DEFAULT_REQUEST_TIMEOUT)
    }
}

#[async_trait]
impl ClientFactory for ProxmoxClientFactory {
    async fn construct(
        &self,
        descriptor: &ClusterDescriptor,
    ) -> Result<Arc<dyn ClusterClient>, DispatchError> {
        let connection = |reason: String| DispatchError::Connection {
            cluster: descriptor.name.clone(),
            reason,
        };

        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&descriptor.credentials.header_value())
            .map_err(|e| connection(format!("invalid token material: {}", e)))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .timeout(self.request_timeout)
            .danger_accept_invalid_certs(!descriptor.verify_tls)
            .default_headers(headers)
            .build()
            .map_err(|e| connection(format!("client error: {}", e)))?;

        let client = ProxmoxApiClient {
            cluster: descriptor.name.clone(),
            base_url: base_url(&descriptor.api_url),
            http,
        };

        // Eager probe: a handle that cannot reach its cluster is useless
        client
            .ping()
            .await
            .map_err(|e| connection(e.to_string()))?;

        tracing::debug!(
            "constructed client for cluster '{}' at {}",
            descriptor.name,
            client.base_url
        );

        Ok(Arc::new(client))
    }
}

/// Live client bound to one Proxmox cluster.
#[derive(Debug)]
pub struct ProxmoxApiClient {
    cluster: String,
    base_url: String,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct NodeEntry {
    node: String,
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResourceEntry {
    #[serde(rename = "type")]
    kind: String,
}

impl ProxmoxApiClient {
    /// GET an API path and unwrap the `data` envelope every Proxmox
    /// response carries.
    async fn get_data(&self, path: &str) -> Result<serde_json::Value, ClientError> {
        let url = format!("{}/api2/json{}", self.base_url, path);
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ClientError::Request(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            tracing::debug!(
                "cluster '{}' answered {} for {}",
                self.cluster,
                status,
                path
            );
            return Err(ClientError::Status(status.as_u16()));
        }

        let body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))?;
        body.get("data")
            .cloned()
            .ok_or_else(|| ClientError::Decode("missing 'data' envelope".to_string()))
    }

    async fn nodes(&self) -> Result<Vec<NodeSummary>, ClientError> {
        let data = self.get_data("/nodes").await?;
        let entries: Vec<NodeEntry> =
            serde_json::from_value(data).map_err(|e| ClientError::Decode(e.to_string()))?;
        Ok(entries
            .into_iter()
            .map(|n| NodeSummary {
                name: n.node,
                status: n.status.unwrap_or_else(|| "unknown".to_string()),
            })
            .collect())
    }
}

#[async_trait]
impl ClusterClient for ProxmoxApiClient {
    async fn ping(&self) -> Result<PingReport, ClientError> {
        let nodes = self.nodes().await?;
        Ok(PingReport {
            node_count: nodes.len(),
        })
    }

    async fn summary(&self) -> Result<ClusterSummary, ClientError> {
        let (nodes, resources, storage) = tokio::join!(
            self.nodes(),
            self.get_data("/cluster/resources"),
            self.get_data("/storage"),
        );

        let nodes = nodes?;
        let resources: Vec<ResourceEntry> = serde_json::from_value(resources?)
            .map_err(|e| ClientError::Decode(e.to_string()))?;
        let storage_count = storage?.as_array().map(Vec::len).unwrap_or(0);

        let (vm_count, lxc_count) = count_guests(&resources);

        Ok(ClusterSummary {
            nodes,
            vm_count,
            lxc_count,
            storage_count,
        })
    }
}

/// Strip trailing slashes and an optional `/api2/json` suffix so both
/// `https://host:8006` and `https://host:8006/api2/json/` work as
/// configured endpoints.
fn base_url(raw: &str) -> String {
    raw.trim_end_matches('/')
        .trim_end_matches("/api2/json")
        .trim_end_matches('/')
        .to_string()
}

fn count_guests(resources: &[ResourceEntry]) -> (usize, usize) {
    let vm_count = resources.iter().filter(|r| r.kind == "qemu").count();
    let lxc_count = resources.iter().filter(|r| r.kind == "lxc").count();
    (vm_count, lxc_count)
}
