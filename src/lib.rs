//! pve-dispatch Library
//!
//! Multi-cluster dispatch core for Proxmox VE: a registry of
//! independently-credentialed clusters with per-call backend selection,
//! cached live client handles, and aggregate health reporting.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

// Re-export commonly used types
pub use adapters::outbound::{ProxmoxApiClient, ProxmoxClientFactory};
pub use application::{ClusterHealth, ClusterRegistry, ClusterStatus};
pub use config::{load_config, DispatchConfig};
pub use domain::entities::{ClusterDescriptor, ClusterView, MetadataTag, RegistrySnapshot};
pub use domain::errors::DispatchError;
pub use domain::ports::{ClientError, ClientFactory, ClusterClient, ClusterSummary, NodeSummary, PingReport};
pub use domain::services::SelectionPolicy;
pub use domain::value_objects::Credentials;
pub use infrastructure::{HandleCache, DEFAULT_TTL};
