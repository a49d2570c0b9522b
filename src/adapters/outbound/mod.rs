mod proxmox_client;

pub use proxmox_client::{ProxmoxApiClient, ProxmoxClientFactory};
