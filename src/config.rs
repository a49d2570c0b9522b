//! Configuration
//!
//! Builds the registry snapshot from `PROXMOX_*` environment variables.
//! Two modes: multi-cluster (`PROXMOX_CLUSTERS` plus per-cluster variables)
//! and the single-cluster fallback (`PROXMOX_API_URL` and friends). The
//! loader is the one place that validates identities, URLs and token
//! formats; the registry trusts its output.

use crate::domain::entities::{ClusterDescriptor, MetadataTag, RegistrySnapshot};
use crate::domain::value_objects::Credentials;
use anyhow::{bail, Context};
use std::collections::HashMap;
use std::time::Duration;

/// Everything the composition root needs to build a registry.
#[derive(Debug)]
pub struct DispatchConfig {
    pub snapshot: RegistrySnapshot,
    /// Process-wide handle cache TTL
    pub cache_ttl: Duration,
    /// Whether the embedding process should probe all clusters at startup
    pub validate_on_start: bool,
}

/// Load configuration from the process environment.
pub fn load_config() -> anyhow::Result<DispatchConfig> {
    load_from(&std::env::vars().collect())
}

/// Load configuration from an explicit variable map.
///
/// Factored out of [`load_config`] so tests never mutate process-global
/// environment state.
pub fn load_from(vars: &HashMap<String, String>) -> anyhow::Result<DispatchConfig> {
    let clusters = match get(vars, "PROXMOX_CLUSTERS") {
        Some(list) => read_multi_cluster(vars, &list)?,
        None => vec![read_single_cluster(vars)?],
    };

    let mut clusters = clusters;
    apply_patterns(vars, &mut clusters);

    let cache_ttl = get(vars, "PROXMOX_CLUSTER_CACHE_TTL")
        .and_then(|v| v.parse().ok())
        .unwrap_or(3600);

    let ignore_case = truthy(get(vars, "PROXMOX_CLUSTER_PATTERNS_IGNORE_CASE"), false);
    let validate_on_start = truthy(get(vars, "PROXMOX_CLUSTER_VALIDATION"), true);

    let snapshot = RegistrySnapshot::new(clusters).with_ignore_case(ignore_case);

    tracing::info!(
        "loaded {} cluster(s), default '{}', cache ttl {}s",
        snapshot.len(),
        snapshot.default_cluster(),
        cache_ttl
    );

    Ok(DispatchConfig {
        snapshot,
        cache_ttl: Duration::from_secs(cache_ttl),
        validate_on_start,
    })
}

/// Read the cluster list declared in `PROXMOX_CLUSTERS`.
///
/// The first listed cluster becomes the default. Duplicate names are a
/// configuration error; downstream code relies on identity uniqueness.
fn read_multi_cluster(
    vars: &HashMap<String, String>,
    list: &str,
) -> anyhow::Result<Vec<ClusterDescriptor>> {
    let names: Vec<&str> = list
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    if names.is_empty() {
        bail!("PROXMOX_CLUSTERS is empty");
    }

    let mut clusters: Vec<ClusterDescriptor> = Vec::with_capacity(names.len());
    for name in names {
        if clusters.iter().any(|c| c.name == name) {
            bail!("duplicate cluster name in PROXMOX_CLUSTERS: {}", name);
        }
        clusters.push(read_cluster(vars, name)?);
    }
    Ok(clusters)
}

/// Read one cluster from its `PROXMOX_CLUSTER_<name>_*` variables.
fn read_cluster(vars: &HashMap<String, String>, name: &str) -> anyhow::Result<ClusterDescriptor> {
    let prefix = format!("PROXMOX_CLUSTER_{}_", name);
    let var = |suffix: &str| get(vars, &format!("{}{}", prefix, suffix));

    let api_url = var("API_URL")
        .with_context(|| format!("missing {}API_URL for cluster '{}'", prefix, name))?;
    let token_id = var("TOKEN_ID").with_context(|| {
        format!(
            "missing {}TOKEN_ID for cluster '{}' (format: user@realm!tokenname)",
            prefix, name
        )
    })?;
    let token_secret = var("TOKEN_SECRET")
        .with_context(|| format!("missing {}TOKEN_SECRET for cluster '{}'", prefix, name))?;

    build_descriptor(
        name,
        &api_url,
        &token_id,
        token_secret,
        truthy(var("VERIFY"), true),
        var("DEFAULT_NODE"),
        var("DEFAULT_STORAGE"),
        var("DEFAULT_BRIDGE"),
        var("REGION"),
        var("TIER"),
    )
}

/// Single-cluster fallback reading the legacy unprefixed variables.
fn read_single_cluster(vars: &HashMap<String, String>) -> anyhow::Result<ClusterDescriptor> {
    let api_url = get(vars, "PROXMOX_API_URL").context("missing PROXMOX_API_URL")?;
    let token_id = get(vars, "PROXMOX_TOKEN_ID")
        .context("missing PROXMOX_TOKEN_ID (format: user@realm!tokenname)")?;
    let token_secret =
        get(vars, "PROXMOX_TOKEN_SECRET").context("missing PROXMOX_TOKEN_SECRET")?;

    build_descriptor(
        "default",
        &api_url,
        &token_id,
        token_secret,
        truthy(get(vars, "PROXMOX_VERIFY"), true),
        get(vars, "PROXMOX_DEFAULT_NODE"),
        get(vars, "PROXMOX_DEFAULT_STORAGE"),
        get(vars, "PROXMOX_DEFAULT_BRIDGE"),
        None,
        None,
    )
}

#[allow(clippy::too_many_arguments)]
fn build_descriptor(
    name: &str,
    api_url: &str,
    token_id: &str,
    token_secret: String,
    verify_tls: bool,
    default_node: Option<String>,
    default_storage: Option<String>,
    default_bridge: Option<String>,
    region: Option<String>,
    tier: Option<String>,
) -> anyhow::Result<ClusterDescriptor> {
    let credentials = Credentials::new(token_id, token_secret).with_context(|| {
        format!(
            "invalid token id for cluster '{}': expected user@realm!tokenname",
            name
        )
    })?;

    let mut metadata = Vec::new();
    if let Some(region) = region {
        metadata.push(MetadataTag::new("region", region));
    }
    if let Some(tier) = tier {
        metadata.push(MetadataTag::new("tier", tier));
    }

    Ok(ClusterDescriptor {
        name: name.to_string(),
        api_url: normalize_api_url(api_url)
            .with_context(|| format!("invalid API URL for cluster '{}'", name))?,
        credentials,
        verify_tls,
        default_node,
        default_storage,
        default_bridge,
        metadata,
        name_patterns: Vec::new(),
    })
}

/// Attach `PROXMOX_CLUSTER_PATTERNS` entries to their clusters.
///
/// Format: `"prod-:prod,staging-:stage"` (pattern, colon, cluster name).
/// Entries naming unknown clusters are dropped with a warning rather than
/// failing the whole load.
fn apply_patterns(vars: &HashMap<String, String>, clusters: &mut [ClusterDescriptor]) {
    let Some(patterns) = get(vars, "PROXMOX_CLUSTER_PATTERNS") else {
        return;
    };

    for pair in patterns.split(',') {
        let Some((pattern, cluster)) = pair.split_once(':') else {
            tracing::warn!("ignoring malformed cluster pattern entry: {}", pair.trim());
            continue;
        };
        let (pattern, cluster) = (pattern.trim(), cluster.trim());
        if pattern.is_empty() {
            continue;
        }

        match clusters.iter_mut().find(|c| c.name == cluster) {
            Some(descriptor) => descriptor.name_patterns.push(pattern.to_string()),
            None => {
                tracing::warn!(
                    "ignoring pattern '{}' for unknown cluster '{}'",
                    pattern,
                    cluster
                );
            }
        }
    }
}

/// Canonical API base URL: scheme, host and port, path stripped.
///
/// Accepts `https://host:8006`, `https://host:8006/api2/json` and
/// `https://host` (port defaults to 8006).
fn normalize_api_url(raw: &str) -> anyhow::Result<String> {
    let url = reqwest::Url::parse(raw).with_context(|| format!("cannot parse '{}'", raw))?;

    let scheme = url.scheme();
    if scheme != "http" && scheme != "https" {
        bail!("unsupported scheme '{}' in '{}'", scheme, raw);
    }
    let host = url
        .host_str()
        .with_context(|| format!("missing host in '{}'", raw))?;
    let port = explicit_port(raw).or(url.port()).unwrap_or(8006);

    Ok(format!("{}://{}:{}", scheme, host, port))
}

/// Port as literally written in the URL authority.
///
/// The url crate strips scheme-default ports on parse, so an explicit
/// `https://host:443` would otherwise be re-defaulted to 8006.
fn explicit_port(raw: &str) -> Option<u16> {
    let rest = raw.split("://").nth(1)?;
    let authority = rest.split(['/', '?', '#']).next()?;
    let (_, port) = authority.rsplit_once(':')?;
    port.parse().ok()
}

/// Trimmed, non-empty variable lookup.
fn get(vars: &HashMap<String, String>, key: &str) -> Option<String> {
    vars.get(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Truthy string parsing: `1, true, yes, y, on` (any case).
fn truthy(value: Option<String>, default: bool) -> bool {
    match value {
        None => default,
        Some(v) => matches!(
            v.to_lowercase().as_str(),
            "1" | "true" | "yes" | "y" | "on"
        ),
    }
}
