//! Selection Policy Service
//!
//! Pure domain logic for deciding which cluster a call targets.
//! This service has NO state and NO external dependencies.

use crate::domain::entities::RegistrySnapshot;
use crate::domain::errors::DispatchError;

/// Cluster selection policy.
///
/// Priority order, mirroring what an operator expects:
/// 1. Explicit cluster name - must exist, wins unconditionally
/// 2. Resource-name prefix patterns - exactly one matching cluster wins,
///    several matching clusters is a configuration bug and surfaces as an
///    error, zero matches falls through
/// 3. Naming convention `{cluster}-{rest}` on the resource name
/// 4. The snapshot's default cluster
///
/// Patterns are plain prefixes, never regular expressions, so a selection
/// costs O(clusters x patterns) with no backtracking.
pub struct SelectionPolicy;

impl SelectionPolicy {
    /// Select the target cluster for a call.
    ///
    /// # Arguments
    /// * `snapshot` - The configured cluster table
    /// * `explicit` - Explicit cluster name, if the caller gave one
    /// * `resource` - Resource name (VM/container) for pattern routing
    ///
    /// # Returns
    /// The selected cluster name, or a typed failure.
    pub fn select(
        snapshot: &RegistrySnapshot,
        explicit: Option<&str>,
        resource: Option<&str>,
    ) -> Result<String, DispatchError> {
        // Priority 1: explicit cluster name
        if let Some(name) = explicit {
            if !snapshot.contains(name) {
                return Err(DispatchError::ClusterNotFound(name.to_string()));
            }
            tracing::debug!("cluster selected explicitly: {}", name);
            return Ok(name.to_string());
        }

        // Priority 2: pattern match on the resource name
        if let Some(resource) = resource {
            let candidates = Self::match_resource(snapshot, resource);
            match candidates.len() {
                0 => {}
                1 => {
                    tracing::debug!(
                        "cluster selected by resource name pattern: {}",
                        candidates[0]
                    );
                    return Ok(candidates[0].clone());
                }
                _ => {
                    return Err(DispatchError::AmbiguousSelection {
                        resource: resource.to_string(),
                        candidates,
                    });
                }
            }

            // Priority 3: naming convention {cluster}-{resource_type}-{id},
            // e.g. "prod-vm-web01" targets a cluster named "prod"
            if let Some(prefix) = resource.split('-').next() {
                if snapshot.contains(prefix) {
                    tracing::debug!("cluster selected by naming convention: {}", prefix);
                    return Ok(prefix.to_string());
                }
            }
        }

        // Priority 4: default cluster
        tracing::debug!("using default cluster: {}", snapshot.default_cluster());
        Ok(snapshot.default_cluster().to_string())
    }

    /// Clusters whose patterns prefix-match the resource name.
    ///
    /// Deduplicated by cluster: several patterns of one cluster matching the
    /// same input is not ambiguity. Order follows the snapshot.
    fn match_resource(snapshot: &RegistrySnapshot, resource: &str) -> Vec<String> {
        let ignore_case = snapshot.patterns_ignore_case();
        let folded = if ignore_case {
            resource.to_lowercase()
        } else {
            resource.to_string()
        };

        let mut matched = Vec::new();
        for cluster in snapshot.clusters() {
            let hit = cluster.name_patterns.iter().any(|p| {
                if ignore_case {
                    folded.starts_with(&p.to_lowercase())
                } else {
                    folded.starts_with(p.as_str())
                }
            });
            if hit && !matched.contains(&cluster.name) {
                matched.push(cluster.name.clone());
            }
        }
        matched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{ClusterDescriptor, RegistrySnapshot};
    use crate::domain::value_objects::Credentials;

    fn descriptor(name: &str, patterns: &[&str]) -> ClusterDescriptor {
        ClusterDescriptor {
            name: name.to_string(),
            api_url: format!("https://{}.example:8006", name),
            credentials: Credentials::new("root@pam!mcp", "secret").unwrap(),
            verify_tls: true,
            default_node: None,
            default_storage: None,
            default_bridge: None,
            metadata: Vec::new(),
            name_patterns: patterns.iter().map(|p| p.to_string()).collect(),
        }
    }

    fn snapshot() -> RegistrySnapshot {
        RegistrySnapshot::new(vec![
            descriptor("prod", &["prod-"]),
            descriptor("stage", &["stage-"]),
        ])
    }

    // ===== Explicit Selection Tests =====

    #[test]
    fn test_explicit_wins() {
        let selected = SelectionPolicy::select(&snapshot(), Some("stage"), None).unwrap();
        assert_eq!(selected, "stage");
    }

    #[test]
    fn test_explicit_beats_resource_pattern() {
        // Explicit selection ignores the resource name entirely
        let selected =
            SelectionPolicy::select(&snapshot(), Some("stage"), Some("prod-web01")).unwrap();
        assert_eq!(selected, "stage");
    }

    #[test]
    fn test_explicit_unknown_fails() {
        let err = SelectionPolicy::select(&snapshot(), Some("dev"), None).unwrap_err();
        assert!(matches!(err, DispatchError::ClusterNotFound(name) if name == "dev"));
    }

    // ===== Pattern Selection Tests =====

    #[test]
    fn test_single_pattern_match() {
        let selected = SelectionPolicy::select(&snapshot(), None, Some("prod-web01")).unwrap();
        assert_eq!(selected, "prod");

        let selected = SelectionPolicy::select(&snapshot(), None, Some("stage-db02")).unwrap();
        assert_eq!(selected, "stage");
    }

    #[test]
    fn test_overlapping_patterns_are_ambiguous() {
        let snap = RegistrySnapshot::new(vec![
            descriptor("prod", &["prod-"]),
            descriptor("legacy", &["prod"]),
        ]);

        let err = SelectionPolicy::select(&snap, None, Some("prod-db")).unwrap_err();
        match err {
            DispatchError::AmbiguousSelection { resource, candidates } => {
                assert_eq!(resource, "prod-db");
                assert_eq!(candidates, vec!["prod".to_string(), "legacy".to_string()]);
            }
            other => panic!("expected AmbiguousSelection, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_patterns_same_cluster_not_ambiguous() {
        // Two patterns of the same cluster matching one input is fine
        let snap = RegistrySnapshot::new(vec![
            descriptor("prod", &["prod-", "prod"]),
            descriptor("stage", &["stage-"]),
        ]);
        let selected = SelectionPolicy::select(&snap, None, Some("prod-db")).unwrap();
        assert_eq!(selected, "prod");
    }

    #[test]
    fn test_patterns_case_sensitive_by_default() {
        let selected = SelectionPolicy::select(&snapshot(), None, Some("PROD-web01")).unwrap();
        // No pattern match, no convention match -> default
        assert_eq!(selected, "prod");

        let snap = RegistrySnapshot::new(vec![
            descriptor("stage", &["stage-"]),
            descriptor("prod", &["prod-"]),
        ]);
        // Default is "stage" here, so a case mismatch is observable
        let selected = SelectionPolicy::select(&snap, None, Some("PROD-web01")).unwrap();
        assert_eq!(selected, "stage");
    }

    #[test]
    fn test_patterns_ignore_case_when_configured() {
        let snap = RegistrySnapshot::new(vec![
            descriptor("stage", &["stage-"]),
            descriptor("prod", &["PROD-"]),
        ])
        .with_ignore_case(true);

        let selected = SelectionPolicy::select(&snap, None, Some("prod-web01")).unwrap();
        assert_eq!(selected, "prod");
    }

    // ===== Convention Fallback Tests =====

    #[test]
    fn test_convention_fallback_on_cluster_name_prefix() {
        // No patterns configured at all; "prod-vm-web01" still routes to
        // the cluster named "prod" via the naming convention
        let snap = RegistrySnapshot::new(vec![
            descriptor("stage", &[]),
            descriptor("prod", &[]),
        ]);
        let selected = SelectionPolicy::select(&snap, None, Some("prod-vm-web01")).unwrap();
        assert_eq!(selected, "prod");
    }

    #[test]
    fn test_convention_does_not_shadow_pattern_ambiguity() {
        // Pattern ambiguity must surface even if the convention would have
        // picked a single cluster
        let snap = RegistrySnapshot::new(vec![
            descriptor("prod", &["prod-"]),
            descriptor("legacy", &["prod-"]),
        ]);
        let err = SelectionPolicy::select(&snap, None, Some("prod-db")).unwrap_err();
        assert!(matches!(err, DispatchError::AmbiguousSelection { .. }));
    }

    // ===== Default Fallback Tests =====

    #[test]
    fn test_no_input_selects_default() {
        let selected = SelectionPolicy::select(&snapshot(), None, None).unwrap();
        assert_eq!(selected, "prod");
    }

    #[test]
    fn test_unmatched_resource_selects_default() {
        let selected = SelectionPolicy::select(&snapshot(), None, Some("unmatched-x")).unwrap();
        assert_eq!(selected, "prod");
    }
}
