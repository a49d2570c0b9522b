//! Integration tests for the Proxmox API adapter with Wiremock
//!
//! Exercises construction probing, token-header authentication and status
//! summaries against mock servers.

use pve_dispatch::{
    ClientFactory, ClusterClient, ClusterDescriptor, Credentials, DispatchError,
    ProxmoxClientFactory,
};
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn descriptor(api_url: &str) -> ClusterDescriptor {
    ClusterDescriptor {
        name: "prod".to_string(),
        api_url: api_url.to_string(),
        credentials: Credentials::new("root@pam!mcp", "secret").unwrap(),
        verify_tls: true,
        default_node: None,
        default_storage: None,
        default_bridge: None,
        metadata: Vec::new(),
        name_patterns: Vec::new(),
    }
}

fn nodes_body() -> serde_json::Value {
    serde_json::json!({
        "data": [
            {"node": "pve1", "status": "online"},
            {"node": "pve2", "status": "online"}
        ]
    })
}

/// Construction probes the cluster and yields a working handle.
#[tokio::test]
async fn test_construct_and_ping() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api2/json/nodes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(nodes_body()))
        .mount(&server)
        .await;

    let factory = ProxmoxClientFactory::default();
    let handle = factory.construct(&descriptor(&server.uri())).await.unwrap();

    let report = handle.ping().await.unwrap();
    assert_eq!(report.node_count, 2);
}

/// Every request carries the API token authorization header.
#[tokio::test]
async fn test_requests_send_token_header() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api2/json/nodes"))
        .and(header("Authorization", "PVEAPIToken=root@pam!mcp=secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(nodes_body()))
        .expect(1..)
        .mount(&server)
        .await;

    let factory = ProxmoxClientFactory::default();
    factory.construct(&descriptor(&server.uri())).await.unwrap();
}

/// A rejected token surfaces as a connection error naming the cluster.
#[tokio::test]
async fn test_construct_fails_on_auth_rejection() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api2/json/nodes"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let factory = ProxmoxClientFactory::default();
    let err = factory
        .construct(&descriptor(&server.uri()))
        .await
        .unwrap_err();

    match err {
        DispatchError::Connection { cluster, reason } => {
            assert_eq!(cluster, "prod");
            assert!(reason.contains("401"));
        }
        other => panic!("expected Connection, got {:?}", other),
    }
}

/// An endpoint nobody listens on fails construction eagerly.
#[tokio::test]
async fn test_construct_fails_when_unreachable() {
    let factory = ProxmoxClientFactory::new(Duration::from_millis(500));
    let err = factory
        .construct(&descriptor("http://127.0.0.1:1"))
        .await
        .unwrap_err();

    assert!(matches!(err, DispatchError::Connection { .. }));
}

/// A cluster slower than the request timeout fails construction.
#[tokio::test]
async fn test_construct_fails_on_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api2/json/nodes"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(nodes_body())
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let factory = ProxmoxClientFactory::new(Duration::from_millis(100));
    let err = factory
        .construct(&descriptor(&server.uri()))
        .await
        .unwrap_err();

    assert!(matches!(err, DispatchError::Connection { .. }));
}

/// The summary counts guests by type and storages by entry.
#[tokio::test]
async fn test_summary_counts() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api2/json/nodes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(nodes_body()))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api2/json/cluster/resources"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [
                {"type": "qemu", "vmid": 100},
                {"type": "qemu", "vmid": 101},
                {"type": "qemu", "vmid": 102},
                {"type": "lxc", "vmid": 200},
                {"type": "node", "node": "pve1"}
            ]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api2/json/storage"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [
                {"storage": "local"},
                {"storage": "ceph-pool"}
            ]
        })))
        .mount(&server)
        .await;

    let factory = ProxmoxClientFactory::default();
    let handle = factory.construct(&descriptor(&server.uri())).await.unwrap();

    let summary = handle.summary().await.unwrap();
    assert_eq!(summary.nodes.len(), 2);
    assert_eq!(summary.nodes[0].name, "pve1");
    assert_eq!(summary.nodes[0].status, "online");
    assert_eq!(summary.vm_count, 3);
    assert_eq!(summary.lxc_count, 1);
    assert_eq!(summary.storage_count, 2);
}

/// A response without the `data` envelope is a decode failure, reported as
/// a connection error at construction time.
#[tokio::test]
async fn test_missing_data_envelope() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api2/json/nodes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
        .mount(&server)
        .await;

    let factory = ProxmoxClientFactory::default();
    let err = factory
        .construct(&descriptor(&server.uri()))
        .await
        .unwrap_err();

    match err {
        DispatchError::Connection { reason, .. } => {
            assert!(reason.contains("data"));
        }
        other => panic!("expected Connection, got {:?}", other),
    }
}

/// Nodes reported without a status field degrade to "unknown".
#[tokio::test]
async fn test_node_status_defaults_to_unknown() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api2/json/nodes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [{"node": "pve1"}]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api2/json/cluster/resources"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": []})))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api2/json/storage"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": []})))
        .mount(&server)
        .await;

    let factory = ProxmoxClientFactory::default();
    let handle = factory.construct(&descriptor(&server.uri())).await.unwrap();

    let summary = handle.summary().await.unwrap();
    assert_eq!(summary.nodes[0].status, "unknown");
}
