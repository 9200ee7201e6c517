use std::path::PathBuf;
use std::time::Duration;

use assert_matches::assert_matches;
use deployer_network_client_interface::{BlockchainSpec, LoadSnapshotOptions, NetworkClientError, NetworkControlClient};
use deployer_network_runner_client::NetworkRunnerClient;
use httpmock::prelude::*;
use rstest::rstest;
use serde_json::json;
use url::Url;

fn client_for(server: &MockServer) -> NetworkRunnerClient {
    NetworkRunnerClient::new(Url::parse(&server.base_url()).unwrap(), Duration::from_secs(5)).unwrap()
}

fn cluster_info_body() -> serde_json::Value {
    json!({
        "clusterInfo": {
            "nodeNames": ["node2", "node1"],
            "nodeInfos": {
                "node2": { "name": "node2", "uri": "http://127.0.0.1:9652" },
                "node1": { "name": "node1", "uri": "http://127.0.0.1:9650" }
            },
            "healthy": true,
            "customVmsHealthy": true,
            "subnets": ["subnet-b", "subnet-a"],
            "customVms": {
                "chain-1": {
                    "vmName": "mychain",
                    "vmId": "vm-1",
                    "subnetId": "subnet-a",
                    "blockchainId": "chain-1"
                }
            }
        }
    })
}

#[rstest]
#[tokio::test]
async fn health_parses_cluster_info() {
    let server = MockServer::start_async().await;
    let health = server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/control/health");
            then.status(200).json_body(cluster_info_body());
        })
        .await;

    let info = client_for(&server).health().await.unwrap().expect("cluster info should be present");

    health.assert_async().await;
    assert!(info.healthy);
    assert!(info.custom_vms_healthy);
    assert_eq!(info.node_infos.iter().map(|n| n.name.as_str()).collect::<Vec<_>>(), ["node1", "node2"]);
    assert_eq!(info.subnets, ["subnet-b", "subnet-a"]);
    assert_eq!(info.custom_vms["chain-1"].vm_id, "vm-1");
}

#[rstest]
#[tokio::test]
async fn health_without_cluster_info_is_none() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/control/health");
            then.status(200).json_body(json!({}));
        })
        .await;

    assert!(client_for(&server).health().await.unwrap().is_none());
}

#[rstest]
#[tokio::test]
async fn omitted_flags_default_to_unhealthy() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/control/health");
            then.status(200).json_body(json!({ "clusterInfo": { "healthy": true } }));
        })
        .await;

    let info = client_for(&server).health().await.unwrap().unwrap();
    assert!(info.healthy);
    assert!(!info.custom_vms_healthy);
    assert!(info.custom_vms.is_empty());
}

#[rstest]
#[tokio::test]
async fn not_bootstrapped_network_is_a_distinct_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/control/health");
            then.status(500).json_body(json!({ "code": 2, "message": "not bootstrapped", "details": [] }));
        })
        .await;

    let err = client_for(&server).health().await.unwrap_err();
    assert_matches!(err, NetworkClientError::NotBootstrapped);
}

#[rstest]
#[tokio::test]
async fn load_snapshot_sends_options() {
    let server = MockServer::start_async().await;
    let load = server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/control/loadsnapshot").json_body(json!({
                "snapshotName": "default-1654102509",
                "execPath": "/bin/avalanchego-v1.7.14/avalanchego",
                "pluginDir": "/bin/avalanchego-v1.7.14/plugins",
                "rootDataDir": "/runs",
                "globalNodeConfig": "{\"log-level\":\"info\"}"
            }));
            then.status(200).json_body(cluster_info_body());
        })
        .await;

    let options = LoadSnapshotOptions {
        plugin_dir: PathBuf::from("/bin/avalanchego-v1.7.14/plugins"),
        exec_path: PathBuf::from("/bin/avalanchego-v1.7.14/avalanchego"),
        root_data_dir: PathBuf::from("/runs"),
        global_node_config: Some(r#"{"log-level":"info"}"#.to_string()),
    };
    client_for(&server).load_snapshot("default-1654102509", options).await.unwrap();

    load.assert_async().await;
}

#[rstest]
#[tokio::test]
async fn create_blockchains_sends_specs() {
    let server = MockServer::start_async().await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/control/createblockchains").json_body(json!({
                "blockchainSpecs": [
                    { "vmName": "mychain", "genesis": "/tmp/genesis.json", "subnetId": "subnet-a" }
                ]
            }));
            then.status(200).json_body(cluster_info_body());
        })
        .await;

    let specs = vec![BlockchainSpec {
        vm_name: "mychain".to_string(),
        genesis: PathBuf::from("/tmp/genesis.json"),
        subnet_id: Some("subnet-a".to_string()),
    }];
    let info = client_for(&server).create_blockchains(specs).await.unwrap();

    create.assert_async().await;
    assert!(info.is_some());
}

#[rstest]
#[tokio::test]
async fn ping_returns_backend_pid() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/ping");
            then.status(200).json_body(json!({ "pid": 4242 }));
        })
        .await;

    assert_eq!(client_for(&server).ping().await.unwrap(), 4242);
}

#[rstest]
#[tokio::test]
async fn unreachable_backend_is_a_transport_error() {
    // Nothing listens on the discard port
    let client = NetworkRunnerClient::new(Url::parse("http://127.0.0.1:9").unwrap(), Duration::from_secs(2)).unwrap();

    assert_matches!(client.health().await, Err(NetworkClientError::Transport(_)));
}
