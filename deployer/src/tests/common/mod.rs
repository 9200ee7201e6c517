pub mod archives;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use deployer_network_client_interface::{ClusterInfo, CustomVmInfo, NodeInfo, VmId};
use rstest::fixture;

use crate::core::context::DeployContext;

pub const TEST_CHAIN: &str = "mychain";

pub const VALID_GENESIS: &str = r#"{
    "config": { "chainId": 99999 },
    "alloc": {
        "8db97C7cEcE249c2b98bDC0226Cc4C2A57BF52FC": { "balance": "0x52B7D2DCC80CD2E4000000" }
    }
}"#;

#[fixture]
pub fn ctx() -> DeployContext {
    DeployContext::with_timeout(Duration::from_secs(10))
}

pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

pub fn node(name: &str, port: u16) -> NodeInfo {
    NodeInfo { name: name.to_string(), uri: format!("http://127.0.0.1:{port}") }
}

pub fn custom_vm(chain: &str, subnet_id: &str, blockchain_id: &str) -> CustomVmInfo {
    CustomVmInfo {
        vm_name: chain.to_string(),
        vm_id: VmId::from_name(chain).unwrap().to_string(),
        subnet_id: subnet_id.to_string(),
        blockchain_id: blockchain_id.to_string(),
    }
}

/// A healthy network with two nodes, the given subnet pool and deployed chains.
pub fn healthy_cluster(subnets: &[&str], chains: &[(&str, &str, &str)]) -> ClusterInfo {
    ClusterInfo {
        healthy: true,
        custom_vms_healthy: true,
        node_infos: vec![node("node1", 9650), node("node2", 9652)],
        subnets: subnets.iter().map(|s| s.to_string()).collect(),
        custom_vms: chains
            .iter()
            .map(|(chain, subnet, blockchain)| (blockchain.to_string(), custom_vm(chain, subnet, blockchain)))
            .collect::<BTreeMap<_, _>>(),
    }
}
