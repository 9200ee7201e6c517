use std::collections::BTreeMap;

use deployer_network_client_interface::{ClusterInfo, CustomVmInfo, NodeInfo};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(crate) struct EmptyRequest {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoadSnapshotRequest {
    pub snapshot_name: String,
    pub exec_path: String,
    pub plugin_dir: String,
    pub root_data_dir: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_node_config: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateBlockchainsRequest {
    pub blockchain_specs: Vec<WireBlockchainSpec>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireBlockchainSpec {
    pub vm_name: String,
    pub genesis: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnet_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PingResponse {
    #[serde(default)]
    pub pid: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ClusterInfoResponse {
    #[serde(default)]
    pub cluster_info: Option<WireClusterInfo>,
}

/// Default-valued fields are omitted by the gateway, so everything defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct WireClusterInfo {
    pub node_infos: BTreeMap<String, WireNodeInfo>,
    pub healthy: bool,
    pub custom_vms_healthy: bool,
    pub subnets: Vec<String>,
    pub custom_vms: BTreeMap<String, WireCustomVmInfo>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct WireNodeInfo {
    pub name: String,
    pub uri: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct WireCustomVmInfo {
    pub vm_name: String,
    pub vm_id: String,
    pub subnet_id: String,
    pub blockchain_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GatewayError {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

impl From<WireClusterInfo> for ClusterInfo {
    fn from(wire: WireClusterInfo) -> Self {
        // node_infos is keyed by node name, so the BTreeMap already yields nodes ordered by name
        let node_infos = wire
            .node_infos
            .into_iter()
            .map(|(key, node)| NodeInfo { name: if node.name.is_empty() { key } else { node.name }, uri: node.uri })
            .collect();

        let custom_vms = wire
            .custom_vms
            .into_iter()
            .map(|(blockchain_id, vm)| {
                let info = CustomVmInfo {
                    vm_name: vm.vm_name,
                    vm_id: vm.vm_id,
                    subnet_id: vm.subnet_id,
                    blockchain_id: if vm.blockchain_id.is_empty() { blockchain_id.clone() } else { vm.blockchain_id },
                };
                (blockchain_id, info)
            })
            .collect();

        ClusterInfo {
            healthy: wire.healthy,
            custom_vms_healthy: wire.custom_vms_healthy,
            node_infos,
            subnets: wire.subnets,
            custom_vms,
        }
    }
}
