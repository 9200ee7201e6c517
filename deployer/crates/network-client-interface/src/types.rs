use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::VmId;

/// A node of the local network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    pub name: String,
    pub uri: String,
}

/// A blockchain running a custom VM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomVmInfo {
    pub vm_name: String,
    pub vm_id: String,
    pub subnet_id: String,
    pub blockchain_id: String,
}

/// Point-in-time view of the network, as reported by the backend.
///
/// Every poll yields a fresh value, it is never patched in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterInfo {
    pub healthy: bool,
    pub custom_vms_healthy: bool,
    /// Nodes ordered by name
    pub node_infos: Vec<NodeInfo>,
    /// Subnets preloaded in the snapshot
    pub subnets: Vec<String>,
    /// Deployed custom VMs, keyed by blockchain ID
    pub custom_vms: BTreeMap<String, CustomVmInfo>,
}

impl ClusterInfo {
    /// True once the network and every custom VM report healthy in this same snapshot.
    pub fn is_ready(&self) -> bool {
        self.healthy && self.custom_vms_healthy
    }

    pub fn has_vm(&self, vm_id: &VmId) -> bool {
        self.blockchain_for_vm(vm_id).is_some()
    }

    /// Blockchain running the given VM, if any.
    pub fn blockchain_for_vm(&self, vm_id: &VmId) -> Option<&CustomVmInfo> {
        let vm_id = vm_id.to_string();
        self.custom_vms.values().find(|info| info.vm_id == vm_id)
    }

    pub fn vm_ids(&self) -> impl Iterator<Item = &str> {
        self.custom_vms.values().map(|info| info.vm_id.as_str())
    }
}

/// Request to create one blockchain on the running network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockchainSpec {
    pub vm_name: String,
    pub genesis: PathBuf,
    pub subnet_id: Option<String>,
}
