use clap::Args;
use std::path::PathBuf;
use url::Url;

use crate::utils::constants::{
    BOOTSTRAP_SNAPSHOT_URL, DEFAULT_NETWORK_RUNNER_RELEASE_URL, DEFAULT_NETWORK_RUNNER_VERSION,
    DEFAULT_NODE_RELEASE_URL, DEFAULT_NODE_VERSION, DEFAULT_SNAPSHOT_NAME, DEFAULT_SUBNET_EVM_RELEASE_URL,
    DEFAULT_SUBNET_EVM_VERSION,
};

/// Parameters of the local environment: where things live and which releases to install.
#[derive(Debug, Clone, Args)]
#[group()]
pub struct EnvironmentCliArgs {
    /// Base directory for binaries, snapshots and runs. Defaults to `~/.avalanche-cli`.
    #[arg(env = "SUBNET_DEPLOYER_BASE_DIR", long, value_name = "PATH")]
    pub base_dir: Option<PathBuf>,

    /// Node release to install.
    #[arg(env = "SUBNET_DEPLOYER_NODE_VERSION", long, default_value = DEFAULT_NODE_VERSION)]
    pub node_version: String,

    /// Network runner release to install.
    #[arg(env = "SUBNET_DEPLOYER_NETWORK_RUNNER_VERSION", long, default_value = DEFAULT_NETWORK_RUNNER_VERSION)]
    pub network_runner_version: String,

    /// subnet-evm release installed as VM plugin.
    #[arg(env = "SUBNET_DEPLOYER_SUBNET_EVM_VERSION", long, default_value = DEFAULT_SUBNET_EVM_VERSION)]
    pub subnet_evm_version: String,

    /// Releases page of the node.
    #[arg(env = "SUBNET_DEPLOYER_NODE_RELEASE_URL", long, default_value = DEFAULT_NODE_RELEASE_URL)]
    pub node_release_url: Url,

    /// Releases page of the network runner.
    #[arg(env = "SUBNET_DEPLOYER_NETWORK_RUNNER_RELEASE_URL", long, default_value = DEFAULT_NETWORK_RUNNER_RELEASE_URL)]
    pub network_runner_release_url: Url,

    /// Releases page of subnet-evm.
    #[arg(env = "SUBNET_DEPLOYER_SUBNET_EVM_RELEASE_URL", long, default_value = DEFAULT_SUBNET_EVM_RELEASE_URL)]
    pub subnet_evm_release_url: Url,

    /// Bootstrap snapshot archive.
    #[arg(env = "SUBNET_DEPLOYER_SNAPSHOT_URL", long, default_value = BOOTSTRAP_SNAPSHOT_URL)]
    pub snapshot_url: Url,

    /// Name of the snapshot networks are booted from.
    #[arg(env = "SUBNET_DEPLOYER_SNAPSHOT_NAME", long, default_value = DEFAULT_SNAPSHOT_NAME)]
    pub snapshot_name: String,
}
