use std::sync::Arc;

use deployer_network_runner_client::NetworkRunnerClient;
use tracing::debug;

use crate::config::DeployerConfig;
use crate::core::backend::{BackendSettings, NetworkRunnerProcess};
use crate::core::environment::ProvisionedEnvironment;
use crate::core::plugins::SubnetEvmInstaller;
use crate::core::provisioner::{BinaryProvisioner, Platform};
use crate::core::snapshot::SnapshotManager;
use crate::deploy::{LocalSubnetDeployer, NetworkSettings};
use crate::error::{DeployerError, DeployerResult};

/// Services built from the configuration.
pub struct Services {
    pub deployer: LocalSubnetDeployer,
    pub snapshots: Arc<SnapshotManager>,
}

/// Wires the production implementations together.
pub fn setup(config: &DeployerConfig, global_node_config: Option<String>) -> DeployerResult<Services> {
    let http = reqwest::Client::builder()
        .build()
        .map_err(|e| DeployerError::Config(format!("Failed to build the HTTP client: {e}")))?;

    let client = Arc::new(
        NetworkRunnerClient::new(config.gateway_url.clone(), config.request_timeout).map_err(DeployerError::Client)?,
    );
    let provisioner = Arc::new(BinaryProvisioner::new(http.clone(), Platform::current()?));
    debug!(platform = ?provisioner.platform(), gateway = %config.gateway_url, "setting up services");

    let snapshots = Arc::new(SnapshotManager::new(http, config.snapshot_url.clone(), config.snapshot_name.clone()));
    let environment = Arc::new(ProvisionedEnvironment::new(
        snapshots.clone(),
        config.snapshots_dir.clone(),
        provisioner.clone(),
        config.node.clone(),
        config.node_version.clone(),
        config.bin_dir.clone(),
    ));
    let plugins = Arc::new(SubnetEvmInstaller::new(
        provisioner.clone(),
        config.subnet_evm.clone(),
        config.subnet_evm_version.clone(),
        config.bin_dir.clone(),
    ));
    let backend = Arc::new(NetworkRunnerProcess::new(
        provisioner,
        config.network_runner.clone(),
        BackendSettings {
            version: config.network_runner_version.clone(),
            bin_dir: config.bin_dir.clone(),
            run_dir: config.run_dir.clone(),
            server_port: config.server_port,
            gateway_port: config.gateway_port,
            dial_timeout: config.dial_timeout,
        },
        client.clone(),
    ));

    let settings = NetworkSettings {
        snapshot_name: config.snapshot_name.clone(),
        run_dir: config.run_dir.clone(),
        global_node_config,
        health_check_interval: config.health_check_interval,
    };

    Ok(Services { deployer: LocalSubnetDeployer::new(backend, client, environment, plugins, settings), snapshots })
}
