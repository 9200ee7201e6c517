//! Local network deployment of a subnet blockchain.
//!
//! A deployment runs through these steps, aborting on the first failure without rolling back
//! what already happened:
//!
//! 1. validate the genesis file and derive the VM ID from the chain name
//! 2. set up the local environment (snapshot, node binary)
//! 3. probe the network, a network that was never started is not an error
//! 4. stop there if the VM is already deployed
//! 5. install the plugins of the new VM and of every running VM
//! 6. boot the network from the default snapshot if it was not running
//! 7. wait for the network, then pick a preloaded subnet
//! 8. create the blockchain and wait for the network to acknowledge it

pub mod report;
pub mod slot;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use deployer_network_client_interface::{
    BlockchainSpec, ClusterInfo, LoadSnapshotOptions, NetworkControlClient, VmId,
};
use tracing::{debug, info, info_span, warn, Instrument};

use crate::core::backend::{BackendProcess, BackendStatus};
use crate::core::context::DeployContext;
use crate::core::environment::{LocalEnv, LocalEnvironment};
use crate::core::genesis::Genesis;
use crate::core::health::{HealthError, HealthPoller};
use crate::core::plugins::{install_needed, PluginInstaller};
use crate::deploy::report::{endpoints, rpc_url, ConnectionDetails};
use crate::deploy::slot::select_subnet_slot;
use crate::error::{DeployerError, DeployerResult};

/// Settings of the network booted by the deployer.
#[derive(Debug, Clone)]
pub struct NetworkSettings {
    pub snapshot_name: String,
    /// Root directory for the node state of booted networks
    pub run_dir: PathBuf,
    /// Global node configuration (JSON) applied to every node
    pub global_node_config: Option<String>,
    pub health_check_interval: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployRequest {
    pub chain_name: String,
    pub genesis_path: PathBuf,
    pub currency_symbol: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalDeployment {
    pub subnet_id: String,
    pub blockchain_id: String,
    pub endpoints: Vec<String>,
    pub connection: ConnectionDetails,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployOutcome {
    /// A blockchain for this VM already runs on the network, nothing was changed
    AlreadyDeployed,
    Deployed(LocalDeployment),
}

pub struct LocalSubnetDeployer {
    backend: Arc<dyn BackendProcess>,
    client: Arc<dyn NetworkControlClient>,
    environment: Arc<dyn LocalEnvironment>,
    plugins: Arc<dyn PluginInstaller>,
    settings: NetworkSettings,
}

impl LocalSubnetDeployer {
    pub fn new(
        backend: Arc<dyn BackendProcess>,
        client: Arc<dyn NetworkControlClient>,
        environment: Arc<dyn LocalEnvironment>,
        plugins: Arc<dyn PluginInstaller>,
        settings: NetworkSettings,
    ) -> Self {
        Self { backend, client, environment, plugins, settings }
    }

    pub fn client(&self) -> &dyn NetworkControlClient {
        self.client.as_ref()
    }

    pub fn backend(&self) -> &dyn BackendProcess {
        self.backend.as_ref()
    }

    /// Starts the backend unless it is already running.
    pub async fn start_backend(&self) -> DeployerResult<BackendStatus> {
        if self.backend.is_running().await? {
            debug!("network runner already running");
            return Ok(BackendStatus::AlreadyRunning);
        }
        debug!("network runner is not running, starting it");
        self.backend.start().await?;
        Ok(BackendStatus::StartedHere)
    }

    /// Stops the network, then the backend.
    ///
    /// The backend is stopped even when the network could not be, the network error is returned
    /// afterwards.
    pub async fn shutdown(&self, ctx: &DeployContext) -> DeployerResult<()> {
        let network = match ctx.run(self.client.stop()).await {
            Ok(Ok(())) => {
                info!("Network stopped");
                Ok(())
            }
            Ok(Err(e)) if e.is_not_bootstrapped() => {
                debug!("network was not running");
                Ok(())
            }
            Ok(Err(e)) => Err(DeployerError::StopNetwork(e)),
            Err(e) => Err(DeployerError::Context(e)),
        };
        if let Err(e) = &network {
            warn!(error = %e, "Failed to stop the network, stopping the network runner anyway");
        }

        self.backend.stop().await?;
        network
    }

    pub async fn wait_healthy(&self, ctx: &DeployContext) -> Result<ClusterInfo, HealthError> {
        HealthPoller::new(self.client.as_ref(), self.settings.health_check_interval).wait_healthy(ctx).await
    }

    /// Deploys `request` on the local network, booting the network first if needed.
    ///
    /// The backend must already be running, see [Self::start_backend].
    pub async fn deploy(&self, ctx: &DeployContext, request: &DeployRequest) -> DeployerResult<DeployOutcome> {
        // Validated before anything touches the network
        let genesis = Genesis::load(&request.genesis_path).instrument(info_span!("deploy", step = "genesis")).await?;
        let vm_id = VmId::from_name(&request.chain_name)?;
        debug!(chain = %request.chain_name, %vm_id, chain_id = genesis.chain_id, "genesis validated");

        let env = self.environment.setup().instrument(info_span!("deploy", step = "environment")).await?;

        let (network_booted, cluster_info) =
            self.probe_network(ctx).instrument(info_span!("deploy", step = "probe")).await?;

        if cluster_info.as_ref().is_some_and(|info| info.has_vm(&vm_id)) {
            info!(chain = %request.chain_name, "Subnet has already been deployed");
            return Ok(DeployOutcome::AlreadyDeployed);
        }

        install_needed(self.plugins.as_ref(), &vm_id, cluster_info.as_ref(), &env.plugin_dir)
            .instrument(info_span!("deploy", step = "plugins"))
            .await?;
        info!("VMs ready");

        if !network_booted {
            self.start_network(ctx, &env).instrument(info_span!("deploy", step = "boot")).await?;
        }

        let info = self.wait_healthy(ctx).instrument(info_span!("deploy", step = "health")).await?;
        let subnet_id = select_subnet_slot(&info.subnets, info.custom_vms.len())?;
        debug!(%subnet_id, created = info.custom_vms.len(), pool = info.subnets.len(), "subnet selected");

        self.create_blockchain(ctx, request, &subnet_id).instrument(info_span!("deploy", step = "create")).await?;
        info!("Blockchain has been deployed, waiting until the network acknowledges it");

        let info = self.wait_healthy(ctx).instrument(info_span!("deploy", step = "confirm")).await?;

        let blockchain = info
            .blockchain_for_vm(&vm_id)
            .ok_or_else(|| DeployerError::BlockchainNotFound { vm_id: vm_id.to_string() })?;
        let first_rpc = info.node_infos.first().map(|node| rpc_url(&node.uri, &blockchain.blockchain_id));

        Ok(DeployOutcome::Deployed(LocalDeployment {
            subnet_id,
            blockchain_id: blockchain.blockchain_id.clone(),
            endpoints: endpoints(&info),
            connection: ConnectionDetails::new(first_rpc, &genesis, &request.chain_name, &request.currency_symbol),
        }))
    }

    /// Returns whether the network is booted, with its state when it is.
    async fn probe_network(&self, ctx: &DeployContext) -> DeployerResult<(bool, Option<ClusterInfo>)> {
        match self.wait_healthy(ctx).await {
            Ok(info) => Ok((true, Some(info))),
            Err(e) if e.is_not_bootstrapped() => {
                debug!("network is not bootstrapped yet");
                Ok((false, None))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn start_network(&self, ctx: &DeployContext, env: &LocalEnv) -> DeployerResult<()> {
        info!("Starting network");
        let options = LoadSnapshotOptions {
            plugin_dir: env.plugin_dir.clone(),
            exec_path: env.exec_path.clone(),
            root_data_dir: self.settings.run_dir.clone(),
            global_node_config: self.settings.global_node_config.clone(),
        };
        ctx.run(self.client.load_snapshot(&self.settings.snapshot_name, options))
            .await?
            .map_err(DeployerError::StartNetwork)?;
        Ok(())
    }

    async fn create_blockchain(
        &self,
        ctx: &DeployContext,
        request: &DeployRequest,
        subnet_id: &str,
    ) -> DeployerResult<()> {
        let spec = BlockchainSpec {
            vm_name: request.chain_name.clone(),
            genesis: request.genesis_path.clone(),
            subnet_id: Some(subnet_id.to_string()),
        };
        let info = ctx.run(self.client.create_blockchains(vec![spec])).await?.map_err(DeployerError::CreateBlockchain)?;
        debug!(?info, "create blockchains answered");
        Ok(())
    }
}
