use deployer_network_client_interface::{NetworkClientError, VmIdError};
use thiserror::Error;

use crate::core::backend::BackendError;
use crate::core::context::ContextError;
use crate::core::environment::EnvironmentError;
use crate::core::genesis::GenesisError;
use crate::core::health::HealthError;
use crate::core::plugins::PluginError;
use crate::core::provisioner::ProvisionError;
use crate::core::snapshot::SnapshotError;

/// Result type for deployer operations
pub type DeployerResult<T> = Result<T, DeployerError>;

/// Error types for the deployer
#[derive(Error, Debug)]
pub enum DeployerError {
    #[error("Failed querying or starting the network runner backend: {0}")]
    Backend(#[from] BackendError),

    #[error("Invalid chain genesis: {0}")]
    Genesis(#[from] GenesisError),

    #[error("Failed to create VM ID: {0}")]
    VmId(#[from] VmIdError),

    #[error(transparent)]
    Environment(#[from] EnvironmentError),

    #[error("Failed to query network health: {0}")]
    HealthCheck(#[from] HealthError),

    #[error("Failed to install VM plugins: {0}")]
    Plugin(#[from] PluginError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    Provision(#[from] ProvisionError),

    #[error("Deployment interrupted: {0}")]
    Context(#[from] ContextError),

    #[error("Failed to start network: {0}")]
    StartNetwork(#[source] NetworkClientError),

    #[error("Failed to deploy blockchain: {0}")]
    CreateBlockchain(#[source] NetworkClientError),

    #[error("Failed to stop network: {0}")]
    StopNetwork(#[source] NetworkClientError),

    #[error("Failed to create network client: {0}")]
    Client(#[source] NetworkClientError),

    #[error("The network has not preloaded subnet IDs")]
    EmptySubnetPool,

    #[error("No blockchain found for VM {vm_id} after deployment")]
    BlockchainNotFound { vm_id: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
