pub mod types;
pub mod vm_id;

use std::path::PathBuf;

use async_trait::async_trait;
use mockall::automock;

pub use types::{BlockchainSpec, ClusterInfo, CustomVmInfo, NodeInfo};
pub use vm_id::{VmId, VmIdError};

/// Options accepted by [NetworkControlClient::load_snapshot].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadSnapshotOptions {
    /// Directory the nodes load VM plugins from
    pub plugin_dir: PathBuf,
    /// Node executable used for every node of the network
    pub exec_path: PathBuf,
    /// Root directory for the ephemeral node state (databases, logs)
    pub root_data_dir: PathBuf,
    /// Global node configuration (JSON) applied to every node
    pub global_node_config: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum NetworkClientError {
    /// The backend is up but no network has been started yet.
    #[error("network is not bootstrapped")]
    NotBootstrapped,

    /// The backend answered the call with an error.
    #[error("network runner returned an error (code {code}): {message}")]
    Rpc { code: i32, message: String },

    /// The backend could not be reached at all.
    #[error("failed to reach the network runner: {0}")]
    Transport(String),

    /// The backend answered with something that could not be understood.
    #[error("invalid response from the network runner: {0}")]
    InvalidResponse(String),
}

impl NetworkClientError {
    pub fn is_not_bootstrapped(&self) -> bool {
        matches!(self, NetworkClientError::NotBootstrapped)
    }
}

/// Control plane of the long-lived backend process that runs the local network.
///
/// The orchestrator only talks to the network through this trait. Every call is a blocking
/// point of the deployment; none of them are issued concurrently against the same network.
#[automock]
#[async_trait]
pub trait NetworkControlClient: Send + Sync {
    /// Liveness of the backend process itself, regardless of the network state.
    async fn ping(&self) -> Result<u32, NetworkClientError>;

    /// Current state of the network. `None` when the backend reports no cluster info yet.
    async fn health(&self) -> Result<Option<ClusterInfo>, NetworkClientError>;

    /// Boots a network from a snapshot previously saved by the backend.
    async fn load_snapshot(
        &self,
        snapshot_name: &str,
        options: LoadSnapshotOptions,
    ) -> Result<Option<ClusterInfo>, NetworkClientError>;

    /// Creates blockchains on the running network.
    async fn create_blockchains(&self, specs: Vec<BlockchainSpec>) -> Result<Option<ClusterInfo>, NetworkClientError>;

    /// Stops the network and its nodes. The backend process keeps running.
    async fn stop(&self) -> Result<(), NetworkClientError>;
}
