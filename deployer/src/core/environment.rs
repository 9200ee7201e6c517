use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use semver::Version;
use tracing::debug;

use crate::core::provisioner::{BinaryProvisioner, BinarySpec, ProvisionError};
use crate::core::snapshot::{SnapshotError, SnapshotManager};
use crate::utils::constants::NODE_PLUGINS_DIR_NAME;

#[derive(Debug, thiserror::Error)]
pub enum EnvironmentError {
    #[error("Failed setting up snapshots: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("Failed setting up local environment: {0}")]
    Provision(#[from] ProvisionError),

    #[error("Evaluated plugin dir to be {} but it does not exist", .0.display())]
    MissingPluginDir(PathBuf),

    #[error("Evaluated node binary path to be {} but it does not exist", .0.display())]
    MissingExecutable(PathBuf),
}

/// Node executable and plugin directory the network is started with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalEnv {
    pub exec_path: PathBuf,
    pub plugin_dir: PathBuf,
}

#[automock]
#[async_trait]
pub trait LocalEnvironment: Send + Sync {
    /// Prepares everything a local network needs and returns where the node binaries live.
    async fn setup(&self) -> Result<LocalEnv, EnvironmentError>;
}

/// Local environment backed by the bootstrap snapshot and a provisioned node release.
pub struct ProvisionedEnvironment {
    snapshots: Arc<SnapshotManager>,
    snapshots_dir: PathBuf,
    provisioner: Arc<BinaryProvisioner>,
    node: BinarySpec,
    node_version: Version,
    bin_dir: PathBuf,
}

impl ProvisionedEnvironment {
    pub fn new(
        snapshots: Arc<SnapshotManager>,
        snapshots_dir: PathBuf,
        provisioner: Arc<BinaryProvisioner>,
        node: BinarySpec,
        node_version: Version,
        bin_dir: PathBuf,
    ) -> Self {
        Self { snapshots, snapshots_dir, provisioner, node, node_version, bin_dir }
    }
}

#[async_trait]
impl LocalEnvironment for ProvisionedEnvironment {
    async fn setup(&self) -> Result<LocalEnv, EnvironmentError> {
        self.snapshots.ensure_default_snapshot(&self.snapshots_dir, false).await?;

        let node_dir = self.provisioner.ensure(&self.node, &self.bin_dir, &self.node_version).await?;
        debug!(dir = %node_dir.display(), "node release ready");

        verify_node_dir(&node_dir, &self.node.binary_name).await
    }
}

/// The plugin directory and the node executable must both exist inside `node_dir`.
pub async fn verify_node_dir(node_dir: &Path, binary_name: &str) -> Result<LocalEnv, EnvironmentError> {
    let plugin_dir = node_dir.join(NODE_PLUGINS_DIR_NAME);
    let exec_path = node_dir.join(binary_name);

    let is_dir = tokio::fs::metadata(&plugin_dir).await.map(|m| m.is_dir()).unwrap_or(false);
    if !is_dir {
        return Err(EnvironmentError::MissingPluginDir(plugin_dir));
    }
    let is_file = tokio::fs::metadata(&exec_path).await.map(|m| m.is_file()).unwrap_or(false);
    if !is_file {
        return Err(EnvironmentError::MissingExecutable(exec_path));
    }

    Ok(LocalEnv { exec_path, plugin_dir })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn complete_node_dir_is_accepted() {
        let node_dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(node_dir.path().join("plugins")).unwrap();
        std::fs::write(node_dir.path().join("avalanchego"), b"binary").unwrap();

        let env = verify_node_dir(node_dir.path(), "avalanchego").await.unwrap();

        assert_eq!(env.exec_path, node_dir.path().join("avalanchego"));
        assert_eq!(env.plugin_dir, node_dir.path().join("plugins"));
    }

    #[rstest]
    #[tokio::test]
    async fn missing_plugin_dir_is_an_error() {
        let node_dir = tempfile::tempdir().unwrap();
        std::fs::write(node_dir.path().join("avalanchego"), b"binary").unwrap();

        let result = verify_node_dir(node_dir.path(), "avalanchego").await;

        assert_matches!(result, Err(EnvironmentError::MissingPluginDir(dir)) if dir == node_dir.path().join("plugins"));
    }

    #[rstest]
    #[tokio::test]
    async fn missing_executable_is_an_error() {
        let node_dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(node_dir.path().join("plugins")).unwrap();

        let result = verify_node_dir(node_dir.path(), "avalanchego").await;

        assert_matches!(result, Err(EnvironmentError::MissingExecutable(_)));
    }
}
