use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use deployer_network_client_interface::{ClusterInfo, VmId};
use mockall::automock;
use semver::Version;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::core::provisioner::{BinaryProvisioner, BinarySpec, ProvisionError};

#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    #[error("Failed to provision VM binary: {0}")]
    Provision(#[from] ProvisionError),

    #[error("Failed to install plugin {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Installs VM plugin binaries, one per VM ID, into a plugin directory.
#[automock]
#[async_trait]
pub trait PluginInstaller: Send + Sync {
    async fn install(&self, vm_ids: &BTreeSet<String>, plugin_dir: &Path) -> Result<(), PluginError>;
}

/// The VM being deployed plus every VM already running on the network.
pub fn required_vm_ids(vm_id: &VmId, cluster_info: Option<&ClusterInfo>) -> BTreeSet<String> {
    let mut vm_ids = BTreeSet::from([vm_id.to_string()]);
    if let Some(info) = cluster_info {
        vm_ids.extend(info.vm_ids().map(str::to_string));
    }
    vm_ids
}

pub async fn install_needed(
    installer: &dyn PluginInstaller,
    vm_id: &VmId,
    cluster_info: Option<&ClusterInfo>,
    plugin_dir: &Path,
) -> Result<(), PluginError> {
    let vm_ids = required_vm_ids(vm_id, cluster_info);
    debug!(count = vm_ids.len(), plugin_dir = %plugin_dir.display(), "installing needed plugins");
    installer.install(&vm_ids, plugin_dir).await
}

/// Installs subnet-evm as the plugin binary of every requested VM.
///
/// The release is provisioned at most once per installer and copied under each VM ID that is not
/// installed yet.
pub struct SubnetEvmInstaller {
    provisioner: Arc<BinaryProvisioner>,
    spec: BinarySpec,
    version: Version,
    bin_dir: PathBuf,
    binary: OnceCell<PathBuf>,
}

impl SubnetEvmInstaller {
    pub fn new(provisioner: Arc<BinaryProvisioner>, spec: BinarySpec, version: Version, bin_dir: PathBuf) -> Self {
        Self { provisioner, spec, version, bin_dir, binary: OnceCell::new() }
    }

    async fn binary(&self) -> Result<&PathBuf, PluginError> {
        self.binary
            .get_or_try_init(|| async {
                let dir = self.provisioner.ensure(&self.spec, &self.bin_dir, &self.version).await?;
                Ok::<_, PluginError>(dir.join(&self.spec.binary_name))
            })
            .await
    }
}

#[async_trait]
impl PluginInstaller for SubnetEvmInstaller {
    async fn install(&self, vm_ids: &BTreeSet<String>, plugin_dir: &Path) -> Result<(), PluginError> {
        let io_error = |path: &Path| {
            let path = path.to_owned();
            move |source| PluginError::Io { path, source }
        };

        for vm_id in vm_ids {
            let target = plugin_dir.join(vm_id);
            if tokio::fs::try_exists(&target).await.map_err(io_error(&target))? {
                debug!(%vm_id, "plugin already installed");
                continue;
            }

            let binary = self.binary().await?;
            tokio::fs::create_dir_all(plugin_dir).await.map_err(io_error(plugin_dir))?;
            tokio::fs::copy(binary, &target).await.map_err(io_error(&target))?;
            make_executable(&target).await.map_err(io_error(&target))?;
            info!(%vm_id, "Installed VM plugin");
        }
        Ok(())
    }
}

#[cfg(unix)]
async fn make_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).await
}

#[cfg(not(unix))]
async fn make_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
