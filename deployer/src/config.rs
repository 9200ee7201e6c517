use std::path::{Path, PathBuf};
use std::time::Duration;

use semver::Version;
use url::Url;

use crate::cli::SharedArgs;
use crate::core::provisioner::{parse_version, BinarySpec, ReleaseLayout, ReleaseSource};
use crate::error::{DeployerError, DeployerResult};
use crate::utils::constants::{
    BASE_DIR_NAME, BIN_DIR_NAME, NETWORK_RUNNER_BINARY_NAME, NETWORK_RUNNER_DIR_PREFIX, NODE_BINARY_NAME,
    NODE_DIR_PREFIX, RUNS_DIR_NAME, SNAPSHOTS_DIR_NAME, SUBNET_EVM_BINARY_NAME, SUBNET_EVM_DIR_PREFIX,
};

/// Resolved configuration shared by every command.
#[derive(Debug, Clone)]
pub struct DeployerConfig {
    pub base_dir: PathBuf,
    pub bin_dir: PathBuf,
    pub snapshots_dir: PathBuf,
    pub run_dir: PathBuf,

    pub node: BinarySpec,
    pub node_version: Version,
    pub network_runner: BinarySpec,
    pub network_runner_version: Version,
    pub subnet_evm: BinarySpec,
    pub subnet_evm_version: Version,

    pub snapshot_url: Url,
    pub snapshot_name: String,

    pub gateway_url: Url,
    pub server_port: u16,
    pub gateway_port: u16,
    pub dial_timeout: Duration,
    pub request_timeout: Duration,

    pub health_check_interval: Duration,
    pub timeout: Duration,
}

impl TryFrom<&SharedArgs> for DeployerConfig {
    type Error = DeployerError;

    fn try_from(args: &SharedArgs) -> Result<Self, Self::Error> {
        let env = &args.environment;
        let base_dir = match &env.base_dir {
            Some(dir) => dir.clone(),
            None => deployer_utils::env_utils::home_dir()
                .ok_or_else(|| DeployerError::Config("Could not determine the home directory".to_string()))?
                .join(BASE_DIR_NAME),
        };

        if args.polling.health_check_interval_ms == 0 {
            return Err(DeployerError::Config("Health check interval must be positive".to_string()));
        }

        let gateway_url = Url::parse(&format!("http://{}:{}", args.backend.gateway_host, args.backend.gateway_port))
            .map_err(|e| DeployerError::Config(format!("Invalid gateway address: {e}")))?;

        Ok(Self {
            bin_dir: base_dir.join(BIN_DIR_NAME),
            snapshots_dir: base_dir.join(SNAPSHOTS_DIR_NAME),
            run_dir: base_dir.join(RUNS_DIR_NAME),
            base_dir,

            node: BinarySpec {
                dir_prefix: NODE_DIR_PREFIX.to_string(),
                binary_name: binary_file_name(NODE_BINARY_NAME),
                source: ReleaseSource {
                    base_url: env.node_release_url.clone(),
                    project: NODE_BINARY_NAME.to_string(),
                    layout: ReleaseLayout::Node,
                },
            },
            node_version: parse_version(&env.node_version)?,
            network_runner: BinarySpec {
                dir_prefix: NETWORK_RUNNER_DIR_PREFIX.to_string(),
                binary_name: binary_file_name(NETWORK_RUNNER_BINARY_NAME),
                source: ReleaseSource {
                    base_url: env.network_runner_release_url.clone(),
                    project: NETWORK_RUNNER_BINARY_NAME.to_string(),
                    layout: ReleaseLayout::GoReleaser,
                },
            },
            network_runner_version: parse_version(&env.network_runner_version)?,
            subnet_evm: BinarySpec {
                dir_prefix: SUBNET_EVM_DIR_PREFIX.to_string(),
                binary_name: binary_file_name(SUBNET_EVM_BINARY_NAME),
                source: ReleaseSource {
                    base_url: env.subnet_evm_release_url.clone(),
                    project: SUBNET_EVM_BINARY_NAME.to_string(),
                    layout: ReleaseLayout::GoReleaser,
                },
            },
            subnet_evm_version: parse_version(&env.subnet_evm_version)?,

            snapshot_url: env.snapshot_url.clone(),
            snapshot_name: env.snapshot_name.clone(),

            gateway_url,
            server_port: args.backend.server_port,
            gateway_port: args.backend.gateway_port,
            dial_timeout: Duration::from_secs(args.backend.dial_timeout_secs),
            request_timeout: Duration::from_secs(args.backend.request_timeout_secs),

            health_check_interval: Duration::from_millis(args.polling.health_check_interval_ms),
            timeout: Duration::from_secs(args.polling.timeout_secs),
        })
    }
}

fn binary_file_name(name: &str) -> String {
    if cfg!(windows) {
        format!("{name}.exe")
    } else {
        name.to_string()
    }
}

/// Reads the global node configuration, which must be a JSON document.
pub async fn load_global_node_config(path: Option<&Path>) -> DeployerResult<Option<String>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| DeployerError::Config(format!("Failed to read node config {}: {e}", path.display())))?;
    serde_json::from_str::<serde_json::Value>(&content)
        .map_err(|e| DeployerError::Config(format!("Node config {} is not valid JSON: {e}", path.display())))?;
    Ok(Some(content))
}
