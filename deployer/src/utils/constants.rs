use std::time::Duration;

/// Name of the directory, under the user's home, holding binaries, snapshots and runs.
pub const BASE_DIR_NAME: &str = ".avalanche-cli";
pub const BIN_DIR_NAME: &str = "bin";
pub const SNAPSHOTS_DIR_NAME: &str = "snapshots";
pub const RUNS_DIR_NAME: &str = "runs";

pub const DEFAULT_HEALTH_CHECK_INTERVAL_MS: &str = "100";
pub const PROGRESS_REPORT_INTERVAL: Duration = Duration::from_secs(5);
pub const BACKEND_PING_INTERVAL: Duration = Duration::from_millis(250);

// Node binary
pub const NODE_BINARY_NAME: &str = "avalanchego";
pub const NODE_DIR_PREFIX: &str = "avalanchego-v";
pub const NODE_PLUGINS_DIR_NAME: &str = "plugins";
pub const DEFAULT_NODE_VERSION: &str = "v1.7.14";
pub const DEFAULT_NODE_RELEASE_URL: &str = "https://github.com/ava-labs/avalanchego/releases";

// Network runner backend
pub const NETWORK_RUNNER_BINARY_NAME: &str = "avalanche-network-runner";
pub const NETWORK_RUNNER_DIR_PREFIX: &str = "avalanche-network-runner-v";
pub const DEFAULT_NETWORK_RUNNER_VERSION: &str = "v1.1.0";
pub const DEFAULT_NETWORK_RUNNER_RELEASE_URL: &str = "https://github.com/ava-labs/avalanche-network-runner/releases";
pub const BACKEND_PID_FILE_NAME: &str = "backend.pid";
pub const BACKEND_LOG_FILE_NAME: &str = "backend.log";

// VM plugin
pub const SUBNET_EVM_BINARY_NAME: &str = "subnet-evm";
pub const SUBNET_EVM_DIR_PREFIX: &str = "subnet-evm-v";
pub const DEFAULT_SUBNET_EVM_VERSION: &str = "v0.2.4";
pub const DEFAULT_SUBNET_EVM_RELEASE_URL: &str = "https://github.com/ava-labs/subnet-evm/releases";

// Snapshots
pub const BOOTSTRAP_SNAPSHOT_ARCHIVE_NAME: &str = "bootstrapSnapshot.tar.gz";
pub const BOOTSTRAP_SNAPSHOT_URL: &str =
    "https://github.com/ava-labs/avalanche-cli/raw/main/assets/bootstrapSnapshot.tar.gz";
pub const DEFAULT_SNAPSHOT_NAME: &str = "default-1654102509";
pub const SNAPSHOT_DIR_PREFIX: &str = "anr-snapshot-";

/// Prefix of the temporary directories archives are extracted into before being moved in place.
pub const STAGING_DIR_PREFIX: &str = ".staging-";

// Genesis & report
pub const DEFAULT_TOKEN_SYMBOL: &str = "TEST";
pub const WEI_PER_TOKEN: u64 = 1_000_000_000_000_000_000;
pub const PREFUNDED_EWOQ_ADDRESS: &str = "0x8db97C7cEcE249c2b98bDC0226Cc4C2A57BF52FC";
pub const PREFUNDED_EWOQ_PRIVATE_KEY: &str = "56289e99c94b6912bfc12adc093c9b51124f0dc54ac7a766b2bc5ccf558d8027";
