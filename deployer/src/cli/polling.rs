use clap::Args;

use crate::utils::constants::DEFAULT_HEALTH_CHECK_INTERVAL_MS;

/// Parameters of the health polling.
#[derive(Debug, Clone, Args)]
#[group()]
pub struct PollingCliArgs {
    /// Milliseconds between two health checks.
    #[arg(env = "SUBNET_DEPLOYER_HEALTH_CHECK_INTERVAL_MS", long, default_value = DEFAULT_HEALTH_CHECK_INTERVAL_MS)]
    pub health_check_interval_ms: u64,

    /// Upper bound in seconds for a whole command, health waits included.
    #[arg(env = "SUBNET_DEPLOYER_TIMEOUT", long, default_value = "600")]
    pub timeout_secs: u64,
}
