use clap::Args;

/// Parameters used to reach and start the network runner backend.
#[derive(Debug, Clone, Args)]
#[group()]
pub struct BackendCliArgs {
    /// Host the network runner gateway listens on.
    #[arg(env = "SUBNET_DEPLOYER_GATEWAY_HOST", long, default_value = "127.0.0.1")]
    pub gateway_host: String,

    /// Port of the network runner JSON gateway.
    #[arg(env = "SUBNET_DEPLOYER_GATEWAY_PORT", long, default_value = "8098")]
    pub gateway_port: u16,

    /// Port of the network runner gRPC server.
    #[arg(env = "SUBNET_DEPLOYER_SERVER_PORT", long, default_value = "8097")]
    pub server_port: u16,

    /// Seconds a freshly started network runner gets to answer.
    #[arg(env = "SUBNET_DEPLOYER_DIAL_TIMEOUT", long, default_value = "10")]
    pub dial_timeout_secs: u64,

    /// Timeout in seconds of a single request to the network runner.
    #[arg(env = "SUBNET_DEPLOYER_REQUEST_TIMEOUT", long, default_value = "120")]
    pub request_timeout_secs: u64,
}
