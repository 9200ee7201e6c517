use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub use backend::BackendCliArgs as BackendParams;
pub use environment::EnvironmentCliArgs as EnvironmentParams;
pub use polling::PollingCliArgs as PollingParams;

use crate::utils::constants::DEFAULT_TOKEN_SYMBOL;

pub mod backend;
pub mod environment;
pub mod polling;

#[derive(Parser, Debug)]
#[command(
    name = "subnet-deployer",
    about = "Deploys subnet blockchains onto a local network",
    long_about = "Subnet deployer runs a local network through the network runner and deploys subnet \
    blockchains on it.\n\n\
    The network runner backend, the node binary, the VM plugins and the bootstrap snapshot are installed on first use.",
    after_help = "Examples:\n  \
    subnet-deployer deploy mychain --genesis ./genesis.json\n  \
    subnet-deployer status\n  \
    subnet-deployer stop"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Deploy a blockchain on the local network
    #[command(long_about = "Deploy a blockchain on the local network.\n\n\
        Starts the network runner and boots the network from the default snapshot when needed, \
        then creates the blockchain on one of the preloaded subnets.")]
    Deploy {
        #[command(flatten)]
        deploy_command: Box<DeployCmd>,
    },
    /// Wait for the local network to be healthy and list its endpoints
    Status {
        #[command(flatten)]
        shared: Box<SharedArgs>,
    },
    /// Extract the default snapshot again, dropping the state of previous runs
    ResetSnapshot {
        #[command(flatten)]
        shared: Box<SharedArgs>,
    },
    /// Stop the local network and the network runner
    Stop {
        #[command(flatten)]
        shared: Box<SharedArgs>,
    },
}

/// Arguments every command understands.
#[derive(Debug, Clone, Args)]
pub struct SharedArgs {
    #[clap(flatten)]
    pub environment: EnvironmentParams,

    #[clap(flatten)]
    pub backend: BackendParams,

    #[clap(flatten)]
    pub polling: PollingParams,
}

#[derive(Debug, Clone, Args)]
pub struct DeployCmd {
    /// Name of the chain, the VM ID is derived from it
    #[arg(value_name = "CHAIN")]
    pub chain_name: String,

    /// Path to the chain genesis file
    #[arg(env = "SUBNET_DEPLOYER_GENESIS", long, value_name = "PATH")]
    pub genesis: PathBuf,

    /// Currency symbol shown in the connection details
    #[arg(env = "SUBNET_DEPLOYER_TOKEN_SYMBOL", long, default_value = DEFAULT_TOKEN_SYMBOL)]
    pub token_symbol: String,

    /// JSON file with the global node configuration used when the network is booted
    #[arg(env = "SUBNET_DEPLOYER_NODE_CONFIG", long, value_name = "PATH")]
    pub node_config: Option<PathBuf>,

    #[clap(flatten)]
    pub shared: SharedArgs,
}
