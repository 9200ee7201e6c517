use clap::Parser as _;
use color_eyre::eyre::WrapErr;
use dotenvy::dotenv;
use std::time::Duration;
use subnet_deployer::cli::{Cli, Commands, DeployCmd, SharedArgs};
use subnet_deployer::config::{load_global_node_config, DeployerConfig};
use subnet_deployer::core::context::DeployContext;
use subnet_deployer::deploy::report::endpoints;
use subnet_deployer::deploy::{DeployOutcome, DeployRequest, LocalDeployment};
use subnet_deployer::setup::setup;
use subnet_deployer::utils::logging::init_logging;
use subnet_deployer::DeployerResult;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    dotenv().ok();
    init_logging()?;
    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Deploy { deploy_command } => {
            debug!("Executing deploy command with args: {:?}", deploy_command);
            deploy(deploy_command).await
        }
        Commands::Status { shared } => status(shared).await,
        Commands::ResetSnapshot { shared } => reset_snapshot(shared).await,
        Commands::Stop { shared } => stop(shared).await,
    };

    if let Err(e) = &result {
        error!(error = %e, error_chain = ?e, "Command failed");
    }
    result.wrap_err("Command failed")
}

/// Context bounded by the configured timeout and cancelled on Ctrl+C.
fn command_context(timeout: Duration) -> DeployContext {
    let ctx = DeployContext::new(CancellationToken::new(), Some(timeout));
    let token = ctx.token().clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, aborting");
            token.cancel();
        }
    });
    ctx
}

async fn deploy(cmd: &DeployCmd) -> DeployerResult<()> {
    let config = DeployerConfig::try_from(&cmd.shared)?;
    let node_config = load_global_node_config(cmd.node_config.as_deref()).await?;
    let services = setup(&config, node_config)?;
    let deployer = &services.deployer;

    let ctx = command_context(config.timeout);
    let backend = deployer.start_backend().await?;

    let request = DeployRequest {
        chain_name: cmd.chain_name.clone(),
        genesis_path: cmd.genesis.clone(),
        currency_symbol: cmd.token_symbol.clone(),
    };
    match deployer.deploy(&ctx, &request).await {
        Ok(DeployOutcome::AlreadyDeployed) => Ok(()),
        Ok(DeployOutcome::Deployed(deployment)) => {
            report(&deployment);
            Ok(())
        }
        Err(e) => {
            if backend.started_here() {
                warn!("Deployment failed, stopping the network runner started for it");
                let cleanup = DeployContext::with_timeout(config.request_timeout);
                if let Err(stop_error) = deployer.shutdown(&cleanup).await {
                    warn!(error = %stop_error, "Failed to stop the network runner");
                }
            }
            Err(e)
        }
    }
}

fn report(deployment: &LocalDeployment) {
    info!(
        subnet_id = %deployment.subnet_id,
        blockchain_id = %deployment.blockchain_id,
        "Network ready to use. Local network node endpoints:"
    );
    for line in &deployment.endpoints {
        info!("{line}");
    }
    info!("Browser Extension connection details (any node URL from above works):");
    for line in deployment.connection.to_string().lines() {
        info!("{line}");
    }
}

async fn status(shared: &SharedArgs) -> DeployerResult<()> {
    let config = DeployerConfig::try_from(shared)?;
    let services = setup(&config, None)?;
    let deployer = &services.deployer;

    if !deployer.backend().is_running().await? {
        info!("Network runner is not running");
        return Ok(());
    }

    let ctx = command_context(config.timeout);
    match deployer.wait_healthy(&ctx).await {
        Ok(info) => {
            info!(nodes = info.node_infos.len(), blockchains = info.custom_vms.len(), "Network is healthy");
            for line in endpoints(&info) {
                info!("{line}");
            }
            Ok(())
        }
        Err(e) if e.is_not_bootstrapped() => {
            info!("Network runner is running but no network has been started");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

async fn reset_snapshot(shared: &SharedArgs) -> DeployerResult<()> {
    let config = DeployerConfig::try_from(shared)?;
    let services = setup(&config, None)?;

    if services.deployer.backend().is_running().await? {
        warn!("Network runner is running, stop it first so the network does not keep using the old state");
    }
    services.snapshots.ensure_default_snapshot(&config.snapshots_dir, true).await?;
    info!(snapshot = services.snapshots.snapshot_name(), "Default snapshot restored");
    Ok(())
}

async fn stop(shared: &SharedArgs) -> DeployerResult<()> {
    let config = DeployerConfig::try_from(shared)?;
    let services = setup(&config, None)?;
    let deployer = &services.deployer;

    if !deployer.backend().is_running().await? {
        info!("Network runner is not running");
        return Ok(());
    }
    deployer.shutdown(&command_context(config.timeout)).await?;
    info!("Network runner stopped");
    Ok(())
}
