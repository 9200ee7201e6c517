use std::time::Duration;

use deployer_network_client_interface::{ClusterInfo, NetworkClientError, NetworkControlClient};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, Instrument};

use crate::core::context::{ContextError, DeployContext};
use crate::utils::constants::PROGRESS_REPORT_INTERVAL;

#[derive(Debug, thiserror::Error)]
pub enum HealthError {
    #[error("Health check interrupted: {0}")]
    Context(#[from] ContextError),

    #[error("The health check failed to complete, the backend might be down or have crashed: {0}")]
    Client(#[from] NetworkClientError),
}

impl HealthError {
    pub fn is_not_bootstrapped(&self) -> bool {
        matches!(self, HealthError::Client(e) if e.is_not_bootstrapped())
    }
}

/// Polls the backend at a fixed interval until the network and its custom VMs are healthy.
///
/// There is no retry ceiling, the loop ends with the deployment context. Client errors are not
/// retried.
pub struct HealthPoller<'a> {
    client: &'a dyn NetworkControlClient,
    interval: Duration,
}

impl<'a> HealthPoller<'a> {
    pub fn new(client: &'a dyn NetworkControlClient, interval: Duration) -> Self {
        Self { client, interval }
    }

    pub async fn wait_healthy(&self, ctx: &DeployContext) -> Result<ClusterInfo, HealthError> {
        let _progress = ProgressIndicator::spawn(PROGRESS_REPORT_INTERVAL);

        loop {
            tokio::select! {
                biased;
                err = ctx.done() => return Err(err.into()),
                _ = tokio::time::sleep(self.interval) => {}
            }

            debug!("polling for health");
            let Some(info) = ctx.run(self.client.health()).await?? else {
                debug!("cluster info not available yet, polling again");
                continue;
            };
            if !info.healthy {
                debug!("network is not healthy, polling again");
                continue;
            }
            if !info.custom_vms_healthy {
                debug!("network is up but custom VMs are not healthy, polling again");
                continue;
            }

            debug!("network is up and custom VMs are up");
            return Ok(info);
        }
    }
}

/// Reports that a wait is still in progress, within the span of the caller.
///
/// The task is aborted when the indicator is dropped.
pub struct ProgressIndicator {
    handle: JoinHandle<()>,
}

impl ProgressIndicator {
    pub fn spawn(period: Duration) -> Self {
        let started = Instant::now();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(started + period, period);
            loop {
                ticker.tick().await;
                info!(elapsed_secs = started.elapsed().as_secs(), "Waiting for the network to become healthy");
            }
        }
        .in_current_span());
        Self { handle }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for ProgressIndicator {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
