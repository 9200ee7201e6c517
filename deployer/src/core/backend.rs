//! Lifecycle of the network runner backend process.
//!
//! The backend is started detached so it outlives the deployer, its PID is recorded in a pid file
//! inside the run directory and liveness is checked against that PID.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use deployer_network_client_interface::NetworkControlClient;
use mockall::automock;
use semver::Version;
use tokio::process::{Child, Command};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::core::provisioner::{BinaryProvisioner, BinarySpec, ProvisionError};
use crate::utils::constants::{BACKEND_LOG_FILE_NAME, BACKEND_PID_FILE_NAME, BACKEND_PING_INTERVAL};

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("Failed to provision the network runner: {0}")]
    Provision(#[from] ProvisionError),

    #[error("Failed to spawn {}: {source}", binary.display())]
    Spawn {
        binary: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Network runner exited during startup ({status}), check the logs at {}", log.display())]
    ExitedEarly { status: ExitStatus, log: PathBuf },

    #[error("Network runner did not answer within {timeout:?}, check the logs at {}", log.display())]
    StartTimeout { timeout: Duration, log: PathBuf },

    #[error("Invalid pid file {}: {content:?}", path.display())]
    InvalidPidFile { path: PathBuf, content: String },

    #[error("Failed to signal process {pid}: {source}")]
    Signal {
        pid: u32,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> BackendError + '_ {
    move |source| BackendError::Io { path: path.to_owned(), source }
}

/// Whether the backend was started by this invocation, which decides the teardown on failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendStatus {
    StartedHere,
    AlreadyRunning,
}

impl BackendStatus {
    pub fn started_here(&self) -> bool {
        matches!(self, BackendStatus::StartedHere)
    }
}

#[automock]
#[async_trait]
pub trait BackendProcess: Send + Sync {
    async fn is_running(&self) -> Result<bool, BackendError>;

    /// Starts the backend and returns once it answers requests.
    async fn start(&self) -> Result<(), BackendError>;

    /// Stops the backend. Stopping a backend that is not running is not an error.
    async fn stop(&self) -> Result<(), BackendError>;
}

#[derive(Debug, Clone)]
pub struct BackendSettings {
    pub version: Version,
    pub bin_dir: PathBuf,
    /// Holds the pid file and the backend log
    pub run_dir: PathBuf,
    pub server_port: u16,
    pub gateway_port: u16,
    /// How long a freshly started backend gets to answer a ping
    pub dial_timeout: Duration,
}

pub struct NetworkRunnerProcess {
    provisioner: Arc<BinaryProvisioner>,
    spec: BinarySpec,
    settings: BackendSettings,
    client: Arc<dyn NetworkControlClient>,
}

impl NetworkRunnerProcess {
    pub fn new(
        provisioner: Arc<BinaryProvisioner>,
        spec: BinarySpec,
        settings: BackendSettings,
        client: Arc<dyn NetworkControlClient>,
    ) -> Self {
        Self { provisioner, spec, settings, client }
    }

    pub fn pid_file(&self) -> PathBuf {
        self.settings.run_dir.join(BACKEND_PID_FILE_NAME)
    }

    pub fn log_file(&self) -> PathBuf {
        self.settings.run_dir.join(BACKEND_LOG_FILE_NAME)
    }

    async fn read_pid(&self) -> Result<Option<u32>, BackendError> {
        let path = self.pid_file();
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(BackendError::Io { path, source }),
        };
        match content.trim().parse() {
            Ok(pid) => Ok(Some(pid)),
            Err(_) => Err(BackendError::InvalidPidFile { path, content }),
        }
    }

    async fn remove_pid_file(&self) -> Result<(), BackendError> {
        let path = self.pid_file();
        match tokio::fs::remove_file(&path).await {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(BackendError::Io { path, source: e }),
            _ => Ok(()),
        }
    }

    fn command(&self, binary: &Path, log: std::fs::File) -> Result<Command, BackendError> {
        let log_path = self.log_file();
        let stderr = log.try_clone().map_err(io_error(&log_path))?;

        let mut command = Command::new(binary);
        command
            .arg("server")
            .arg("--log-level=debug")
            .arg(format!("--port=:{}", self.settings.server_port))
            .arg(format!("--grpc-gateway-port=:{}", self.settings.gateway_port))
            .stdin(Stdio::null())
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(stderr));
        // Own process group, so the backend survives a Ctrl+C sent to the deployer
        #[cfg(unix)]
        command.process_group(0);
        Ok(command)
    }

    async fn wait_until_ready(&self, child: &mut Child) -> Result<(), BackendError> {
        let deadline = Instant::now() + self.settings.dial_timeout;
        loop {
            if let Some(status) = child.try_wait().map_err(io_error(&self.log_file()))? {
                return Err(BackendError::ExitedEarly { status, log: self.log_file() });
            }
            match self.client.ping().await {
                Ok(pid) => {
                    debug!(pid, "network runner answered ping");
                    return Ok(());
                }
                Err(e) => debug!(error = %e, "network runner not answering yet"),
            }
            if Instant::now() >= deadline {
                return Err(BackendError::StartTimeout { timeout: self.settings.dial_timeout, log: self.log_file() });
            }
            tokio::time::sleep(BACKEND_PING_INTERVAL).await;
        }
    }
}

#[async_trait]
impl BackendProcess for NetworkRunnerProcess {
    async fn is_running(&self) -> Result<bool, BackendError> {
        let Some(pid) = self.read_pid().await? else {
            return Ok(false);
        };
        if send_signal(pid, "0").await? {
            return Ok(true);
        }
        debug!(pid, "removing stale pid file");
        self.remove_pid_file().await?;
        Ok(false)
    }

    async fn start(&self) -> Result<(), BackendError> {
        let dir = self.provisioner.ensure(&self.spec, &self.settings.bin_dir, &self.settings.version).await?;
        let binary = dir.join(&self.spec.binary_name);

        let run_dir = &self.settings.run_dir;
        tokio::fs::create_dir_all(run_dir).await.map_err(io_error(run_dir))?;
        let log_path = self.log_file();
        let log = tokio::fs::File::create(&log_path).await.map_err(io_error(&log_path))?.into_std().await;

        let mut child = self
            .command(&binary, log)?
            .spawn()
            .map_err(|source| BackendError::Spawn { binary: binary.clone(), source })?;

        if let Some(pid) = child.id() {
            let pid_file = self.pid_file();
            tokio::fs::write(&pid_file, pid.to_string()).await.map_err(io_error(&pid_file))?;
        }

        if let Err(e) = self.wait_until_ready(&mut child).await {
            warn!(error = %e, "network runner failed to start");
            if let Err(kill_err) = child.start_kill() {
                debug!(error = %kill_err, "could not kill network runner");
            }
            self.remove_pid_file().await?;
            return Err(e);
        }

        info!(pid = child.id(), log = %log_path.display(), "Network runner started");
        Ok(())
    }

    async fn stop(&self) -> Result<(), BackendError> {
        let Some(pid) = self.read_pid().await? else {
            debug!("network runner is not running");
            return Ok(());
        };
        if send_signal(pid, "TERM").await? {
            info!(pid, "Network runner stopped");
        } else {
            debug!(pid, "network runner already gone");
        }
        self.remove_pid_file().await
    }
}

/// Sends `signal` to `pid` with `kill`, returns whether the process received it.
async fn send_signal(pid: u32, signal: &str) -> Result<bool, BackendError> {
    let status = Command::new("kill")
        .args(["-s", signal, &pid.to_string()])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map_err(|source| BackendError::Signal { pid, source })?;
    Ok(status.success())
}
