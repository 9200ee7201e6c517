//! JSON gateway client for the network runner backend.
//!
//! The network runner exposes its control service through a gRPC gateway, every call is a
//! `POST` with a JSON body. Errors come back as a non-2xx status with a `{code, message}` body.

mod wire;

use std::time::Duration;

use async_trait::async_trait;
use deployer_network_client_interface::{
    BlockchainSpec, ClusterInfo, LoadSnapshotOptions, NetworkClientError, NetworkControlClient,
};
use reqwest::header::{HeaderValue, ACCEPT, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, trace};
use url::Url;

use crate::wire::{
    ClusterInfoResponse, CreateBlockchainsRequest, EmptyRequest, GatewayError, LoadSnapshotRequest, PingResponse,
    WireBlockchainSpec,
};

const PING_PATH: &str = "v1/ping";
const HEALTH_PATH: &str = "v1/control/health";
const LOAD_SNAPSHOT_PATH: &str = "v1/control/loadsnapshot";
const CREATE_BLOCKCHAINS_PATH: &str = "v1/control/createblockchains";
const STOP_PATH: &str = "v1/control/stop";

/// The network runner reports a network that was never started with this message.
const NOT_BOOTSTRAPPED_MESSAGE: &str = "not bootstrapped";

pub struct NetworkRunnerClient {
    client: reqwest::Client,
    base_url: Url,
}

impl NetworkRunnerClient {
    pub fn new(base_url: Url, request_timeout: Duration) -> Result<Self, NetworkClientError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| NetworkClientError::Transport(e.to_string()))?;
        Ok(Self { client, base_url: with_trailing_slash(base_url) })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn call<Req, Resp>(&self, path: &str, request: &Req) -> Result<Resp, NetworkClientError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let url = self.base_url.join(path).map_err(|e| NetworkClientError::Transport(e.to_string()))?;
        trace!(%url, "calling network runner");

        let response = self
            .client
            .post(url)
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .json(request)
            .send()
            .await
            .map_err(|e| NetworkClientError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| NetworkClientError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(classify_error(status.as_u16(), &body));
        }

        serde_json::from_slice(&body).map_err(|e| NetworkClientError::InvalidResponse(e.to_string()))
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// Maps a gateway error body onto the structured error kinds of the interface.
fn classify_error(status: u16, body: &[u8]) -> NetworkClientError {
    match serde_json::from_slice::<GatewayError>(body) {
        Ok(error) if error.message.contains(NOT_BOOTSTRAPPED_MESSAGE) => NetworkClientError::NotBootstrapped,
        Ok(error) => NetworkClientError::Rpc { code: error.code, message: error.message },
        Err(_) => NetworkClientError::Rpc {
            code: i32::from(status),
            message: String::from_utf8_lossy(body).trim().to_string(),
        },
    }
}

#[async_trait]
impl NetworkControlClient for NetworkRunnerClient {
    async fn ping(&self) -> Result<u32, NetworkClientError> {
        let response: PingResponse = self.call(PING_PATH, &EmptyRequest {}).await?;
        Ok(response.pid)
    }

    async fn health(&self) -> Result<Option<ClusterInfo>, NetworkClientError> {
        let response: ClusterInfoResponse = self.call(HEALTH_PATH, &EmptyRequest {}).await?;
        Ok(response.cluster_info.map(Into::into))
    }

    async fn load_snapshot(
        &self,
        snapshot_name: &str,
        options: LoadSnapshotOptions,
    ) -> Result<Option<ClusterInfo>, NetworkClientError> {
        debug!(snapshot_name, exec_path = %options.exec_path.display(), "loading snapshot");
        let request = LoadSnapshotRequest {
            snapshot_name: snapshot_name.to_string(),
            exec_path: options.exec_path.display().to_string(),
            plugin_dir: options.plugin_dir.display().to_string(),
            root_data_dir: options.root_data_dir.display().to_string(),
            global_node_config: options.global_node_config,
        };
        let response: ClusterInfoResponse = self.call(LOAD_SNAPSHOT_PATH, &request).await?;
        Ok(response.cluster_info.map(Into::into))
    }

    async fn create_blockchains(&self, specs: Vec<BlockchainSpec>) -> Result<Option<ClusterInfo>, NetworkClientError> {
        debug!(count = specs.len(), "creating blockchains");
        let request = CreateBlockchainsRequest {
            blockchain_specs: specs
                .into_iter()
                .map(|spec| WireBlockchainSpec {
                    vm_name: spec.vm_name,
                    genesis: spec.genesis.display().to_string(),
                    subnet_id: spec.subnet_id,
                })
                .collect(),
        };
        let response: ClusterInfoResponse = self.call(CREATE_BLOCKCHAINS_PATH, &request).await?;
        Ok(response.cluster_info.map(Into::into))
    }

    async fn stop(&self) -> Result<(), NetworkClientError> {
        let _: ClusterInfoResponse = self.call(STOP_PATH, &EmptyRequest {}).await?;
        Ok(())
    }
}
