use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use num_bigint::BigUint;
use num_traits::Num;
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum GenesisError {
    #[error("Evaluated chain genesis file to be at {} but it does not seem to exist", path.display())]
    NotFound { path: PathBuf },

    #[error("Failed to read chain genesis file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to unpack chain ID from genesis: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid balance {value:?} for address {address}")]
    InvalidBalance { address: String, value: String },
}

#[derive(Deserialize)]
struct RawGenesis {
    config: RawChainConfig,
    #[serde(default)]
    alloc: BTreeMap<String, RawAccount>,
}

#[derive(Deserialize)]
struct RawChainConfig {
    #[serde(rename = "chainId")]
    chain_id: u64,
}

#[derive(Deserialize)]
struct RawAccount {
    #[serde(default)]
    balance: Option<RawBalance>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawBalance {
    Text(String),
    Number(u64),
}

/// The parts of an EVM chain genesis the deployer cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Genesis {
    pub chain_id: u64,
    /// Prefunded balances in wei, keyed by address as written in the file
    pub alloc: BTreeMap<String, BigUint>,
}

impl Genesis {
    pub async fn load(path: &Path) -> Result<Self, GenesisError> {
        let bytes = tokio::fs::read(path).await.map_err(|source| match source.kind() {
            ErrorKind::NotFound => GenesisError::NotFound { path: path.to_owned() },
            _ => GenesisError::Io { path: path.to_owned(), source },
        })?;
        Self::from_slice(&bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, GenesisError> {
        let raw: RawGenesis = serde_json::from_slice(bytes)?;
        let alloc = raw
            .alloc
            .into_iter()
            .map(|(address, account)| {
                let balance = match account.balance {
                    None => BigUint::default(),
                    Some(RawBalance::Number(value)) => BigUint::from(value),
                    Some(RawBalance::Text(value)) => parse_balance(&value)
                        .ok_or_else(|| GenesisError::InvalidBalance { address: address.clone(), value })?,
                };
                Ok((address, balance))
            })
            .collect::<Result<_, GenesisError>>()?;

        Ok(Self { chain_id: raw.config.chain_id, alloc })
    }
}

/// Hex (`0x` prefixed) or decimal.
fn parse_balance(value: &str) -> Option<BigUint> {
    match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some("") => Some(BigUint::default()),
        Some(hex) => BigUint::from_str_radix(hex, 16).ok(),
        None => BigUint::from_str_radix(value, 10).ok(),
    }
}
