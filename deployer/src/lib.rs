pub mod cli;
pub mod config;
pub mod core;
pub mod deploy;
pub mod error;
pub mod setup;
pub mod utils;

#[cfg(test)]
pub mod tests;

pub use error::{DeployerError, DeployerResult};
