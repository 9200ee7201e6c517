pub mod backend;
pub mod context;
pub mod environment;
pub mod genesis;
pub mod health;
pub mod plugins;
pub mod provisioner;
pub mod snapshot;
