//! # meshnode-config
//!
//! Configuration schema and loader for the meshnode control plane.
//! Merges defaults, an optional TOML file, and `MESHNODE_`-prefixed
//! environment variables.

pub mod loader;
pub mod schema;

pub use loader::{load_config, validate, ConfigError};
pub use schema::{
    DirectoryConfig, GatewayConfig, LifecycleConfig, LoggingConfig, NodeConfig,
};
