//! Configuration loading and validation.

use std::path::Path;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use thiserror::Error;

use crate::schema::NodeConfig;

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A layer failed to parse, or the merged result did not fit the
    /// schema (unknown field, wrong type).
    #[error("configuration error: {0}")]
    Parse(#[from] figment::Error),
    /// The merged configuration is well-formed but cannot run a node.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Loads and validates the node configuration.
///
/// Layers, later overriding earlier: built-in defaults, the TOML file
/// at `path` (skipped when absent), then `MESHNODE_`-prefixed
/// environment variables (`MESHNODE_LIFECYCLE_TIMEOUT_SECS=10`).
///
/// # Errors
/// `Parse` when a layer is malformed; `Invalid` when the merged values
/// fail [`validate`].
pub fn load_config(path: Option<&Path>) -> Result<NodeConfig, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(NodeConfig::default()));
    if let Some(path) = path {
        figment = figment.merge(Toml::file(path));
    }
    let config: NodeConfig = figment
        .merge(Env::prefixed("MESHNODE_").split("_"))
        .extract()?;
    validate(&config)?;
    Ok(config)
}

/// Rejects merged configurations no node could run with.
///
/// The gateway address may stay empty here (the registry refuses to
/// start without one), but a non-empty address must look like
/// `host:port`. Zero-second intervals would spin the maintenance loop
/// or time out every call instantly.
pub fn validate(config: &NodeConfig) -> Result<(), ConfigError> {
    let address = &config.gateway.address;
    if !address.is_empty() && !well_formed_address(address) {
        return Err(ConfigError::Invalid(format!(
            "gateway address '{address}' is not host:port"
        )));
    }
    if config.lifecycle.maintenance_sleep_secs == 0 {
        return Err(ConfigError::Invalid(
            "lifecycle.maintenance_sleep_secs must be at least 1".into(),
        ));
    }
    if config.lifecycle.timeout_secs == 0 {
        return Err(ConfigError::Invalid(
            "lifecycle.timeout_secs must be at least 1".into(),
        ));
    }
    Ok(())
}

fn well_formed_address(address: &str) -> bool {
    match address.rsplit_once(':') {
        Some((host, port)) => !host.is_empty() && port.parse::<u16>().is_ok_and(|p| p != 0),
        None => false,
    }
}
