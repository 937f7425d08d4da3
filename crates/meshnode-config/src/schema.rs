//! Configuration schema types.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level meshnode configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeConfig {
    /// Gateway connection settings.
    #[serde(default)]
    pub gateway: GatewayConfig,
    /// Dependency lifecycle settings.
    #[serde(default)]
    pub lifecycle: LifecycleConfig,
    /// Registry directory locations passed to the launcher.
    #[serde(default)]
    pub directories: DirectoryConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Gateway connection settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// `ip:port` of the gateway that launches and stops instances.
    /// Empty by default; the registry refuses to start without one.
    #[serde(default)]
    pub address: String,
}

/// Dependency lifecycle thresholds and intervals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleConfig {
    /// Seconds between maintenance sweeps; doubles as the idle-expiry
    /// horizon for pooled instances.
    #[serde(default = "default_maintenance_sleep_secs")]
    pub maintenance_sleep_secs: u64,
    /// Per-call and probe timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Failed attempts after which an instance is considered a zombie.
    #[serde(default = "default_failed_attempts")]
    pub failed_attempts: u32,
    /// Passed timeouts after which the liveness probe is consulted.
    #[serde(default = "default_pass_timeout_times")]
    pub pass_timeout_times: u32,
}

impl LifecycleConfig {
    /// Returns the maintenance interval as a `Duration`.
    pub fn maintenance_interval(&self) -> Duration {
        Duration::from_secs(self.maintenance_sleep_secs)
    }

    /// Returns the call/probe timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            maintenance_sleep_secs: default_maintenance_sleep_secs(),
            timeout_secs: default_timeout_secs(),
            failed_attempts: default_failed_attempts(),
            pass_timeout_times: default_pass_timeout_times(),
        }
    }
}

fn default_maintenance_sleep_secs() -> u64 {
    60
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_failed_attempts() -> u32 {
    20
}
fn default_pass_timeout_times() -> u32 {
    5
}

/// Registry directory locations forwarded to the launcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Directory holding immutable service definitions.
    #[serde(default = "default_static_service")]
    pub static_service: String,
    /// Directory holding immutable service metadata.
    #[serde(default = "default_static_metadata")]
    pub static_metadata: String,
    /// Directory for definitions acquired at runtime.
    #[serde(default)]
    pub dynamic_service: String,
    /// Directory for metadata acquired at runtime.
    #[serde(default)]
    pub dynamic_metadata: String,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            static_service: default_static_service(),
            static_metadata: default_static_metadata(),
            dynamic_service: String::new(),
            dynamic_metadata: String::new(),
        }
    }
}

fn default_static_service() -> String {
    "__services__".to_string()
}
fn default_static_metadata() -> String {
    "__metadata__".to_string()
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g. "info", "debug", "meshnode=trace").
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
