//! # meshnode-lifecycle
//!
//! Dependency lifecycle engine for the meshnode control plane.
//! Maps deterministic service fingerprints to pools of running remote
//! instances, health-checks pooled instances, and reclaims idle or
//! misbehaving ones through a background maintenance loop.
//!
//! Use [`DependencyRegistry`] to register services and obtain a
//! [`ServiceFacade`] per fingerprint; the facade hands out
//! [`InstanceHandle`]s that callers use directly against the remote
//! instance and must return through `release` or `discard`.

pub mod error;
pub mod facade;
pub mod handle;
mod maintenance;
pub mod metrics;
pub mod pool;
pub mod registry;

pub use error::LifecycleError;
pub use facade::{CallOutcome, ServiceFacade};
pub use handle::{FailureKind, InstanceHandle};
pub use metrics::{LifecycleMetrics, MetricsSnapshot};
pub use pool::{LaunchPlan, PoolPolicy, ServicePool};
pub use registry::{DependencyRegistry, PoolStats, RegisterOptions, RegistrySettings};
