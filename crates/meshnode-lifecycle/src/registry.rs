//! The dependency registry: fingerprint → service pool map.
//!
//! One registry per process, explicitly constructed and passed to
//! consumers (no hidden global). A single coarse mutex guards the pool
//! map and every pool's idle queue; all remote I/O happens outside it,
//! so critical sections stay bounded to pointer and index work.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use meshnode_config::NodeConfig;
use meshnode_gateway::{DirectoryHints, Launcher, LivenessProbe, TcpProbe};
use meshnode_types::{ConfigBlob, Fingerprint, ServiceId};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::LifecycleError;
use crate::facade::ServiceFacade;
use crate::maintenance::MaintenanceTask;
use crate::metrics::LifecycleMetrics;
use crate::pool::{PoolPolicy, ServicePool};

/// Registry-wide settings: the gateway address, default eviction
/// thresholds, and the launcher locality hints.
#[derive(Debug, Clone)]
pub struct RegistrySettings {
    /// `ip:port` of the gateway. Must be non-empty.
    pub node_address: String,
    /// Interval between maintenance sweeps; also the idle-expiry
    /// horizon for pooled instances.
    pub maintenance_interval: Duration,
    /// Default per-call and probe timeout.
    pub timeout: Duration,
    /// Default failed-attempts threshold.
    pub failed_attempts: u32,
    /// Default pass-timeout threshold.
    pub pass_timeout_times: u32,
    /// Registry directory locations forwarded to the launcher.
    pub directories: DirectoryHints,
    /// Opaque guard forwarded with every launch so the gateway can
    /// break launch cycles. `None` for ordinary nodes.
    pub recursion_guard: Option<String>,
}

impl RegistrySettings {
    /// Builds settings from the loaded node configuration.
    pub fn from_node_config(config: &NodeConfig) -> Self {
        Self {
            node_address: config.gateway.address.clone(),
            maintenance_interval: config.lifecycle.maintenance_interval(),
            timeout: config.lifecycle.timeout(),
            failed_attempts: config.lifecycle.failed_attempts,
            pass_timeout_times: config.lifecycle.pass_timeout_times,
            directories: DirectoryHints {
                static_service: config.directories.static_service.clone(),
                static_metadata: config.directories.static_metadata.clone(),
                dynamic_service: config.directories.dynamic_service.clone(),
                dynamic_metadata: config.directories.dynamic_metadata.clone(),
            },
            recursion_guard: None,
        }
    }
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self::from_node_config(&NodeConfig::default())
    }
}

/// Per-service overrides accepted at registration time.
#[derive(Default)]
pub struct RegisterOptions {
    /// True when the service was acquired dynamically through the API.
    pub dynamic: bool,
    /// Override of the registry-wide call/probe timeout.
    pub timeout: Option<Duration>,
    /// Override of the registry-wide failed-attempts threshold.
    pub failed_attempts: Option<u32>,
    /// Override of the registry-wide pass-timeout threshold.
    pub pass_timeout_times: Option<u32>,
    /// Custom liveness probe; defaults to the bare TCP check.
    pub probe: Option<Arc<dyn LivenessProbe>>,
}

/// Observable state of one pool, for operators and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolStats {
    /// The pool's fingerprint.
    pub fingerprint: Fingerprint,
    /// The service identity it launches.
    pub service_id: ServiceId,
    /// Idle handles currently pooled.
    pub idle: usize,
}

/// The fingerprint → pool map plus the registration-order scan list.
pub(crate) struct RegistryInner {
    pub(crate) pools: HashMap<Fingerprint, ServicePool>,
    /// Registration order; the maintenance round-robin follows it.
    pub(crate) order: Vec<Fingerprint>,
}

impl RegistryInner {
    pub(crate) fn pool_mut(
        &mut self,
        fingerprint: &Fingerprint,
    ) -> Result<&mut ServicePool, LifecycleError> {
        self.pools
            .get_mut(fingerprint)
            .ok_or_else(|| LifecycleError::UnknownService {
                fingerprint: fingerprint.to_string(),
            })
    }
}

/// State shared between the registry, its facades, and the maintenance
/// task.
pub(crate) struct RegistryShared {
    pub(crate) inner: Mutex<RegistryInner>,
    pub(crate) launcher: Arc<dyn Launcher>,
    pub(crate) settings: RegistrySettings,
    pub(crate) metrics: Arc<LifecycleMetrics>,
}

/// Top-level registry of service dependencies for this node.
///
/// Owns the maintenance loop, which starts at construction and runs
/// until [`DependencyRegistry::shutdown`] (or drop, which cancels it
/// without joining).
pub struct DependencyRegistry {
    shared: Arc<RegistryShared>,
    maintenance: MaintenanceTask,
}

impl DependencyRegistry {
    /// Creates the registry and starts its maintenance loop.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    /// Returns `InvalidConfig` if `settings.node_address` is empty: the
    /// registry cannot launch or stop instances without a gateway.
    pub fn new(
        settings: RegistrySettings,
        launcher: Arc<dyn Launcher>,
    ) -> Result<Self, LifecycleError> {
        if settings.node_address.is_empty() {
            return Err(LifecycleError::InvalidConfig {
                message: "gateway address not provided".into(),
            });
        }
        let shared = Arc::new(RegistryShared {
            inner: Mutex::new(RegistryInner {
                pools: HashMap::new(),
                order: Vec::new(),
            }),
            launcher,
            settings,
            metrics: LifecycleMetrics::new_shared(),
        });
        let maintenance = MaintenanceTask::spawn(Arc::clone(&shared));
        info!(
            gateway = %shared.settings.node_address,
            interval_secs = shared.settings.maintenance_interval.as_secs(),
            "dependency registry started"
        );
        Ok(Self {
            shared,
            maintenance,
        })
    }

    /// Registers a service dependency and returns its facade.
    ///
    /// The fingerprint is `SHA3-256(service_id || SHA3-256(config))`;
    /// identical inputs share one pool. Re-registration of a known
    /// fingerprint is a no-op that still returns a valid facade and
    /// never discards pooled instances. Concurrent registrations for
    /// the same fingerprint are idempotent: the check-then-create path
    /// runs entirely inside the critical section.
    #[tracing::instrument(skip_all, fields(service_id = %service_id))]
    pub async fn register(
        &self,
        service_id: ServiceId,
        config: ConfigBlob,
        options: RegisterOptions,
    ) -> Result<ServiceFacade, LifecycleError> {
        let fingerprint = Fingerprint::compute(&service_id, &config);
        let settings = &self.shared.settings;
        let policy = PoolPolicy {
            timeout: options.timeout.unwrap_or(settings.timeout),
            failed_attempts: options.failed_attempts.unwrap_or(settings.failed_attempts),
            pass_timeout_times: options
                .pass_timeout_times
                .unwrap_or(settings.pass_timeout_times),
            dynamic: options.dynamic,
        };
        let probe = options.probe.unwrap_or_else(|| Arc::new(TcpProbe));

        let mut inner = self.shared.inner.lock().await;
        let policy = if let Some(existing) = inner.pools.get(&fingerprint) {
            debug!(%fingerprint, "service already registered");
            existing.policy()
        } else {
            inner.pools.insert(
                fingerprint,
                ServicePool::new(
                    service_id.clone(),
                    fingerprint,
                    config,
                    policy,
                    settings.directories.clone(),
                    settings.recursion_guard.clone(),
                    probe,
                ),
            );
            inner.order.push(fingerprint);
            info!(%fingerprint, "service registered");
            policy
        };
        drop(inner);

        Ok(ServiceFacade::new(
            Arc::clone(&self.shared),
            fingerprint,
            policy,
        ))
    }

    /// Looks up the observable state of one pool.
    ///
    /// # Errors
    /// Returns `UnknownService` if the fingerprint is not registered.
    pub async fn pool_stats(&self, fingerprint: &Fingerprint) -> Result<PoolStats, LifecycleError> {
        let mut inner = self.shared.inner.lock().await;
        let pool = inner.pool_mut(fingerprint)?;
        Ok(PoolStats {
            fingerprint: pool.fingerprint(),
            service_id: pool.service_id().clone(),
            idle: pool.idle_len(),
        })
    }

    /// Number of registered pools.
    pub async fn pool_count(&self) -> usize {
        self.shared.inner.lock().await.pools.len()
    }

    /// Runs one maintenance round immediately, without waiting for the
    /// next tick. Deterministic hook for shutdown drains and tests.
    pub async fn sweep_now(&self) {
        crate::maintenance::sweep(&self.shared).await;
    }

    /// Returns a shared handle to the lifecycle metrics.
    pub fn metrics(&self) -> Arc<LifecycleMetrics> {
        Arc::clone(&self.shared.metrics)
    }

    /// Stops the maintenance loop and waits for it to exit.
    pub async fn shutdown(self) {
        self.maintenance.shutdown().await;
        info!("dependency registry stopped");
    }
}
