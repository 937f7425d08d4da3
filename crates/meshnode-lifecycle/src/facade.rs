//! Per-fingerprint acquire/release interface handed to callers.

use std::sync::Arc;

use meshnode_gateway::GatewayError;
use meshnode_types::Fingerprint;
use tracing::{debug, warn};

use crate::error::LifecycleError;
use crate::handle::InstanceHandle;
use crate::pool::PoolPolicy;
use crate::registry::RegistryShared;

/// Outcome of a caller's remote call through an acquired handle.
pub enum CallOutcome {
    /// The call succeeded; the handle's counters reset and it returns
    /// to the pool.
    Success,
    /// The call failed; the failure is classified against the handle,
    /// which is then either pooled again or stopped as a zombie.
    Failure(GatewayError),
}

/// Thin per-fingerprint wrapper over the shared registry state.
///
/// Contract: every handle taken from [`ServiceFacade::acquire`] must be
/// passed to exactly one of [`ServiceFacade::release`] or
/// [`ServiceFacade::discard`] before the caller returns control. An
/// un-returned handle becomes an invisible zombie consuming remote
/// resources indefinitely.
pub struct ServiceFacade {
    shared: Arc<RegistryShared>,
    fingerprint: Fingerprint,
    policy: PoolPolicy,
}

impl Clone for ServiceFacade {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            fingerprint: self.fingerprint,
            policy: self.policy,
        }
    }
}

impl ServiceFacade {
    pub(crate) fn new(
        shared: Arc<RegistryShared>,
        fingerprint: Fingerprint,
        policy: PoolPolicy,
    ) -> Self {
        Self {
            shared,
            fingerprint,
            policy,
        }
    }

    /// The fingerprint this facade is bound to.
    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    /// Acquires a running instance: the freshest pooled handle if one
    /// exists, else a new launch through the gateway.
    ///
    /// The registry lock is held only for the pool pop; the launch call
    /// runs outside it.
    ///
    /// # Errors
    /// Launcher failures propagate unchanged (`Gateway`); an unknown
    /// fingerprint yields `UnknownService`.
    #[tracing::instrument(skip(self), fields(fingerprint = %self.fingerprint))]
    pub async fn acquire(&self) -> Result<InstanceHandle, LifecycleError> {
        let plan = {
            let mut inner = self.shared.inner.lock().await;
            let pool = inner.pool_mut(&self.fingerprint)?;
            if let Some(mut handle) = pool.pop_back() {
                handle.touch();
                self.shared.metrics.record_reuse();
                debug!(address = handle.address(), "reusing pooled instance");
                return Ok(handle);
            }
            pool.launch_plan()
        };

        match plan.launch(&*self.shared.launcher).await {
            Ok(mut handle) => {
                handle.touch();
                self.shared.metrics.record_launch();
                debug!(address = handle.address(), "launched new instance");
                Ok(handle)
            }
            Err(e) => {
                self.shared.metrics.record_launch_failure();
                Err(e)
            }
        }
    }

    /// Returns an acquired handle, reporting how its last call went.
    ///
    /// On success the counters reset and the handle is pooled at the
    /// caller end. On failure the error is classified (deadline vs
    /// other), the matching counter marked, and the handle re-evaluated:
    /// a zombie is stopped through the gateway, anything else is pooled
    /// again.
    ///
    /// # Errors
    /// Returns `UnknownService` if the fingerprint is no longer
    /// registered; the handle is stopped rather than leaked.
    #[tracing::instrument(skip(self, handle, outcome), fields(fingerprint = %self.fingerprint))]
    pub async fn release(
        &self,
        mut handle: InstanceHandle,
        outcome: CallOutcome,
    ) -> Result<(), LifecycleError> {
        match outcome {
            CallOutcome::Success => {
                handle.reset_counters();
                self.pool_or_stop(handle).await?;
                self.shared.metrics.record_release();
                Ok(())
            }
            CallOutcome::Failure(err) => {
                // Classification and the possible probe run outside the
                // lock; only the final queue insert takes it.
                let kind = handle.record_failure(&err).await;
                debug!(
                    address = handle.address(),
                    kind = ?kind,
                    pass_timeouts = handle.pass_timeout_count(),
                    failed_attempts = handle.failed_attempts_count(),
                    "remote call failed"
                );
                if handle.is_zombie(&self.policy).await {
                    self.shared.metrics.record_zombie_eviction();
                    warn!(address = handle.address(), "stopping zombie instance");
                    if let Err(e) = handle.stop(&*self.shared.launcher).await {
                        warn!(error = %e, "failed to stop zombie instance");
                    }
                    Ok(())
                } else {
                    self.pool_or_stop(handle).await?;
                    self.shared.metrics.record_release();
                    Ok(())
                }
            }
        }
    }

    /// Explicitly stops an acquired handle instead of returning it.
    ///
    /// # Errors
    /// Propagates the gateway's stop failure.
    #[tracing::instrument(skip(self, handle), fields(fingerprint = %self.fingerprint))]
    pub async fn discard(&self, handle: InstanceHandle) -> Result<(), LifecycleError> {
        self.shared.metrics.record_discard();
        handle.stop(&*self.shared.launcher).await?;
        Ok(())
    }

    /// Pushes a handle back at the caller end. If the pool is gone the
    /// handle is stopped rather than leaked, and the lookup error is
    /// surfaced.
    async fn pool_or_stop(&self, handle: InstanceHandle) -> Result<(), LifecycleError> {
        let err = {
            let mut inner = self.shared.inner.lock().await;
            match inner.pool_mut(&self.fingerprint) {
                Ok(pool) => {
                    pool.push_back(handle);
                    return Ok(());
                }
                Err(e) => e,
            }
        };
        // Lock released before the remote stop.
        warn!(fingerprint = %self.fingerprint, "pool gone on release, stopping instance");
        if let Err(e) = handle.stop(&*self.shared.launcher).await {
            warn!(error = %e, "failed to stop orphaned instance");
        }
        Err(err)
    }
}
