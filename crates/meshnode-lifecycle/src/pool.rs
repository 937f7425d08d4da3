//! Per-fingerprint pools of idle instance handles.
//!
//! The pool is a double-ended queue worked from both ends: callers pop
//! and push at the back, so the most recently released instance is
//! reacquired first (warm reconnect); the maintenance loop pops and
//! pushes at the front, so the longest-idle instance surfaces first and
//! the pool rotates until every idle handle has been inspected.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use meshnode_gateway::{DirectoryHints, LaunchRequest, Launcher, LivenessProbe};
use meshnode_types::{ConfigBlob, Fingerprint, ServiceId};

use crate::error::LifecycleError;
use crate::handle::InstanceHandle;

/// Eviction thresholds and launch flags for one service pool, fixed at
/// registration time.
#[derive(Debug, Clone, Copy)]
pub struct PoolPolicy {
    /// Per-call and probe timeout.
    pub timeout: Duration,
    /// Failed attempts after which a handle is a zombie outright.
    pub failed_attempts: u32,
    /// Passed timeouts after which the liveness probe is consulted.
    pub pass_timeout_times: u32,
    /// True when the service was acquired dynamically through the API.
    pub dynamic: bool,
}

/// Idle instances and launch parameters for one fingerprint.
///
/// Invariant: a handle is in at most one pool's idle queue at any time,
/// and never idle and acquired simultaneously. All mutation happens
/// under the registry lock; launching happens outside it via
/// [`LaunchPlan`].
pub struct ServicePool {
    service_id: ServiceId,
    fingerprint: Fingerprint,
    config: ConfigBlob,
    policy: PoolPolicy,
    locality: DirectoryHints,
    recursion_guard: Option<String>,
    probe: Arc<dyn LivenessProbe>,
    idle: VecDeque<InstanceHandle>,
}

impl ServicePool {
    /// Creates an empty pool for a fingerprint.
    pub fn new(
        service_id: ServiceId,
        fingerprint: Fingerprint,
        config: ConfigBlob,
        policy: PoolPolicy,
        locality: DirectoryHints,
        recursion_guard: Option<String>,
        probe: Arc<dyn LivenessProbe>,
    ) -> Self {
        Self {
            service_id,
            fingerprint,
            config,
            policy,
            locality,
            recursion_guard,
            probe,
            idle: VecDeque::new(),
        }
    }

    /// The service identity this pool launches.
    pub fn service_id(&self) -> &ServiceId {
        &self.service_id
    }

    /// The fingerprint keying this pool.
    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    /// The pool's eviction policy.
    pub fn policy(&self) -> PoolPolicy {
        self.policy
    }

    /// Number of idle handles currently pooled.
    pub fn idle_len(&self) -> usize {
        self.idle.len()
    }

    /// Returns a pooled handle to a caller: freshest instance first.
    /// `None` is the normal "must launch" signal, not a failure.
    pub fn pop_back(&mut self) -> Option<InstanceHandle> {
        self.idle.pop_back()
    }

    /// Returns a pooled handle to the maintenance loop: longest-idle
    /// instance first.
    pub fn pop_front(&mut self) -> Option<InstanceHandle> {
        self.idle.pop_front()
    }

    /// Releases a handle at the caller end, favored for reacquisition.
    pub fn push_back(&mut self, handle: InstanceHandle) {
        self.idle.push_back(handle);
    }

    /// Re-inserts a handle at the deep end after a maintenance
    /// inspection, rotating the pool.
    pub fn push_front(&mut self, handle: InstanceHandle) {
        self.idle.push_front(handle);
    }

    /// Prepares a launch of one new instance of this service.
    ///
    /// The plan borrows nothing from the pool, so the registry lock can
    /// be dropped before the launcher is called.
    pub fn launch_plan(&self) -> LaunchPlan {
        LaunchPlan {
            request: LaunchRequest {
                service_id: self.service_id.clone(),
                hash_tag: self.fingerprint,
                config: self.config.clone(),
                locality: self.locality.clone(),
                recursion_guard: self.recursion_guard.clone(),
                dynamic: self.policy.dynamic,
            },
            probe: Arc::clone(&self.probe),
        }
    }
}

/// A detached launch of one instance, executed outside the registry
/// lock.
pub struct LaunchPlan {
    request: LaunchRequest,
    probe: Arc<dyn LivenessProbe>,
}

impl LaunchPlan {
    /// Starts the instance through the launcher and binds the returned
    /// address and token into a fresh handle.
    ///
    /// # Errors
    /// Launcher failures propagate unchanged.
    pub async fn launch(self, launcher: &dyn Launcher) -> Result<InstanceHandle, LifecycleError> {
        let launched = launcher.start_instance(&self.request).await?;
        Ok(InstanceHandle::new(
            launched.address,
            launched.token,
            self.probe,
        ))
    }
}
