//! Instance handles and zombie classification.
//!
//! An acquired handle must end up either back in its pool or explicitly
//! stopped. Failing to do so leaves the instance as a permanent zombie
//! on the network, still consuming remote resources — the single worst
//! bug this design defends against.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use meshnode_gateway::{AccessToken, GatewayError, Launcher, LivenessProbe};

use crate::pool::PoolPolicy;

/// Grace period before counting an error against an instance, so that
/// instances still warming up are not condemned for a slow start.
const ERROR_WARMUP_GRACE: Duration = Duration::from_secs(1);

/// How a remote-call failure counts against a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Deadline-class failure; feeds the pass-timeout counter.
    Timeout,
    /// Any other failure; feeds the failed-attempts counter.
    Error,
}

/// One running remote instance: its address, stop token, and health
/// counters.
///
/// Lifecycle: Pooled → Acquired → {Pooled | Zombie (evicted) | Stopped
/// (discarded)}. Counters are mutated only by the exclusive holder
/// while acquired, or by the maintenance loop while pooled.
pub struct InstanceHandle {
    address: String,
    token: AccessToken,
    created_at: Instant,
    last_used_at: Instant,
    pass_timeout_count: u32,
    failed_attempts_count: u32,
    probe: Arc<dyn LivenessProbe>,
}

impl InstanceHandle {
    /// Wraps a freshly launched instance. Both counters start at zero.
    pub fn new(address: String, token: AccessToken, probe: Arc<dyn LivenessProbe>) -> Self {
        let now = Instant::now();
        Self {
            address,
            token,
            created_at: now,
            last_used_at: now,
            pass_timeout_count: 0,
            failed_attempts_count: 0,
            probe,
        }
    }

    /// Reachable `ip:port` of the instance.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// When the instance was launched.
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Number of deadline-class failures since the last success.
    pub fn pass_timeout_count(&self) -> u32 {
        self.pass_timeout_count
    }

    /// Number of other failures since the last success.
    pub fn failed_attempts_count(&self) -> u32 {
        self.failed_attempts_count
    }

    /// Refreshes `last_used_at`; called on every acquisition.
    pub fn touch(&mut self) {
        self.last_used_at = Instant::now();
    }

    /// True if the handle has sat unused for longer than `horizon`.
    pub fn idle_longer_than(&self, horizon: Duration) -> bool {
        self.last_used_at.elapsed() > horizon
    }

    /// Records a deadline-class failure of a caller's remote call.
    pub fn mark_timeout_occurred(&mut self) {
        self.pass_timeout_count += 1;
    }

    /// Records a non-deadline failure, after the warm-up grace period.
    pub async fn mark_error(&mut self) {
        tokio::time::sleep(ERROR_WARMUP_GRACE).await;
        self.failed_attempts_count += 1;
    }

    /// Clears both counters. Called after any successful remote call:
    /// an instance is only evicted for sustained trouble, never a blip.
    pub fn reset_counters(&mut self) {
        self.pass_timeout_count = 0;
        self.failed_attempts_count = 0;
    }

    /// Classifies a remote-call failure and applies the matching mark.
    ///
    /// Callers must invoke this (through the facade) after every failed
    /// remote invocation; the handle does not intercept calls itself.
    pub async fn record_failure(&mut self, err: &GatewayError) -> FailureKind {
        if err.is_deadline() {
            self.mark_timeout_occurred();
            FailureKind::Timeout
        } else {
            self.mark_error().await;
            FailureKind::Error
        }
    }

    /// Decides whether this instance should be stopped rather than
    /// reused.
    ///
    /// True iff the failed-attempts threshold is exceeded, or the
    /// pass-timeout threshold is exceeded AND the liveness probe fails
    /// within the policy timeout. The probe is consulted only once the
    /// pass-timeout threshold is already over, avoiding a network round
    /// trip on every maintenance pass.
    pub async fn is_zombie(&self, policy: &PoolPolicy) -> bool {
        if self.failed_attempts_count > policy.failed_attempts {
            return true;
        }
        if self.pass_timeout_count > policy.pass_timeout_times {
            return !self.probe.probe(&self.address, policy.timeout).await;
        }
        false
    }

    /// Stops the remote instance through the launcher, consuming the
    /// handle. Stopped is terminal.
    ///
    /// # Errors
    /// Propagates the gateway failure; the handle is gone either way.
    pub async fn stop(self, launcher: &dyn Launcher) -> Result<(), GatewayError> {
        launcher.stop_instance(&self.token).await
    }
}

impl fmt::Debug for InstanceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceHandle")
            .field("address", &self.address)
            .field("pass_timeout_count", &self.pass_timeout_count)
            .field("failed_attempts_count", &self.failed_attempts_count)
            .finish_non_exhaustive()
    }
}
