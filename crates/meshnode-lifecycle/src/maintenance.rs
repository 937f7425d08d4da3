//! Background maintenance of service pools.
//!
//! A perpetual task sweeps the pools round-robin at a fixed interval,
//! stopping instances that sat idle past the horizon or turned zombie.
//! The registry lock is held only for queue bookkeeping, never across a
//! probe or a remote stop, so callers are never starved by slow health
//! checks.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::registry::RegistryShared;

/// The spawned maintenance loop. Cancelling the token stops the loop at
/// the next checkpoint; dropping the task cancels without joining.
pub(crate) struct MaintenanceTask {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl MaintenanceTask {
    /// Spawns the loop on the current runtime.
    pub(crate) fn spawn(shared: Arc<RegistryShared>) -> Self {
        let token = CancellationToken::new();
        let loop_token = token.clone();
        let handle = tokio::spawn(async move { run(shared, loop_token).await });
        Self { token, handle }
    }

    /// Cancels the loop and waits for it to exit.
    pub(crate) async fn shutdown(mut self) {
        self.token.cancel();
        let _ = (&mut self.handle).await;
    }
}

impl Drop for MaintenanceTask {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

async fn run(shared: Arc<RegistryShared>, token: CancellationToken) {
    let interval = shared.settings.maintenance_interval;
    loop {
        tokio::select! {
            () = token.cancelled() => {
                debug!("maintenance loop cancelled");
                return;
            }
            () = tokio::time::sleep(interval) => {}
        }
        sweep(&shared).await;
        if token.is_cancelled() {
            debug!("maintenance loop cancelled");
            return;
        }
    }
}

/// One bounded, resumable round-robin pass over all pools.
///
/// Per iteration: lock, read the pool at the scan index, pop one handle
/// from the deep end, unlock. Inspection and any stop call then run
/// outside the lock. Each pool contributes at most one handle per
/// round; survivors go back on the deep end so the pool rotates and
/// every idle handle is eventually inspected. A pool that errors is
/// logged and skipped; the sweep itself never fails.
pub(crate) async fn sweep(shared: &RegistryShared) {
    let horizon = shared.settings.maintenance_interval;
    let mut index = 0usize;
    loop {
        let popped = {
            let mut inner = shared.inner.lock().await;
            let Some(&fingerprint) = inner.order.get(index) else {
                debug!(pools = index, "all pools toured");
                break;
            };
            index += 1;
            match inner.pools.get_mut(&fingerprint) {
                Some(pool) => {
                    let policy = pool.policy();
                    pool.pop_front().map(|handle| (fingerprint, handle, policy))
                }
                None => {
                    // Scan list and map disagree; skip this pool for
                    // the round rather than abort the sweep.
                    warn!(%fingerprint, "pool missing during sweep");
                    None
                }
            }
        };
        let Some((fingerprint, handle, policy)) = popped else {
            continue;
        };

        // Probe and stop calls run with the lock released.
        if handle.idle_longer_than(horizon) {
            debug!(%fingerprint, address = handle.address(), "evicting idle instance");
            shared.metrics.record_idle_eviction();
            stop_quietly(shared, handle).await;
        } else if handle.is_zombie(&policy).await {
            debug!(%fingerprint, address = handle.address(), "evicting zombie instance");
            shared.metrics.record_zombie_eviction();
            stop_quietly(shared, handle).await;
        } else {
            let mut inner = shared.inner.lock().await;
            match inner.pools.get_mut(&fingerprint) {
                Some(pool) => pool.push_front(handle),
                None => {
                    // The pool vanished while we held the handle; stop
                    // the instance rather than leak it.
                    drop(inner);
                    warn!(%fingerprint, "pool removed mid-inspection, stopping instance");
                    stop_quietly(shared, handle).await;
                }
            }
        }
    }
}

/// Stops an instance, logging failures instead of propagating them: a
/// stop the gateway refused leaves the token for the gateway to reap,
/// and one bad pool must never halt the sweep.
async fn stop_quietly(shared: &RegistryShared, handle: crate::handle::InstanceHandle) {
    let address = handle.address().to_string();
    if let Err(e) = handle.stop(&*shared.launcher).await {
        warn!(address, error = %e, "failed to stop instance");
    }
}
