//! Lifecycle metrics.
//!
//! Tracks key counters using lock-free atomics for zero-overhead
//! recording from concurrent tasks. Use [`MetricsSnapshot`] for
//! human-readable output.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Shared, thread-safe counters for the dependency lifecycle engine.
///
/// All fields are `AtomicU64`; incrementing from any task is safe.
#[derive(Debug, Default)]
pub struct LifecycleMetrics {
    /// Instances launched through the gateway.
    pub instances_launched: AtomicU64,
    /// Acquisitions served from a pool instead of a launch.
    pub instances_reused: AtomicU64,
    /// Handles returned to a pool after use.
    pub instances_released: AtomicU64,
    /// Handles explicitly discarded by callers.
    pub instances_discarded: AtomicU64,
    /// Handles evicted by maintenance for sitting idle too long.
    pub evicted_idle: AtomicU64,
    /// Handles evicted as zombies (chronic failure or unreachable).
    pub evicted_zombie: AtomicU64,
    /// Launch attempts the gateway failed.
    pub launch_failures: AtomicU64,
}

/// A point-in-time snapshot of [`LifecycleMetrics`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Instances launched.
    pub instances_launched: u64,
    /// Acquisitions served from a pool.
    pub instances_reused: u64,
    /// Handles released back to a pool.
    pub instances_released: u64,
    /// Handles explicitly discarded.
    pub instances_discarded: u64,
    /// Idle evictions.
    pub evicted_idle: u64,
    /// Zombie evictions.
    pub evicted_zombie: u64,
    /// Failed launches.
    pub launch_failures: u64,
}

impl LifecycleMetrics {
    /// Creates a new zeroed metrics instance wrapped in an [`Arc`].
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Records a successful launch.
    pub fn record_launch(&self) {
        self.instances_launched.fetch_add(1, Ordering::Relaxed);
    }

    /// Records an acquisition served from the pool.
    pub fn record_reuse(&self) {
        self.instances_reused.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a handle returned to its pool.
    pub fn record_release(&self) {
        self.instances_released.fetch_add(1, Ordering::Relaxed);
    }

    /// Records an explicit discard.
    pub fn record_discard(&self) {
        self.instances_discarded.fetch_add(1, Ordering::Relaxed);
    }

    /// Records an idle eviction by the maintenance loop.
    pub fn record_idle_eviction(&self) {
        self.evicted_idle.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a zombie eviction.
    pub fn record_zombie_eviction(&self) {
        self.evicted_zombie.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a launch the gateway failed.
    pub fn record_launch_failure(&self) {
        self.launch_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns a point-in-time snapshot of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            instances_launched: self.instances_launched.load(Ordering::Relaxed),
            instances_reused: self.instances_reused.load(Ordering::Relaxed),
            instances_released: self.instances_released.load(Ordering::Relaxed),
            instances_discarded: self.instances_discarded.load(Ordering::Relaxed),
            evicted_idle: self.evicted_idle.load(Ordering::Relaxed),
            evicted_zombie: self.evicted_zombie.load(Ordering::Relaxed),
            launch_failures: self.launch_failures.load(Ordering::Relaxed),
        }
    }
}
