//! Integration tests for `ServiceFacade` acquire/release semantics.

mod common;

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::{settings, MockLauncher, StaticProbe};
use meshnode_gateway::{GatewayError, LivenessProbe};
use meshnode_lifecycle::{
    CallOutcome, DependencyRegistry, LifecycleError, RegisterOptions, ServiceFacade,
};
use meshnode_types::{ConfigBlob, ServiceId};

fn sid(s: &str) -> ServiceId {
    ServiceId::new(s).expect("id")
}

fn remote_error() -> GatewayError {
    GatewayError::Remote {
        code: 13,
        message: "instance crashed".into(),
    }
}

fn deadline_error() -> GatewayError {
    GatewayError::DeadlineExceeded { timeout_ms: 30_000 }
}

async fn registry_and_facade(
    launcher: Arc<MockLauncher>,
    options: RegisterOptions,
) -> (DependencyRegistry, ServiceFacade) {
    let registry =
        DependencyRegistry::new(settings(Duration::from_secs(3600)), launcher).expect("registry");
    let facade = registry
        .register(sid("svc"), ConfigBlob::empty(), options)
        .await
        .expect("register");
    (registry, facade)
}

#[tokio::test]
async fn acquire_launches_when_pool_is_empty() {
    let launcher = MockLauncher::new();
    let (registry, facade) =
        registry_and_facade(Arc::clone(&launcher), RegisterOptions::default()).await;

    let handle = facade.acquire().await.expect("acquire");
    assert_eq!(launcher.started_count(), 1);

    facade
        .release(handle, CallOutcome::Success)
        .await
        .expect("release");
    assert_eq!(registry.metrics().snapshot().instances_launched, 1);
    registry.shutdown().await;
}

#[tokio::test]
async fn release_then_acquire_reuses_the_instance() {
    let launcher = MockLauncher::new();
    let (registry, facade) =
        registry_and_facade(Arc::clone(&launcher), RegisterOptions::default()).await;

    let first = facade.acquire().await.expect("acquire");
    let address = first.address().to_string();
    facade
        .release(first, CallOutcome::Success)
        .await
        .expect("release");

    let second = facade.acquire().await.expect("acquire");
    assert_eq!(second.address(), address);
    assert_eq!(launcher.started_count(), 1, "no second launch");
    assert_eq!(registry.metrics().snapshot().instances_reused, 1);

    facade
        .release(second, CallOutcome::Success)
        .await
        .expect("release");
    registry.shutdown().await;
}

#[tokio::test]
async fn launch_failure_propagates_to_caller() {
    let launcher = MockLauncher::new();
    launcher.fail_launches(true);
    let (registry, facade) =
        registry_and_facade(Arc::clone(&launcher), RegisterOptions::default()).await;

    let result = facade.acquire().await;
    assert!(
        matches!(result, Err(LifecycleError::Gateway(GatewayError::Remote { .. }))),
        "launcher errors must propagate unchanged",
    );
    assert_eq!(registry.metrics().snapshot().launch_failures, 1);
    registry.shutdown().await;
}

/// Scenario A: with `failed_attempts = 3`, a handle that accumulates
/// four consecutive errors is classified zombie on release and stopped,
/// never returned to the pool.
#[tokio::test(start_paused = true)]
async fn sustained_errors_evict_the_instance_on_release() {
    let launcher = MockLauncher::new();
    let (registry, facade) = registry_and_facade(
        Arc::clone(&launcher),
        RegisterOptions {
            failed_attempts: Some(3),
            probe: Some(StaticProbe::alive() as Arc<dyn LivenessProbe>),
            ..RegisterOptions::default()
        },
    )
    .await;

    let mut handle = facade.acquire().await.expect("acquire");
    for _ in 0..3 {
        handle.record_failure(&remote_error()).await;
    }
    // The fourth consecutive error pushes the counter past the
    // threshold; release must stop the instance.
    facade
        .release(handle, CallOutcome::Failure(remote_error()))
        .await
        .expect("release");

    assert_eq!(launcher.stopped_count(), 1);
    let stats = registry
        .pool_stats(&facade.fingerprint())
        .await
        .expect("stats");
    assert_eq!(stats.idle, 0, "zombie must not return to the pool");
    assert_eq!(registry.metrics().snapshot().evicted_zombie, 1);
    registry.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn single_error_returns_the_instance_to_the_pool() {
    let launcher = MockLauncher::new();
    let (registry, facade) =
        registry_and_facade(Arc::clone(&launcher), RegisterOptions::default()).await;

    let handle = facade.acquire().await.expect("acquire");
    facade
        .release(handle, CallOutcome::Failure(remote_error()))
        .await
        .expect("release");

    assert_eq!(launcher.stopped_count(), 0, "one blip is not a zombie");
    let stats = registry
        .pool_stats(&facade.fingerprint())
        .await
        .expect("stats");
    assert_eq!(stats.idle, 1);
    registry.shutdown().await;
}

#[tokio::test]
async fn repeated_deadlines_trigger_probe_and_evict_dead_instance() {
    let launcher = MockLauncher::new();
    let probe = StaticProbe::alive();
    let (registry, facade) = registry_and_facade(
        Arc::clone(&launcher),
        RegisterOptions {
            pass_timeout_times: Some(1),
            probe: Some(Arc::clone(&probe) as Arc<dyn LivenessProbe>),
            ..RegisterOptions::default()
        },
    )
    .await;

    // First deadline: below threshold, pooled without probing.
    let handle = facade.acquire().await.expect("acquire");
    facade
        .release(handle, CallOutcome::Failure(deadline_error()))
        .await
        .expect("release");
    assert_eq!(launcher.stopped_count(), 0);

    // Second deadline: threshold exceeded, but the probe still answers.
    let handle = facade.acquire().await.expect("acquire");
    facade
        .release(handle, CallOutcome::Failure(deadline_error()))
        .await
        .expect("release");
    assert_eq!(launcher.stopped_count(), 0, "reachable instance survives");

    // Third deadline with the instance gone dark: evicted.
    probe.set_alive(false);
    let handle = facade.acquire().await.expect("acquire");
    facade
        .release(handle, CallOutcome::Failure(deadline_error()))
        .await
        .expect("release");
    assert_eq!(launcher.stopped_count(), 1);
    assert_eq!(registry.metrics().snapshot().evicted_zombie, 1);
    registry.shutdown().await;
}

#[tokio::test]
async fn success_resets_counters_accumulated_earlier() {
    let launcher = MockLauncher::new();
    let (registry, facade) = registry_and_facade(
        Arc::clone(&launcher),
        RegisterOptions {
            pass_timeout_times: Some(1),
            probe: Some(StaticProbe::alive() as Arc<dyn LivenessProbe>),
            ..RegisterOptions::default()
        },
    )
    .await;

    let mut handle = facade.acquire().await.expect("acquire");
    handle.mark_timeout_occurred();
    handle.mark_timeout_occurred();
    // A success wipes the slate; the next deadline starts from zero.
    facade
        .release(handle, CallOutcome::Success)
        .await
        .expect("release");

    let handle = facade.acquire().await.expect("acquire");
    assert_eq!(handle.pass_timeout_count(), 0);
    facade
        .release(handle, CallOutcome::Failure(deadline_error()))
        .await
        .expect("release");
    assert_eq!(launcher.stopped_count(), 0);
    registry.shutdown().await;
}

/// A refused stop during zombie eviction is logged, not surfaced:
/// release still succeeds and the handle never returns to the pool.
#[tokio::test(start_paused = true)]
async fn zombie_release_succeeds_when_stop_fails() {
    let launcher = MockLauncher::new();
    let (registry, facade) = registry_and_facade(
        Arc::clone(&launcher),
        RegisterOptions {
            failed_attempts: Some(0),
            ..RegisterOptions::default()
        },
    )
    .await;

    let handle = facade.acquire().await.expect("acquire");
    launcher.fail_stops(true);
    facade
        .release(handle, CallOutcome::Failure(remote_error()))
        .await
        .expect("release must swallow the stop failure");

    assert_eq!(launcher.stopped_count(), 0, "the stop never went through");
    assert_eq!(registry.metrics().snapshot().evicted_zombie, 1);
    let stats = registry
        .pool_stats(&facade.fingerprint())
        .await
        .expect("stats");
    assert_eq!(stats.idle, 0, "the zombie stays out of the pool");
    registry.shutdown().await;
}

#[tokio::test]
async fn discard_stops_the_instance() {
    let launcher = MockLauncher::new();
    let (registry, facade) =
        registry_and_facade(Arc::clone(&launcher), RegisterOptions::default()).await;

    let handle = facade.acquire().await.expect("acquire");
    facade.discard(handle).await.expect("discard");

    assert_eq!(launcher.stopped_count(), 1);
    let stats = registry
        .pool_stats(&facade.fingerprint())
        .await
        .expect("stats");
    assert_eq!(stats.idle, 0);
    assert_eq!(registry.metrics().snapshot().instances_discarded, 1);
    registry.shutdown().await;
}

/// Single-owner invariant: across concurrent acquire/release cycles, no
/// instance address is ever held by two tasks at once.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_cycles_never_share_an_instance() {
    let launcher = MockLauncher::new();
    let (registry, facade) =
        registry_and_facade(Arc::clone(&launcher), RegisterOptions::default()).await;

    let in_use: Arc<Mutex<HashSet<String>>> = Arc::new(Mutex::new(HashSet::new()));
    let mut tasks = Vec::new();
    for _ in 0..8 {
        let facade = facade.clone();
        let in_use = Arc::clone(&in_use);
        tasks.push(tokio::spawn(async move {
            for _ in 0..10 {
                let handle = facade.acquire().await.expect("acquire");
                let address = handle.address().to_string();
                assert!(
                    in_use.lock().expect("lock").insert(address.clone()),
                    "instance {address} held by two callers",
                );
                tokio::task::yield_now().await;
                assert!(in_use.lock().expect("lock").remove(&address));
                facade
                    .release(handle, CallOutcome::Success)
                    .await
                    .expect("release");
            }
        }));
    }
    for task in tasks {
        task.await.expect("join");
    }

    assert_eq!(launcher.stopped_count(), 0);
    let stats = registry
        .pool_stats(&facade.fingerprint())
        .await
        .expect("stats");
    assert_eq!(stats.idle, launcher.started_count());
    registry.shutdown().await;
}
