//! Shared fixtures for meshnode-lifecycle integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use meshnode_gateway::{
    AccessToken, GatewayError, LaunchRequest, LaunchedInstance, Launcher, LivenessProbe,
};
use meshnode_lifecycle::RegistrySettings;

/// In-memory launcher that allocates synthetic addresses and records
/// every start and stop.
pub struct MockLauncher {
    next_id: AtomicU64,
    started: Mutex<Vec<String>>,
    stopped: Mutex<Vec<String>>,
    fail_launches: AtomicBool,
    fail_stops: AtomicBool,
}

impl MockLauncher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            next_id: AtomicU64::new(1),
            started: Mutex::new(Vec::new()),
            stopped: Mutex::new(Vec::new()),
            fail_launches: AtomicBool::new(false),
            fail_stops: AtomicBool::new(false),
        })
    }

    /// Makes every subsequent launch fail with a remote error.
    pub fn fail_launches(&self, fail: bool) {
        self.fail_launches.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent stop fail as unreachable.
    pub fn fail_stops(&self, fail: bool) {
        self.fail_stops.store(fail, Ordering::SeqCst);
    }

    pub fn started_count(&self) -> usize {
        self.started.lock().expect("lock").len()
    }

    pub fn stopped_count(&self) -> usize {
        self.stopped.lock().expect("lock").len()
    }

    pub fn stopped_tokens(&self) -> Vec<String> {
        self.stopped.lock().expect("lock").clone()
    }
}

#[async_trait]
impl Launcher for MockLauncher {
    async fn start_instance(
        &self,
        request: &LaunchRequest,
    ) -> Result<LaunchedInstance, GatewayError> {
        if self.fail_launches.load(Ordering::SeqCst) {
            return Err(GatewayError::Remote {
                code: 14,
                message: "no capacity".into(),
            });
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let address = format!("10.1.0.{}:4040", id);
        self.started
            .lock()
            .expect("lock")
            .push(format!("{}@{}", request.service_id, address));
        Ok(LaunchedInstance {
            address,
            token: AccessToken::new(format!("token-{id}")),
        })
    }

    async fn stop_instance(&self, token: &AccessToken) -> Result<(), GatewayError> {
        if self.fail_stops.load(Ordering::SeqCst) {
            return Err(GatewayError::Unreachable {
                address: token.as_str().to_string(),
            });
        }
        self.stopped
            .lock()
            .expect("lock")
            .push(token.as_str().to_string());
        Ok(())
    }
}

/// Probe with a switchable answer.
pub struct StaticProbe {
    alive: AtomicBool,
}

impl StaticProbe {
    pub fn alive() -> Arc<Self> {
        Arc::new(Self {
            alive: AtomicBool::new(true),
        })
    }

    pub fn set_alive(&self, alive: bool) {
        self.alive.store(alive, Ordering::SeqCst);
    }
}

#[async_trait]
impl LivenessProbe for StaticProbe {
    async fn probe(&self, _address: &str, _timeout: Duration) -> bool {
        self.alive.load(Ordering::SeqCst)
    }
}

/// Probe that takes real wall-clock time and flags while in flight, for
/// verifying that the registry lock is never held across a probe.
pub struct SlowProbe {
    delay: Duration,
    in_flight: AtomicBool,
}

impl SlowProbe {
    pub fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            in_flight: AtomicBool::new(false),
        })
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LivenessProbe for SlowProbe {
    async fn probe(&self, _address: &str, _timeout: Duration) -> bool {
        self.in_flight.store(true, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.store(false, Ordering::SeqCst);
        true
    }
}

/// Registry settings pointed at a fake gateway, with the given
/// maintenance interval.
pub fn settings(maintenance_interval: Duration) -> RegistrySettings {
    RegistrySettings {
        node_address: "127.0.0.1:4040".into(),
        maintenance_interval,
        ..RegistrySettings::default()
    }
}
