//! Liveness probing of remote instances.
//!
//! The default probe is a bare TCP connectivity check with no protocol
//! handshake; services with richer health endpoints can supply their
//! own implementation at registration time.

use async_trait::async_trait;
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::debug;

/// Abstract liveness probe: "is this instance reachable within the
/// timeout". A `false` answer is evidence, not proof, of death; the
/// lifecycle engine only consults it once a handle's counters already
/// look suspicious.
#[async_trait]
pub trait LivenessProbe: Send + Sync {
    /// Returns true if `address` answered within `timeout`.
    async fn probe(&self, address: &str, timeout: Duration) -> bool;
}

/// Default probe: attempt a TCP connection, nothing more.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpProbe;

#[async_trait]
impl LivenessProbe for TcpProbe {
    async fn probe(&self, address: &str, timeout: Duration) -> bool {
        match tokio::time::timeout(timeout, TcpStream::connect(address)).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                debug!(address, error = %e, "liveness probe refused");
                false
            }
            Err(_) => {
                debug!(address, timeout_ms = timeout.as_millis() as u64, "liveness probe timed out");
                false
            }
        }
    }
}
