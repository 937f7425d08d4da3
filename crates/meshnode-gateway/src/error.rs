//! Gateway-side error taxonomy.

use meshnode_types::{ErrorKind, NodeError};
use thiserror::Error;

/// Errors surfaced by remote calls through the gateway or against a
/// running instance.
///
/// The lifecycle engine classifies every failure into exactly two
/// buckets: deadline-class (`is_deadline() == true`) feeds the handle's
/// pass-timeout counter, everything else feeds the failed-attempts
/// counter.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// The remote call did not complete within its deadline.
    #[error("deadline exceeded after {timeout_ms}ms")]
    DeadlineExceeded { timeout_ms: u64 },
    /// The peer could not be reached at all.
    #[error("peer unreachable: {address}")]
    Unreachable { address: String },
    /// The remote side answered with an application-level error.
    #[error("remote error (code {code}): {message}")]
    Remote { code: u32, message: String },
    /// The response could not be decoded.
    #[error("protocol error: {message}")]
    Protocol { message: String },
}

impl GatewayError {
    /// True for deadline-class failures.
    ///
    /// Mirrors the wire-level DEADLINE_EXCEEDED status; the lifecycle
    /// engine maps these to a pass-timeout mark rather than a failed
    /// attempt.
    pub fn is_deadline(&self) -> bool {
        matches!(self, Self::DeadlineExceeded { .. })
    }
}

impl From<GatewayError> for NodeError {
    fn from(e: GatewayError) -> Self {
        let kind = match &e {
            GatewayError::DeadlineExceeded { .. } => ErrorKind::Timeout,
            GatewayError::Unreachable { .. } => ErrorKind::Unavailable,
            GatewayError::Remote { .. } => ErrorKind::Internal,
            GatewayError::Protocol { .. } => ErrorKind::Internal,
        };
        NodeError::new(kind, e.to_string())
    }
}
