//! Resource-manager callbacks (port).
//!
//! The memory-accounting subsystem lives outside this workspace; the
//! node only consumes these callbacks when negotiating headroom for new
//! instances.

use async_trait::async_trait;

use crate::error::GatewayError;

/// Callbacks exposed by the node's resource accounting subsystem.
#[async_trait]
pub trait ResourceManager: Send + Sync {
    /// Memory, in bytes, this node may currently allocate to instances.
    fn current_memory_limit(&self) -> u64;

    /// Requests a change of `delta` bytes to the node's allocation.
    /// Returns the updated limit on success.
    async fn request_resource_delta(&self, delta: i64) -> Result<u64, GatewayError>;
}
