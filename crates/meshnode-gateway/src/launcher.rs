//! Abstract launcher trait (port) for the remote gateway.

use async_trait::async_trait;
use meshnode_types::{ConfigBlob, Fingerprint, ServiceId};
use std::fmt;

use crate::error::GatewayError;

/// Opaque capability token returned by the gateway for a launched
/// instance. Required to stop the instance later; never interpreted.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wraps a token string handed out by the gateway.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Tokens are credentials; never log them whole. Suffix by
        // chars, not bytes: gateways are free to hand out non-ASCII.
        let start = self
            .0
            .char_indices()
            .rev()
            .take(4)
            .last()
            .map_or(self.0.len(), |(i, _)| i);
        write!(f, "AccessToken(..{})", &self.0[start..])
    }
}

/// Opaque registry locations forwarded to the launcher so it can find
/// the service definition and metadata on this node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryHints {
    /// Directory holding immutable service definitions.
    pub static_service: String,
    /// Directory holding immutable service metadata.
    pub static_metadata: String,
    /// Directory for definitions acquired at runtime.
    pub dynamic_service: String,
    /// Directory for metadata acquired at runtime.
    pub dynamic_metadata: String,
}

/// Everything the gateway needs to start one instance of a service.
#[derive(Debug, Clone)]
pub struct LaunchRequest {
    /// Identity of the service to launch.
    pub service_id: ServiceId,
    /// Fingerprint of the (service, config) pair, sent as the hash tag.
    pub hash_tag: Fingerprint,
    /// Serialized configuration, forwarded verbatim.
    pub config: ConfigBlob,
    /// Registry locations on this node.
    pub locality: DirectoryHints,
    /// Opaque guard forwarded so the gateway can break launch cycles
    /// (a service transitively depending on itself).
    pub recursion_guard: Option<String>,
    /// True when the service was acquired dynamically through the API.
    pub dynamic: bool,
}

/// One running remote instance as reported by the gateway.
#[derive(Debug, Clone)]
pub struct LaunchedInstance {
    /// Reachable `ip:port` address of the instance.
    pub address: String,
    /// Capability token used to stop the instance.
    pub token: AccessToken,
}

/// Abstract trait for the remote launcher gateway.
///
/// Implementations live in transport crates. The lifecycle engine calls
/// these operations strictly outside its registry lock.
#[async_trait]
pub trait Launcher: Send + Sync {
    /// Starts a new instance of the requested service.
    async fn start_instance(
        &self,
        request: &LaunchRequest,
    ) -> Result<LaunchedInstance, GatewayError>;

    /// Stops the instance identified by `token`.
    async fn stop_instance(&self, token: &AccessToken) -> Result<(), GatewayError>;
}
