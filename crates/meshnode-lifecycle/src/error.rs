//! Lifecycle-specific error types.

use meshnode_gateway::GatewayError;
use meshnode_types::{DiagnosticError, ErrorKind, NodeError};
use thiserror::Error;

/// Errors from the dependency lifecycle engine.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Registry construction parameters are missing or invalid.
    /// Fatal: the node cannot launch or stop instances without them.
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },
    /// No pool is registered under this fingerprint.
    #[error("unknown service: {fingerprint}")]
    UnknownService { fingerprint: String },
    /// A gateway call failed. Launch failures propagate unchanged to
    /// the caller; there is no local recovery without a live instance.
    #[error("gateway call failed: {0}")]
    Gateway(#[from] GatewayError),
}

impl From<LifecycleError> for NodeError {
    fn from(e: LifecycleError) -> Self {
        let kind = match &e {
            LifecycleError::InvalidConfig { .. } => ErrorKind::InvalidInput,
            LifecycleError::UnknownService { .. } => ErrorKind::NotFound,
            LifecycleError::Gateway(g) => NodeError::from(g.clone()).kind,
        };
        NodeError::new(kind, e.to_string())
    }
}

impl DiagnosticError for LifecycleError {
    fn hint(&self) -> Option<String> {
        match self {
            Self::InvalidConfig { .. } => {
                Some("The registry needs a gateway address to launch and stop instances.".into())
            }
            Self::UnknownService { fingerprint } => Some(format!(
                "No service with fingerprint '{fingerprint}' was registered on this node."
            )),
            Self::Gateway(_) => {
                Some("The gateway rejected or failed the remote call.".into())
            }
        }
    }

    fn fix(&self) -> Option<String> {
        match self {
            Self::InvalidConfig { .. } => Some(
                "Set the gateway address in meshnode.toml:\n  [gateway]\n  address = \"ip:port\""
                    .into(),
            ),
            Self::UnknownService { .. } => {
                Some("Register the service first via DependencyRegistry::register.".into())
            }
            Self::Gateway(_) => None,
        }
    }
}
