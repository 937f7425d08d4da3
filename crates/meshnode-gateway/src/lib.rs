//! # meshnode-gateway
//!
//! Port definitions (abstract traits) for the meshnode external
//! collaborators: the launcher gateway that starts and stops remote
//! instances, the liveness probe, and the resource-manager callbacks.
//! Transport crates implement these traits; the lifecycle engine only
//! sees the contracts defined here.

pub mod error;
pub mod launcher;
pub mod probe;
pub mod resource;

pub use error::GatewayError;
pub use launcher::{AccessToken, DirectoryHints, LaunchRequest, LaunchedInstance, Launcher};
pub use probe::{LivenessProbe, TcpProbe};
pub use resource::ResourceManager;
