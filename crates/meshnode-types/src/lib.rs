//! # meshnode-types
//!
//! Domain types for the meshnode dependency lifecycle engine.
//! This crate contains pure data types with zero external dependencies
//! (except serde for serialization and the digest primitives).

pub mod error;
pub mod fingerprint;
pub mod service;

// Re-exports for convenience.
pub use error::{DiagnosticError, ErrorKind, NodeError};
pub use fingerprint::Fingerprint;
pub use service::{ConfigBlob, ServiceId};
