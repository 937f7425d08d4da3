//! Service identity and opaque configuration blob.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::NodeError;

/// Identity of a service specification, as published on the network.
///
/// Usually the hex digest of the service definition, but treated as an
/// opaque non-empty string here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceId(String);

impl ServiceId {
    /// Creates a service id, rejecting the empty string.
    ///
    /// # Errors
    /// Returns `InvalidInput` if `id` is empty.
    pub fn new(id: impl Into<String>) -> Result<Self, NodeError> {
        let id = id.into();
        if id.is_empty() {
            return Err(NodeError::invalid_input("service id must not be empty"));
        }
        Ok(Self(id))
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the id as raw bytes, as fed to the fingerprint digest.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque serialized service configuration.
///
/// The engine never interprets these bytes; they only feed the
/// fingerprint digest and travel to the launcher verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigBlob(Vec<u8>);

impl ConfigBlob {
    /// Wraps serialized configuration bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// An empty configuration (the default for services launched bare).
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Returns the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns true if no configuration was supplied.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for ConfigBlob {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}
