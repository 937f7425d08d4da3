//! Deterministic service fingerprints.
//!
//! A fingerprint identifies a (service id, serialized configuration)
//! pair and keys the dependency registry's pool map. Two registrations
//! with identical inputs always share one pool.

use hex::FromHexError;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};
use std::fmt;
use std::str::FromStr;

/// Length of a fingerprint in bytes (SHA3-256 digest size).
pub const FINGERPRINT_LEN: usize = 32;

/// Deterministic identifier for a (service id, configuration) pair.
///
/// Computed as `SHA3-256(service_id_bytes || SHA3-256(config_bytes))`.
/// Collisions are not distinguished from equality.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint([u8; FINGERPRINT_LEN]);

impl Fingerprint {
    /// Computes the fingerprint of a service identity and its
    /// serialized configuration.
    pub fn compute(service_id: &crate::ServiceId, config: &crate::ConfigBlob) -> Self {
        let config_digest = Sha3_256::digest(config.as_bytes());
        let mut hasher = Sha3_256::new();
        hasher.update(service_id.as_bytes());
        hasher.update(config_digest);
        Self(hasher.finalize().into())
    }

    /// Returns the raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; FINGERPRINT_LEN] {
        &self.0
    }

    /// Parses a fingerprint from its 64-character hex form.
    ///
    /// # Errors
    /// Returns `FromHexError` on malformed or wrong-length input.
    pub fn from_hex(s: &str) -> Result<Self, FromHexError> {
        let mut bytes = [0u8; FINGERPRINT_LEN];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The first 8 hex chars are plenty for log correlation.
        write!(f, "Fingerprint({}..)", &hex::encode(self.0)[..8])
    }
}

impl FromStr for Fingerprint {
    type Err = FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}
