//! API key authentication.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::error::{TodoError, TodoResult};

/// Validates presented API keys against the configured key.
///
/// Only the SHA-256 digest of the configured key is kept. Presented keys are
/// hashed too and the digests compared with `subtle`, so the comparison time
/// does not depend on the presented length or on where the first differing
/// byte is.
#[derive(Clone)]
pub struct ApiKeyValidator {
    expected: [u8; 32],
}

impl ApiKeyValidator {
    /// Create a validator for the configured key.
    pub fn new(configured_key: &str) -> Self {
        Self {
            expected: Self::hash_key(configured_key.trim()),
        }
    }

    /// Hash an API key for comparison.
    pub fn hash_key(key: &str) -> [u8; 32] {
        let mut digest = [0u8; 32];
        digest.copy_from_slice(&Sha256::digest(key.as_bytes()));
        digest
    }

    /// Short, non-reversible identifier for a presented key, for logs.
    pub fn fingerprint(key: &str) -> String {
        hex::encode(&Self::hash_key(key)[..4])
    }

    /// Check a presented key.
    ///
    /// Missing or empty keys are `Unauthorized`; keys that do not match after
    /// trimming surrounding whitespace are `Forbidden`.
    pub fn verify(&self, presented: Option<&str>) -> TodoResult<()> {
        let presented = match presented {
            Some(key) if !key.is_empty() => key.trim(),
            _ => {
                tracing::warn!("API key authentication failed: missing API key header");
                return Err(TodoError::Unauthorized(
                    "API key is required. Please provide X-API-Key header.".to_string(),
                ));
            }
        };

        if self.matches(presented) {
            return Ok(());
        }

        tracing::warn!(
            key_fingerprint = %Self::fingerprint(presented),
            "API key authentication failed: invalid API key provided"
        );
        Err(TodoError::Forbidden(
            "Invalid API key. Could not validate API key.".to_string(),
        ))
    }

    fn matches(&self, presented: &str) -> bool {
        Self::hash_key(presented)[..]
            .ct_eq(&self.expected[..])
            .into()
    }
}
