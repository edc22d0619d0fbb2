//! Host key hashing and verification
//!
//! Privileged requests present the plain host key in the `X-Host-Key`
//! header. The server keeps only the SHA-256 digest of the configured key
//! and compares digests, so the plain key never needs to stay in memory
//! after startup.

use rand::Rng;
use sha2::{Digest, Sha256};

/// Header carrying the host key on privileged requests
pub const HOST_KEY_HEADER: &str = "x-host-key";

/// Host authentication errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostAuthError {
    /// No key supplied with the request
    MissingKey,

    /// Supplied key does not match the configured key
    InvalidKey,
}

impl std::fmt::Display for HostAuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HostAuthError::MissingKey => write!(f, "Missing host key"),
            HostAuthError::InvalidKey => write!(f, "Invalid host key"),
        }
    }
}

impl std::error::Error for HostAuthError {}

/// SHA-256 of the key as 64 lowercase hex characters
///
/// # Examples
///
/// ```
/// use ytq_common::api::auth::hash_host_key;
///
/// let hash = hash_host_key("0000");
/// assert_eq!(hash.len(), 64);
/// assert_eq!(hash, hash_host_key("0000"));
/// ```
pub fn hash_host_key(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Verify a supplied plain key against the stored digest
///
/// # Examples
///
/// ```
/// use ytq_common::api::auth::{hash_host_key, verify_host_key};
///
/// let stored = hash_host_key("secret");
/// assert!(verify_host_key(Some("secret"), &stored).is_ok());
/// assert!(verify_host_key(Some("guess"), &stored).is_err());
/// assert!(verify_host_key(None, &stored).is_err());
/// ```
pub fn verify_host_key(provided: Option<&str>, expected_hash: &str) -> Result<(), HostAuthError> {
    let provided = provided
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or(HostAuthError::MissingKey)?;

    let calculated = hash_host_key(provided);

    if digests_equal(calculated.as_bytes(), expected_hash.as_bytes()) {
        Ok(())
    } else {
        Err(HostAuthError::InvalidKey)
    }
}

/// Generate a random host key (32 hex characters)
///
/// Used when no key is configured so the host surface is never left open.
pub fn generate_host_key() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 16] = rng.gen();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

// Length check first, then compare every byte without early exit.
fn digests_equal(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_hex_sha256() {
        let hash = hash_host_key("0000");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        // Known SHA-256 of "0000"
        assert_eq!(
            hash,
            "9af15b336e6a9619928537df30b2e6a2376569fcf9d7e773eccede65606529a0"
        );
    }

    #[test]
    fn test_different_keys_different_hashes() {
        assert_ne!(hash_host_key("a"), hash_host_key("b"));
    }

    #[test]
    fn test_verify_accepts_matching_key() {
        let stored = hash_host_key("ytq-host");
        assert_eq!(verify_host_key(Some("ytq-host"), &stored), Ok(()));
    }

    #[test]
    fn test_verify_trims_whitespace() {
        let stored = hash_host_key("ytq-host");
        assert_eq!(verify_host_key(Some("  ytq-host \n"), &stored), Ok(()));
    }

    #[test]
    fn test_verify_rejects_wrong_key() {
        let stored = hash_host_key("ytq-host");
        assert_eq!(
            verify_host_key(Some("ytq-guest"), &stored),
            Err(HostAuthError::InvalidKey)
        );
    }

    #[test]
    fn test_verify_rejects_missing_or_blank_key() {
        let stored = hash_host_key("ytq-host");
        assert_eq!(verify_host_key(None, &stored), Err(HostAuthError::MissingKey));
        assert_eq!(verify_host_key(Some("   "), &stored), Err(HostAuthError::MissingKey));
    }

    #[test]
    fn test_generated_keys_are_random_hex() {
        let a = generate_host_key();
        let b = generate_host_key();
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }
}
