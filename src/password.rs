//! Password hashing and verification.
//!
//! Hashes are PBKDF2-HMAC-SHA-256 with a fresh 16-byte salt per call and a
//! 32-byte derived digest, stored as `"<b64 salt>.<b64 digest>"`.

use std::fmt;
use std::str::FromStr;

use hmac::Hmac;
use rand_core::{OsRng, RngCore};
use sha2::Sha256;
use thiserror::Error;

use crate::encoding::{constant_time_eq, from_b64, to_b64};

pub const PBKDF2_ITERATIONS: u32 = 150_000;
pub const SALT_LEN: usize = 16;
pub const DIGEST_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum HashError {
    #[error("secure random source unavailable: {0}")]
    Entropy(#[from] rand_core::Error),
    #[error("hashing task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// A stored, salted password digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordHash {
    salt: Vec<u8>,
    digest: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed password hash")]
pub struct MalformedHash;

impl FromStr for PasswordHash {
    type Err = MalformedHash;

    fn from_str(stored: &str) -> Result<Self, Self::Err> {
        let (salt, digest) = stored.split_once('.').ok_or(MalformedHash)?;
        if salt.is_empty() || digest.is_empty() {
            return Err(MalformedHash);
        }
        Ok(Self {
            salt: from_b64(salt).map_err(|_| MalformedHash)?,
            digest: from_b64(digest).map_err(|_| MalformedHash)?,
        })
    }
}

impl fmt::Display for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", to_b64(&self.salt), to_b64(&self.digest))
    }
}

/// Derives and checks password hashes.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    iterations: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self {
            iterations: PBKDF2_ITERATIONS,
        }
    }
}

impl PasswordHasher {
    #[cfg(test)]
    pub(crate) fn with_iterations(iterations: u32) -> Self {
        Self { iterations }
    }

    fn derive(&self, password: &[u8], salt: &[u8]) -> [u8; DIGEST_LEN] {
        let mut digest = [0u8; DIGEST_LEN];
        pbkdf2::pbkdf2::<Hmac<Sha256>>(password, salt, self.iterations, &mut digest);
        digest
    }

    /// Hashes `password` under a newly generated salt.
    ///
    /// Fails only when the operating system cannot provide random bytes.
    pub fn hash(&self, password: &str) -> Result<PasswordHash, HashError> {
        let mut salt = [0u8; SALT_LEN];
        OsRng.try_fill_bytes(&mut salt)?;
        let digest = self.derive(password.as_bytes(), &salt);
        Ok(PasswordHash {
            salt: salt.to_vec(),
            digest: digest.to_vec(),
        })
    }

    /// Checks `password` against a stored hash string.
    ///
    /// A stored value that does not parse is treated as a wrong password.
    pub fn verify(&self, password: &str, stored: &str) -> bool {
        match stored.parse::<PasswordHash>() {
            Ok(hash) => self.verify_hash(password, &hash),
            Err(_) => {
                log::debug!("stored password hash is malformed");
                false
            }
        }
    }

    pub fn verify_hash(&self, password: &str, stored: &PasswordHash) -> bool {
        let recomputed = self.derive(password.as_bytes(), &stored.salt);
        constant_time_eq(&recomputed, &stored.digest)
    }

    /// Runs [`PasswordHasher::hash`] on the blocking thread pool.
    pub async fn hash_blocking(&self, password: String) -> Result<PasswordHash, HashError> {
        let hasher = *self;
        tokio::task::spawn_blocking(move || hasher.hash(&password)).await?
    }

    /// Runs [`PasswordHasher::verify`] on the blocking thread pool.
    pub async fn verify_blocking(&self, password: String, stored: String) -> bool {
        let hasher = *self;
        match tokio::task::spawn_blocking(move || hasher.verify(&password, &stored)).await {
            Ok(matches) => matches,
            Err(err) => {
                log::error!("password verification task failed: {}", err);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> PasswordHasher {
        PasswordHasher::with_iterations(1_000)
    }

    #[test]
    fn test_hunter2_with_default_parameters() {
        let hasher = PasswordHasher::default();
        let stored = hasher.hash("hunter2").unwrap().to_string();

        assert!(hasher.verify("hunter2", &stored));
        assert!(!hasher.verify("hunter3", &stored));
    }

    #[test]
    fn test_hash_uses_fresh_salt() {
        let hasher = fast();
        let first = hasher.hash("same password").unwrap().to_string();
        let second = hasher.hash("same password").unwrap().to_string();

        assert_ne!(first, second);
        assert!(hasher.verify("same password", &first));
        assert!(hasher.verify("same password", &second));
    }

    #[test]
    fn test_stored_format() {
        let stored = fast().hash("pw").unwrap().to_string();
        let (salt, digest) = stored.split_once('.').unwrap();

        assert_eq!(from_b64(salt).unwrap().len(), SALT_LEN);
        assert_eq!(from_b64(digest).unwrap().len(), DIGEST_LEN);
        assert_eq!(stored.parse::<PasswordHash>().unwrap().to_string(), stored);
    }

    #[test]
    fn test_verify_rejects_malformed_hashes() {
        let hasher = fast();
        for stored in ["", ".", "nodelimiter", "abc.", ".abc", "!!!.???", "QUJD.not base64"] {
            assert!(!hasher.verify("pw", stored), "accepted {:?}", stored);
        }
    }

    #[test]
    fn test_verify_rejects_truncated_digest() {
        let hasher = fast();
        let hash = hasher.hash("pw").unwrap();
        let truncated = PasswordHash {
            salt: hash.salt.clone(),
            digest: hash.digest[..DIGEST_LEN - 1].to_vec(),
        };

        assert!(!hasher.verify_hash("pw", &truncated));
    }

    #[test]
    fn test_iteration_count_changes_digest() {
        let stored = fast().hash("pw").unwrap().to_string();
        assert!(!PasswordHasher::with_iterations(1_001).verify("pw", &stored));
    }

    #[tokio::test]
    async fn test_blocking_wrappers() {
        let hasher = fast();
        let stored = hasher.hash_blocking("hunter2".into()).await.unwrap().to_string();

        assert!(hasher.verify_blocking("hunter2".into(), stored.clone()).await);
        assert!(!hasher.verify_blocking("hunter3".into(), stored).await);
    }
}
