//! Credential hashing: turning a password (plus salt) into stored material.
//!
//! Identity actors never look inside the hash. They ask a
//! [`CredentialHasher`] for `(salt, hash)` on registration, ask it again
//! with the stored salt on login, and compare the two hashes with
//! [`constant_time_eq`]. Swapping the algorithm means swapping the hasher;
//! the state machine doesn't change.

use std::fmt;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHasher, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::HashError;

/// Salt and hash as stored in an identity record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub salt: String,
    pub hash: String,
}

/// Derives a salted hash from a plaintext password.
///
/// # Contract
///
/// - `salt == None` → generate a fresh cryptographically random salt.
/// - `salt == Some(s)` → use `s`; the same `(password, s)` must always
///   produce the same hash, otherwise verification can never succeed.
/// - The primitive must be slow and salted (not a bare digest).
/// - No side effects.
///
/// Hashing is CPU-bound and deliberately slow, so callers on an async
/// runtime should run it on the blocking pool.
pub trait CredentialHasher: Send + Sync + 'static {
    /// Hashes `password`, generating a salt when none is given.
    ///
    /// # Errors
    /// - [`HashError::MalformedSalt`] — `salt` isn't in the hasher's format
    /// - [`HashError::Derivation`] — the algorithm itself failed
    fn hash(
        &self,
        password: &str,
        salt: Option<&str>,
    ) -> Result<Credential, HashError>;
}

// ---------------------------------------------------------------------------
// HasherConfig
// ---------------------------------------------------------------------------

/// Argon2 cost parameters.
///
/// Defaults are the `argon2` crate's recommended values (19 MiB, 2 passes,
/// 1 lane). Tests lower them to keep hashing fast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HasherConfig {
    /// Memory cost in KiB.
    pub memory_kib: u32,
    /// Number of passes.
    pub iterations: u32,
    /// Degree of parallelism (lanes).
    pub parallelism: u32,
}

impl Default for HasherConfig {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

// ---------------------------------------------------------------------------
// Argon2Hasher
// ---------------------------------------------------------------------------

/// [`CredentialHasher`] backed by Argon2id.
///
/// Salts are stored in the PHC "B64" alphabet (unpadded base64) and hashes
/// as the B64 encoding of the raw Argon2 output.
#[derive(Clone)]
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
}

impl Argon2Hasher {
    /// Builds a hasher with explicit cost parameters.
    ///
    /// # Errors
    /// Returns [`HashError::InvalidParams`] if Argon2 rejects the
    /// parameters (e.g. memory below `8 * parallelism` KiB).
    pub fn new(config: &HasherConfig) -> Result<Self, HashError> {
        let params = Params::new(
            config.memory_kib,
            config.iterations,
            config.parallelism,
            None,
        )
        .map_err(|e| HashError::InvalidParams(e.to_string()))?;
        tracing::debug!(
            memory_kib = config.memory_kib,
            iterations = config.iterations,
            parallelism = config.parallelism,
            "argon2id hasher configured"
        );

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        Self {
            argon2: Argon2::default(),
        }
    }
}

impl fmt::Debug for Argon2Hasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Argon2Hasher")
            .field("params", self.argon2.params())
            .finish()
    }
}

impl CredentialHasher for Argon2Hasher {
    fn hash(
        &self,
        password: &str,
        salt: Option<&str>,
    ) -> Result<Credential, HashError> {
        let salt = match salt {
            Some(encoded) => SaltString::from_b64(encoded)
                .map_err(|e| HashError::MalformedSalt(e.to_string()))?,
            None => SaltString::generate(&mut OsRng),
        };

        let hashed = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| HashError::Derivation(e.to_string()))?;
        let output = hashed.hash.ok_or_else(|| {
            HashError::Derivation("argon2 returned no output".into())
        })?;

        Ok(Credential {
            salt: salt.as_str().to_owned(),
            hash: output.to_string(),
        })
    }
}

/// Compares two byte strings in constant time, so the time taken doesn't
/// reveal how much of a candidate hash was correct.
///
/// Unequal lengths compare unequal straight away; hash lengths are fixed
/// per algorithm, so that leaks nothing about the secret.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimum Argon2 cost, so each hash takes microseconds.
    fn fast_hasher() -> Argon2Hasher {
        Argon2Hasher::new(&HasherConfig {
            memory_kib: 8,
            iterations: 1,
            parallelism: 1,
        })
        .expect("minimum params are valid")
    }

    // =====================================================================
    // hash()
    // =====================================================================

    #[test]
    fn test_hash_without_salt_generates_salt() {
        let cred = fast_hasher().hash("secret1", None).unwrap();
        assert!(!cred.salt.is_empty());
        assert!(!cred.hash.is_empty());
        assert_ne!(cred.hash, "secret1");
    }

    #[test]
    fn test_hash_without_salt_generates_distinct_salts() {
        let hasher = fast_hasher();
        let a = hasher.hash("secret1", None).unwrap();
        let b = hasher.hash("secret1", None).unwrap();
        assert_ne!(a.salt, b.salt);
        assert_ne!(a.hash, b.hash, "same password, different salt");
    }

    #[test]
    fn test_hash_with_same_salt_is_deterministic() {
        let hasher = fast_hasher();
        let first = hasher.hash("secret1", None).unwrap();

        let again = hasher.hash("secret1", Some(&first.salt)).unwrap();

        assert_eq!(first, again);
    }

    #[test]
    fn test_hash_with_same_salt_different_password_differs() {
        let hasher = fast_hasher();
        let first = hasher.hash("secret1", None).unwrap();

        let other = hasher.hash("wrong", Some(&first.salt)).unwrap();

        assert_eq!(other.salt, first.salt);
        assert_ne!(other.hash, first.hash);
    }

    #[test]
    fn test_hash_malformed_salt_returns_error() {
        let result = fast_hasher().hash("secret1", Some("!!not b64!!"));
        assert!(matches!(result, Err(HashError::MalformedSalt(_))));
    }

    #[test]
    fn test_hash_empty_salt_returns_error() {
        let result = fast_hasher().hash("secret1", Some(""));
        assert!(matches!(result, Err(HashError::MalformedSalt(_))));
    }

    #[test]
    fn test_cost_affects_hash() {
        let cheap = fast_hasher();
        let pricier = Argon2Hasher::new(&HasherConfig {
            memory_kib: 16,
            iterations: 2,
            parallelism: 1,
        })
        .unwrap();
        let cred = cheap.hash("secret1", None).unwrap();

        let other = pricier.hash("secret1", Some(&cred.salt)).unwrap();

        assert_ne!(cred.hash, other.hash);
    }

    // =====================================================================
    // new()
    // =====================================================================

    #[test]
    fn test_new_rejects_too_little_memory() {
        let result = Argon2Hasher::new(&HasherConfig {
            memory_kib: 1,
            iterations: 1,
            parallelism: 1,
        });
        assert!(matches!(result, Err(HashError::InvalidParams(_))));
    }

    #[test]
    fn test_default_config_matches_argon2_defaults() {
        let config = HasherConfig::default();
        assert_eq!(config.memory_kib, Params::DEFAULT_M_COST);
        assert_eq!(config.iterations, Params::DEFAULT_T_COST);
        assert_eq!(config.parallelism, Params::DEFAULT_P_COST);
    }

    // =====================================================================
    // constant_time_eq()
    // =====================================================================

    #[test]
    fn test_constant_time_eq_equal_inputs() {
        assert!(constant_time_eq(b"abcdef", b"abcdef"));
        assert!(constant_time_eq(b"", b""));
    }

    #[test]
    fn test_constant_time_eq_differs_in_last_byte() {
        assert!(!constant_time_eq(b"abcdef", b"abcdeg"));
    }

    #[test]
    fn test_constant_time_eq_different_lengths() {
        assert!(!constant_time_eq(b"abc", b"abcd"));
    }

    #[test]
    fn test_constant_time_eq_on_derived_hashes() {
        let hasher = fast_hasher();
        let stored = hasher.hash("secret1", None).unwrap();
        let same = hasher.hash("secret1", Some(&stored.salt)).unwrap();
        let other = hasher.hash("secret2", Some(&stored.salt)).unwrap();

        assert!(constant_time_eq(stored.hash.as_bytes(), same.hash.as_bytes()));
        assert!(!constant_time_eq(stored.hash.as_bytes(), other.hash.as_bytes()));
    }
}
