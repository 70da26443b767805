/// Credential hashing using Argon2id
///
/// Passwords are stored as PHC strings (`$argon2id$v=19$m=...,t=...,p=...$salt$hash`),
/// so the cost parameters travel with every hash and verification does not
/// depend on the hasher's current configuration.
///
/// # Cost
///
/// The default cost is 64 MB of memory, 3 iterations and 4 lanes. It can be
/// lowered through [`HashCost`] for development and tests.
///
/// # Example
///
/// ```
/// use terrea_shared::auth::password::{CredentialHasher, HashCost};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hasher = CredentialHasher::new(HashCost { memory_kib: 1024, iterations: 1, parallelism: 1 })?;
/// let hash = hasher.hash("secret1")?;
///
/// assert!(hasher.verify("secret1", &hash));
/// assert!(!hasher.verify("wrong", &hash));
/// assert!(!hasher.verify("secret1", "not-a-phc-string"));
/// # Ok(())
/// # }
/// ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, ParamsBuilder, Version,
};

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Cost parameters rejected by Argon2
    #[error("Invalid hashing parameters: {0}")]
    InvalidParams(String),

    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    HashError(String),
}

/// Argon2id cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashCost {
    /// Memory in KiB
    pub memory_kib: u32,
    /// Number of passes
    pub iterations: u32,
    /// Degree of parallelism (lanes)
    pub parallelism: u32,
}

impl Default for HashCost {
    fn default() -> Self {
        Self {
            memory_kib: 65536,
            iterations: 3,
            parallelism: 4,
        }
    }
}

/// Slow, salted password hasher
#[derive(Debug, Clone)]
pub struct CredentialHasher {
    params: Params,
}

impl CredentialHasher {
    /// Creates a hasher with the given cost
    ///
    /// # Errors
    ///
    /// Returns `PasswordError::InvalidParams` if Argon2 rejects the cost
    /// (for example memory below `8 * parallelism` KiB).
    pub fn new(cost: HashCost) -> Result<Self, PasswordError> {
        let params = ParamsBuilder::new()
            .m_cost(cost.memory_kib)
            .t_cost(cost.iterations)
            .p_cost(cost.parallelism)
            .output_len(32)
            .build()
            .map_err(|e| PasswordError::InvalidParams(e.to_string()))?;

        Ok(Self { params })
    }

    /// Hashes `plaintext` with a fresh random salt
    ///
    /// # Errors
    ///
    /// Returns `PasswordError::HashError` if hashing fails
    pub fn hash(&self, plaintext: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone());

        let password_hash = argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| PasswordError::HashError(format!("Hash generation failed: {}", e)))?;

        Ok(password_hash.to_string())
    }

    /// Checks `plaintext` against a stored hash
    ///
    /// A malformed hash string yields `false`; it is never an error.
    pub fn verify(&self, plaintext: &str, hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::debug!(error = %e, "Stored password hash is malformed");
                return false;
            }
        };

        Argon2::default()
            .verify_password(plaintext.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

impl Default for CredentialHasher {
    fn default() -> Self {
        // Default cost is within Argon2's accepted ranges.
        Self {
            params: Params::new(65536, 3, 4, Some(32)).unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_hasher() -> CredentialHasher {
        CredentialHasher::new(HashCost {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap()
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = fast_hasher();
        let hash = hasher.hash("secret1").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("secret1", &hash));
        assert!(!hasher.verify("secret2", &hash));
    }

    #[test]
    fn test_hash_is_salted() {
        let hasher = fast_hasher();
        let first = hasher.hash("secret1").unwrap();
        let second = hasher.hash("secret1").unwrap();

        assert_ne!(first, second);
        assert!(hasher.verify("secret1", &first));
        assert!(hasher.verify("secret1", &second));
    }

    #[test]
    fn test_malformed_hash_returns_false() {
        let hasher = fast_hasher();
        assert!(!hasher.verify("secret1", ""));
        assert!(!hasher.verify("secret1", "plaintext-password"));
        assert!(!hasher.verify("secret1", "$argon2id$v=19$garbage"));
    }

    #[test]
    fn test_cost_is_encoded_in_hash() {
        let hasher = fast_hasher();
        let hash = hasher.hash("secret1").unwrap();
        assert!(hash.contains("m=1024,t=1,p=1"));

        // A hasher with a different cost still verifies it.
        assert!(CredentialHasher::default().verify("secret1", &hash));
    }

    #[test]
    fn test_invalid_cost_rejected() {
        let result = CredentialHasher::new(HashCost {
            memory_kib: 1,
            iterations: 1,
            parallelism: 1,
        });
        assert!(matches!(result, Err(PasswordError::InvalidParams(_))));
    }

    #[test]
    fn test_default_cost_matches_production_parameters() {
        assert_eq!(
            HashCost::default(),
            HashCost {
                memory_kib: 65536,
                iterations: 3,
                parallelism: 4
            }
        );
    }
}
