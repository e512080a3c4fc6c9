//! Password hashing using Argon2id
//!
//! # Security
//!
//! - **Algorithm**: Argon2id (hybrid of Argon2i and Argon2d)
//! - **Memory**: 64 MB (65536 KB)
//! - **Iterations**: 3 passes
//! - **Parallelism**: 4 lanes
//! - **Output**: 32-byte hash
//!
//! Digests are PHC strings carrying their own parameters and salt, so a
//! digest produced under one cost setting still verifies after the
//! configured cost changes.
//!
//! # Example
//!
//! ```
//! use taskshare_shared::auth::password::PasswordService;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let passwords = PasswordService::default();
//! let digest = passwords.hash("super_secret_password_123")?;
//!
//! assert!(passwords.verify("super_secret_password_123", &digest)?);
//! assert!(!passwords.verify("wrong_password", &digest)?);
//! # Ok(())
//! # }
//! ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, Params, ParamsBuilder, Version,
};

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    HashError(String),

    /// Failed to verify password
    #[error("Failed to verify password: {0}")]
    VerifyError(String),

    /// Invalid password hash format
    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),
}

/// Argon2id hasher with fixed cost parameters
#[derive(Clone)]
pub struct PasswordService {
    argon2: Argon2<'static>,
}

impl PasswordService {
    /// Creates a hasher using `params`
    pub fn new(params: Params) -> Self {
        Self {
            argon2: Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params),
        }
    }

    /// Creates a hasher from raw cost settings
    ///
    /// # Arguments
    ///
    /// * `memory_kib` - Memory cost in KiB
    /// * `iterations` - Number of passes
    /// * `parallelism` - Number of lanes
    pub fn with_cost(
        memory_kib: u32,
        iterations: u32,
        parallelism: u32,
    ) -> Result<Self, PasswordError> {
        let params = ParamsBuilder::new()
            .m_cost(memory_kib)
            .t_cost(iterations)
            .p_cost(parallelism)
            .output_len(32)
            .build()
            .map_err(|e| PasswordError::HashError(format!("Invalid parameters: {}", e)))?;

        Ok(Self::new(params))
    }

    /// Hashes a password with a fresh random salt
    ///
    /// # Returns
    ///
    /// PHC string, e.g. `$argon2id$v=19$m=65536,t=3,p=4$<salt>$<hash>`
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);

        let digest = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| PasswordError::HashError(format!("Hash generation failed: {}", e)))?;

        Ok(digest.to_string())
    }

    /// Verifies a password against a stored digest
    ///
    /// # Returns
    ///
    /// `Ok(true)` if password matches, `Ok(false)` if it doesn't match
    ///
    /// # Errors
    ///
    /// `PasswordError::InvalidHash` if the digest cannot be parsed
    pub fn verify(&self, password: &str, digest: &str) -> Result<bool, PasswordError> {
        let parsed = PasswordHash::new(digest)
            .map_err(|e| PasswordError::InvalidHash(format!("Failed to parse hash: {}", e)))?;

        match self.argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(PasswordError::VerifyError(format!("Verification failed: {}", e))),
        }
    }
}

impl Default for PasswordService {
    fn default() -> Self {
        let params = Params::new(65536, 3, 4, Some(32)).unwrap_or_default();
        Self::new(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn light() -> PasswordService {
        PasswordService::with_cost(1024, 1, 1).expect("valid parameters")
    }

    #[test]
    fn test_default_parameters() {
        let hash = PasswordService::default()
            .hash("test_password_123")
            .expect("Hash should succeed");

        assert!(hash.starts_with("$argon2id$"));
        assert!(hash.contains("v=19"));
        assert!(hash.contains("m=65536"));
        assert!(hash.contains("t=3"));
        assert!(hash.contains("p=4"));
    }

    #[test]
    fn test_same_password_different_salts() {
        let passwords = light();
        let hash1 = passwords.hash("same_password").unwrap();
        let hash2 = passwords.hash("same_password").unwrap();

        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_verify_password() {
        let passwords = light();
        let hash = passwords.hash("correct_password").unwrap();

        assert!(passwords.verify("correct_password", &hash).unwrap());
        assert!(!passwords.verify("wrong_password", &hash).unwrap());
        assert!(!passwords.verify("", &hash).unwrap());
    }

    #[test]
    fn test_digest_verifies_under_other_cost() {
        let hash = light().hash("portable").unwrap();
        let stronger = PasswordService::with_cost(2048, 2, 1).unwrap();

        assert!(stronger.verify("portable", &hash).unwrap());
    }

    #[test]
    fn test_verify_invalid_hash() {
        let passwords = light();
        assert!(matches!(
            passwords.verify("password", "invalid_hash"),
            Err(PasswordError::InvalidHash(_))
        ));
        assert!(passwords.verify("password", "$argon2id$invalid").is_err());
    }

    #[test]
    fn test_unicode_and_long_passwords() {
        let passwords = light();
        for password in [
            "with spaces",
            "unicode-密码-パスワード",
            "very_long_password_that_is_longer_than_usual_passwords_123456789",
        ] {
            let hash = passwords.hash(password).unwrap();
            assert!(passwords.verify(password, &hash).unwrap(), "'{}' should verify", password);
        }
    }

    #[test]
    fn test_invalid_cost_rejected() {
        assert!(PasswordService::with_cost(1, 0, 0).is_err());
    }
}
