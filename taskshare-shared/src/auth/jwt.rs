//! Bearer token issuance and validation
//!
//! Tokens are HS256-signed JWTs whose subject is the username. They are
//! stateless: nothing is stored server-side, there is no refresh and no
//! revocation. A token stays valid until `exp`.
//!
//! # Security
//!
//! - **Algorithm**: HS256 (HMAC with SHA-256)
//! - **Expiration**: 30 minutes unless configured otherwise
//! - **Validation**: Signature, expiration, not-before and issuer
//! - **Secret Management**: At least 32 bytes, loaded from `JWT_SECRET`
//!
//! # Example
//!
//! ```
//! use chrono::Duration;
//! use taskshare_shared::auth::jwt::TokenService;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let tokens = TokenService::new("a-secret-key-of-at-least-32-bytes!", Duration::minutes(30));
//!
//! let token = tokens.issue("alice")?;
//! let claims = tokens.verify(&token)?;
//! assert_eq!(claims.sub, "alice");
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Issuer written into and required from every token
pub const ISSUER: &str = "taskshare";

/// Default token lifetime in minutes
pub const DEFAULT_EXPIRATION_MINUTES: i64 = 30;

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Failed to validate token
    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Token was issued by someone else
    #[error("Invalid issuer: expected {expected}")]
    InvalidIssuer { expected: String },
}

/// JWT claims
///
/// - `sub`: Subject (username)
/// - `iss`: Issuer (always "taskshare")
/// - `iat`: Issued at timestamp
/// - `exp`: Expiration timestamp
/// - `nbf`: Not before timestamp
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    pub nbf: i64,
}

impl Claims {
    /// Claims for `subject` valid from now for `expires_in`
    pub fn new(subject: impl Into<String>, expires_in: Duration) -> Self {
        let now = Utc::now();

        Self {
            sub: subject.into(),
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            // Saturates instead of overflowing
            exp: now
                .checked_add_signed(expires_in)
                .unwrap_or(DateTime::<Utc>::MAX_UTC)
                .timestamp(),
            nbf: now.timestamp(),
        }
    }

    /// Checks if token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Signs and verifies bearer tokens with one shared secret
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiration: Duration,
}

impl TokenService {
    /// Creates a service signing with `secret` and issuing tokens that live
    /// for `expiration`
    pub fn new(secret: &str, expiration: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiration,
        }
    }

    /// Issues a token for `subject` with the configured lifetime
    ///
    /// # Errors
    ///
    /// Returns `JwtError::CreateError` if encoding fails
    pub fn issue(&self, subject: &str) -> Result<String, JwtError> {
        self.issue_with_expiration(subject, self.expiration)
    }

    /// Issues a token with a custom lifetime
    pub fn issue_with_expiration(
        &self,
        subject: &str,
        expires_in: Duration,
    ) -> Result<String, JwtError> {
        let claims = Claims::new(subject, expires_in);

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
    }

    /// Validates a token and returns its claims
    ///
    /// Verifies:
    /// - Signature matches the secret
    /// - Token hasn't expired
    /// - Issuer is "taskshare"
    /// - Token is not used before nbf time
    pub fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        validation.validate_exp = true;
        validation.validate_nbf = true;

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
                jsonwebtoken::errors::ErrorKind::InvalidIssuer => JwtError::InvalidIssuer {
                    expected: ISSUER.to_string(),
                },
                _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
            }
        })?;

        Ok(token_data.claims)
    }
}
