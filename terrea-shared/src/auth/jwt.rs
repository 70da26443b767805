/// JWT encoding and decoding for session tokens
///
/// Session tokens are HS256-signed JWTs carrying two claims:
///
/// - `sub`: the user's e-mail address
/// - `exp`: absolute expiration (Unix seconds, UTC)
///
/// Decoding only checks the signature and the token format. Expiry and
/// subject presence are checked separately by the session resolver so that
/// each failure can be reported under its own reason.
///
/// # Example
///
/// ```
/// use terrea_shared::auth::jwt::{decode_claims, encode_claims, SessionClaims};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let secret = "a-secret-of-at-least-thirty-two-bytes!!";
/// let claims = SessionClaims::new("alice@example.com", chrono::Duration::days(7));
/// let token = encode_claims(&claims, secret)?;
///
/// let decoded = decode_claims(&token, secret)?;
/// assert_eq!(decoded.sub.as_deref(), Some("alice@example.com"));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to encode token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Bad signature, malformed token or undecodable claims
    #[error("Invalid token: {0}")]
    Invalid(String),
}

/// Claims carried by a session token
///
/// Both claims are optional on decode so that tokens lacking them can be
/// told apart from tokens with a bad signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (user e-mail)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Expiration time (Unix timestamp)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

impl SessionClaims {
    /// Creates claims for `subject` expiring `ttl` from now
    pub fn new(subject: impl Into<String>, ttl: Duration) -> Self {
        Self {
            sub: Some(subject.into()),
            exp: Some((Utc::now() + ttl).timestamp()),
        }
    }

    /// Returns true if `exp` is absent or `now >= exp`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.exp {
            Some(exp) => now.timestamp() >= exp,
            None => true,
        }
    }
}

/// Signs `claims` with HS256
///
/// # Errors
///
/// Returns `JwtError::CreateError` if encoding fails
pub fn encode_claims(claims: &SessionClaims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Verifies the signature of `token` and returns its claims
///
/// Expiration is deliberately not validated here.
///
/// # Errors
///
/// Returns `JwtError::Invalid` if the signature or format is wrong
pub fn decode_claims(token: &str, secret: &str) -> Result<SessionClaims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.required_spec_claims = HashSet::new();

    let token_data = decode::<SessionClaims>(token, &key, &validation)
        .map_err(|e| JwtError::Invalid(format!("Token validation failed: {}", e)))?;

    Ok(token_data.claims)
}
