/// Session token issuance and extraction
///
/// [`TokenManager`] owns the signing secret and session lifetime. It issues
/// signed tokens bound to a user's e-mail, pulls the token back out of a
/// request's cookies and renders the matching `Set-Cookie` headers.
///
/// The manager is built once at startup and shared read-only.

use super::cookie::{parse_cookie, CookiePolicy};
use super::jwt::{decode_claims, encode_claims, JwtError, SessionClaims};
use crate::error::AuthFailure;
use axum::http::HeaderMap;
use chrono::Duration;

/// Issues and reads session tokens
#[derive(Debug, Clone)]
pub struct TokenManager {
    secret: String,
    ttl: Duration,
    cookie: CookiePolicy,
}

impl TokenManager {
    /// Creates a manager whose tokens live `ttl_days` days
    pub fn new(secret: impl Into<String>, ttl_days: i64) -> Self {
        let ttl = Duration::days(ttl_days);
        Self {
            secret: secret.into(),
            ttl,
            cookie: CookiePolicy::new(ttl.num_seconds(), false),
        }
    }

    /// Sets the `Secure` attribute on issued cookies
    pub fn with_secure_cookie(mut self, secure: bool) -> Self {
        self.cookie.secure = secure;
        self
    }

    /// Issues a token for `subject` with the configured lifetime
    pub fn issue(&self, subject: &str) -> Result<String, JwtError> {
        self.issue_with_ttl(subject, self.ttl)
    }

    /// Issues a token for `subject` expiring `ttl` from now
    pub fn issue_with_ttl(&self, subject: &str, ttl: Duration) -> Result<String, JwtError> {
        encode_claims(&SessionClaims::new(subject, ttl), &self.secret)
    }

    /// Verifies the token signature and returns its claims
    pub fn decode(&self, token: &str) -> Result<SessionClaims, JwtError> {
        decode_claims(token, &self.secret)
    }

    /// Reads the session token from the request's cookies
    ///
    /// # Errors
    ///
    /// Returns `AuthFailure::MissingToken` if the session cookie is absent
    /// or empty.
    pub fn extract_from_request(&self, headers: &HeaderMap) -> Result<String, AuthFailure> {
        parse_cookie(headers, &self.cookie.name)
            .filter(|token| !token.is_empty())
            .ok_or(AuthFailure::MissingToken)
    }

    /// `Set-Cookie` value carrying `token`
    pub fn session_cookie(&self, token: &str) -> String {
        self.cookie.session(token)
    }

    /// `Set-Cookie` value clearing the session
    pub fn clear_cookie(&self) -> String {
        self.cookie.clear()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::COOKIE;
    use axum::http::HeaderValue;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    #[test]
    fn test_issue_binds_subject_and_ttl() {
        let manager = TokenManager::new(SECRET, 7);
        let token = manager.issue("alice@example.com").unwrap();

        let claims = manager.decode(&token).unwrap();
        assert_eq!(claims.sub.as_deref(), Some("alice@example.com"));

        let expected = chrono::Utc::now().timestamp() + Duration::days(7).num_seconds();
        let exp = claims.exp.unwrap();
        assert!((expected - exp).abs() <= 5);
    }

    #[test]
    fn test_extract_from_request() {
        let manager = TokenManager::new(SECRET, 7);
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("user_access_token=abc"));

        assert_eq!(manager.extract_from_request(&headers).unwrap(), "abc");
    }

    #[test]
    fn test_extract_missing_cookie() {
        let manager = TokenManager::new(SECRET, 7);

        assert_eq!(
            manager.extract_from_request(&HeaderMap::new()),
            Err(AuthFailure::MissingToken)
        );

        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("user_access_token="));
        assert_eq!(
            manager.extract_from_request(&headers),
            Err(AuthFailure::MissingToken)
        );
    }

    #[test]
    fn test_session_cookie_lifetime_matches_ttl() {
        let manager = TokenManager::new(SECRET, 1).with_secure_cookie(true);
        let cookie = manager.session_cookie("tok");

        assert!(cookie.contains("Max-Age=86400"));
        assert!(cookie.contains("Secure"));
    }
}
