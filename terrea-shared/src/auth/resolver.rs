/// Current-user resolution
///
/// Turns a request's session cookie into the acting [`User`]:
///
/// ```text
/// cookie ──extract──> token ──decode──> claims ──expiry──> ──subject──> email ──lookup──> User
///   │                   │                          │             │                  │
/// MissingToken     InvalidToken              TokenExpired   MissingSubject     UserNotFound
/// ```
///
/// Each failure is logged under its own reason and returned as
/// `ServiceError::Unauthorized`.

use std::sync::Arc;

use axum::http::HeaderMap;
use chrono::{DateTime, Utc};

use super::token::TokenManager;
use crate::db::repository::Repository;
use crate::error::{AuthFailure, ServiceError};
use crate::models::user::{User, UserKey};

/// Resolves session tokens to users
#[derive(Clone)]
pub struct SessionResolver {
    tokens: Arc<TokenManager>,
    users: Arc<dyn Repository<User>>,
}

impl SessionResolver {
    pub fn new(tokens: Arc<TokenManager>, users: Arc<dyn Repository<User>>) -> Self {
        Self { tokens, users }
    }

    /// Resolves the user owning the request's session cookie
    pub async fn resolve(&self, headers: &HeaderMap) -> Result<User, ServiceError> {
        let token = self
            .tokens
            .extract_from_request(headers)
            .map_err(reject)?;
        self.resolve_token(&token).await
    }

    /// Resolves `token` as of now
    pub async fn resolve_token(&self, token: &str) -> Result<User, ServiceError> {
        self.resolve_token_at(token, Utc::now()).await
    }

    /// Resolves `token` as of `now`
    pub async fn resolve_token_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<User, ServiceError> {
        let claims = self.tokens.decode(token).map_err(|e| {
            tracing::debug!(error = %e, "Session token failed to decode");
            reject(AuthFailure::InvalidToken)
        })?;

        if claims.is_expired_at(now) {
            return Err(reject(AuthFailure::TokenExpired));
        }

        let email = claims
            .sub
            .ok_or_else(|| reject(AuthFailure::MissingSubject))?;

        self.users
            .find_one(&UserKey::Email(email))
            .await?
            .ok_or_else(|| reject(AuthFailure::UserNotFound))
    }
}

fn reject(failure: AuthFailure) -> ServiceError {
    tracing::warn!(reason = failure.reason(), "Authentication failed");
    ServiceError::Unauthorized(failure)
}
