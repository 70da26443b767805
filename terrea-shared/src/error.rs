/// Use-case error taxonomy
///
/// Every profile and project/task operation returns `Result<T, ServiceError>`.
/// The HTTP layer maps each variant onto exactly one status code:
///
/// | Variant            | Status |
/// |--------------------|--------|
/// | `Conflict`         | 409    |
/// | `Unauthorized`     | 401    |
/// | `AccessDenied`     | 403    |
/// | `NotFound`         | 404    |
/// | `ValidationFailed` | 400    |
/// | `ServerError`      | 500    |
///
/// Persistence failures are converted to `ServerError` at the use-case
/// boundary; their cause is logged and never returned to the caller.

use crate::auth::authorization::AuthzError;
use crate::db::repository::StoreError;
use thiserror::Error;

/// Reasons a request failed authentication
///
/// All variants are reported to the client as 401, but each one is logged
/// under its own `reason` so operators can tell them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthFailure {
    /// No session cookie on the request
    #[error("Token not found")]
    MissingToken,

    /// Signature or format check failed
    #[error("Token is invalid")]
    InvalidToken,

    /// `exp` claim missing or in the past
    #[error("Token has expired")]
    TokenExpired,

    /// `sub` claim missing
    #[error("User ID not found")]
    MissingSubject,

    /// Subject does not match any user
    #[error("User not found")]
    UserNotFound,

    /// Unknown e-mail or wrong password at login
    #[error("Incorrect email or password")]
    BadCredentials,
}

impl AuthFailure {
    /// Stable identifier used as the `reason` field in logs
    pub fn reason(&self) -> &'static str {
        match self {
            AuthFailure::MissingToken => "missing_token",
            AuthFailure::InvalidToken => "invalid_token",
            AuthFailure::TokenExpired => "token_expired",
            AuthFailure::MissingSubject => "missing_subject",
            AuthFailure::UserNotFound => "user_not_found",
            AuthFailure::BadCredentials => "bad_credentials",
        }
    }
}

/// Errors returned by the use-case services
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Duplicate resource, or a login attempt while already authenticated
    #[error("{0}")]
    Conflict(String),

    /// Authentication failed
    #[error(transparent)]
    Unauthorized(#[from] AuthFailure),

    /// Authenticated, but not the owner of the resource
    #[error("{0}")]
    AccessDenied(String),

    /// Resource does not exist
    #[error("{0}")]
    NotFound(String),

    /// Character or length policy violated
    #[error("{0}")]
    ValidationFailed(String),

    /// Persistence or other internal failure (details are logged only)
    #[error("Internal server error")]
    ServerError,
}

impl ServiceError {
    pub fn conflict(message: impl Into<String>) -> Self {
        ServiceError::Conflict(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ServiceError::NotFound(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::ValidationFailed(message.into())
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        tracing::error!(error = %err, "Persistence error");
        ServiceError::ServerError
    }
}

impl From<AuthzError> for ServiceError {
    fn from(err: AuthzError) -> Self {
        ServiceError::AccessDenied(err.to_string())
    }
}
