/// Request extractors
///
/// [`ApiJson`] wraps `axum::Json` so that a body axum cannot decode
/// (missing field, wrong type, bad date, wrong content type) is answered
/// through [`ApiError`] like every other failure.

use axum::extract::{rejection::JsonRejection, FromRequest};

use crate::error::ApiError;

/// JSON body whose rejection renders as `400 Bad Request`
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(error = %rejection, "Rejected request body");
        ApiError::BadRequest(rejection.body_text())
    }
}
