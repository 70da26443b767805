/// Profile endpoints
///
/// # Endpoints
///
/// - `POST /profile/register` - Create an account and open a session
/// - `POST /profile/login` - Open a session
/// - `GET /profile/@{username}` - Another user's public profile
/// - `GET /profile/me` - Own profile (session)
/// - `PATCH /profile/update_profile` - Replace own profile (session)
/// - `POST /profile/logout` - Close the session (session)
/// - `DELETE /profile/delete_account` - Delete own account (session)
///
/// Session-opening endpoints answer with a `Set-Cookie` header carrying the
/// `user_access_token` cookie; logout and account deletion clear it.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::ApiJson,
    middleware::auth::CurrentUser,
    routes::MessageResponse,
};
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap},
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;
use terrea_shared::{
    models::user::ProfileView,
    services::{Credentials, ProfileUpdate, Registration},
};
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 20, message = "Username must be 3-20 characters"))]
    pub username: String,

    #[validate(
        email(message = "Invalid email format"),
        length(max = 255, message = "Email must be at most 255 characters")
    )]
    pub email: String,

    #[validate(length(min = 5, message = "Password must be at least 5 characters"))]
    pub password: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(
        email(message = "Invalid email format"),
        length(max = 255, message = "Email must be at most 255 characters")
    )]
    pub email: String,

    pub password: String,
}

/// Profile replacement; a missing `is_active` keeps the account active
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 3, max = 20, message = "Username must be 3-20 characters"))]
    pub username: String,

    #[validate(
        email(message = "Invalid email format"),
        length(max = 255, message = "Email must be at most 255 characters")
    )]
    pub email: String,

    #[validate(length(min = 5, message = "Password must be at least 5 characters"))]
    pub password: String,

    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /profile/register
/// Content-Type: application/json
///
/// {
///   "username": "alice",
///   "email": "a@x.com",
///   "password": "pw123"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `409 Conflict`: E-mail registered or username taken
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    req.validate()?;

    let session = state
        .profiles
        .register(Registration {
            username: req.username,
            email: req.email,
            password: req.password,
        })
        .await?;

    Ok((
        [(header::SET_COOKIE, state.tokens.session_cookie(&session.token))],
        Json(MessageResponse::ok("User has been registered")),
    ))
}

/// Login endpoint
///
/// A request that already carries a live session cookie is rejected with
/// `409 Conflict`. Unknown e-mail and wrong password both answer `401`
/// with the same message.
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    req.validate()?;

    let existing = state.tokens.extract_from_request(&headers).ok();

    let session = state
        .profiles
        .login(
            existing.as_deref(),
            Credentials {
                email: req.email,
                password: req.password,
            },
        )
        .await?;

    Ok((
        [(header::SET_COOKIE, state.tokens.session_cookie(&session.token))],
        Json(MessageResponse::ok("User has been logged in")),
    ))
}

/// Own profile, without the password
pub async fn get_my_profile(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Json<ProfileView>> {
    Ok(Json(state.profiles.me(&user).await?))
}

/// Another user's profile, addressed as `/profile/@{username}`
///
/// Path segments without the `@` prefix do not name a profile.
pub async fn get_other_profile(
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> ApiResult<Json<ProfileView>> {
    let username = handle
        .strip_prefix('@')
        .ok_or_else(|| ApiError::NotFound("Not found".to_string()))?;

    Ok(Json(state.profiles.other(username).await?))
}

/// Replace the acting user's profile
///
/// The session cookie is rotated to a token bound to the new e-mail.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ApiJson(req): ApiJson<UpdateProfileRequest>,
) -> ApiResult<impl IntoResponse> {
    req.validate()?;

    let (view, token) = state
        .profiles
        .update_profile(
            &user,
            ProfileUpdate {
                username: req.username,
                email: req.email,
                password: req.password,
                is_active: req.is_active,
            },
        )
        .await?;

    Ok((
        [(header::SET_COOKIE, state.tokens.session_cookie(&token))],
        Json(view),
    ))
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<impl IntoResponse> {
    state.profiles.logout(&user).await?;

    Ok((
        [(header::SET_COOKIE, state.tokens.clear_cookie())],
        Json(MessageResponse::ok("User has been logged out")),
    ))
}

/// Delete the acting user together with their projects and tasks
pub async fn delete_account(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<impl IntoResponse> {
    state.profiles.delete_account(&user).await?;

    Ok((
        [(header::SET_COOKIE, state.tokens.clear_cookie())],
        Json(MessageResponse::ok("User has been deleted")),
    ))
}
