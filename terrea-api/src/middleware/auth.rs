/// Session cookie authentication
///
/// [`session_auth_layer`] resolves the `user_access_token` cookie to a user
/// and stores it in the request extensions as [`CurrentUser`]. Protected
/// handlers take `Extension<CurrentUser>`; requests without a live session
/// are answered with 401 before reaching them.
///
/// # Example
///
/// ```no_run
/// use axum::{routing::get, Extension, Router};
/// use terrea_api::app::AppState;
/// use terrea_api::middleware::auth::{session_auth_layer, CurrentUser};
///
/// async fn whoami(Extension(CurrentUser(user)): Extension<CurrentUser>) -> String {
///     user.username
/// }
///
/// fn routes(state: AppState) -> Router<AppState> {
///     Router::new()
///         .route("/whoami", get(whoami))
///         .route_layer(axum::middleware::from_fn_with_state(state, session_auth_layer))
/// }
/// ```

use crate::{app::AppState, error::ApiError};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use terrea_shared::models::user::User;

/// The authenticated user of the current request
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

pub async fn session_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = state.resolver.resolve(req.headers()).await?;

    tracing::debug!(user_id = user.id, "Session resolved");
    req.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(req).await)
}
