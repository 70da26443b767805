/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use terrea_api::app::{build_router, AppState, Dependencies};
/// use terrea_api::config::Config;
/// use terrea_shared::auth::password::CredentialHasher;
/// use terrea_shared::db::memory::MemoryStore;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let hasher = CredentialHasher::new(config.accounts.hash_cost())?;
/// let deps = Dependencies::new(MemoryStore::new().repositories(), hasher, 1);
/// let app = build_router(AppState::new(config, deps));
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use crate::config::Config;
use crate::middleware::auth::session_auth_layer;
use axum::{
    http::{header, HeaderValue, Method},
    routing::{delete, get, patch, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use terrea_shared::{
    auth::{password::CredentialHasher, resolver::SessionResolver, token::TokenManager},
    db::Repositories,
    notifications::{NoopNotifier, Notifier},
    redis::{
        cache::{NoCache, ViewCache},
        RedisClient,
    },
    services::{ProfileService, ProjectService},
};
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Backends the services are built on
///
/// `new` starts with no cache, no e-mail delivery and no database handle
/// (in-memory repositories); `main` fills in what is configured.
pub struct Dependencies {
    pub repos: Repositories,
    pub hasher: CredentialHasher,

    /// Role id given to newly registered users
    pub default_role_id: i64,

    pub cache: Arc<dyn ViewCache>,
    pub notifier: Arc<dyn Notifier>,

    /// PostgreSQL pool, reported by `/health`
    pub db: Option<PgPool>,

    /// Redis client, reported by `/health`
    pub redis: Option<RedisClient>,
}

impl Dependencies {
    pub fn new(repos: Repositories, hasher: CredentialHasher, default_role_id: i64) -> Self {
        Self {
            repos,
            hasher,
            default_role_id,
            cache: Arc::new(NoCache),
            notifier: Arc::new(NoopNotifier),
            db: None,
            redis: None,
        }
    }
}

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    pub profiles: Arc<ProfileService>,
    pub projects: Arc<ProjectService>,
    pub tokens: Arc<TokenManager>,
    pub resolver: SessionResolver,
    pub db: Option<PgPool>,
    pub redis: Option<RedisClient>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wires the services from configuration and backends
    pub fn new(config: Config, deps: Dependencies) -> Self {
        let tokens = Arc::new(
            TokenManager::new(config.jwt.secret.clone(), config.jwt.access_token_expire_days)
                .with_secure_cookie(config.jwt.cookie_secure),
        );
        let resolver = SessionResolver::new(tokens.clone(), deps.repos.users.clone());

        let profiles = ProfileService::new(
            deps.repos.clone(),
            Arc::new(deps.hasher),
            tokens.clone(),
            deps.cache.clone(),
            deps.notifier,
            deps.default_role_id,
        );
        let projects = ProjectService::new(deps.repos, deps.cache);

        Self {
            profiles: Arc::new(profiles),
            projects: Arc::new(projects),
            tokens,
            resolver,
            db: deps.db,
            redis: deps.redis,
            config: Arc::new(config),
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET /health
/// ├── /profile/
/// │   ├── POST   /register
/// │   ├── POST   /login
/// │   ├── GET    /@{username}
/// │   ├── GET    /me               (session)
/// │   ├── PATCH  /update_profile   (session)
/// │   ├── POST   /logout           (session)
/// │   └── DELETE /delete_account   (session)
/// └── /projects/                   (session)
///     ├── POST   /create_project
///     ├── GET    /{project_name}
///     ├── DELETE /{project_name}/delete
///     └── POST   /{project_name}/task/create
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Response compression
/// 4. Session authentication (per-route basis)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let public_profile_routes = Router::new()
        .route("/register", post(routes::profile::register))
        .route("/login", post(routes::profile::login))
        .route("/:handle", get(routes::profile::get_other_profile));

    let session_profile_routes = Router::new()
        .route("/me", get(routes::profile::get_my_profile))
        .route("/update_profile", patch(routes::profile::update_profile))
        .route("/logout", post(routes::profile::logout))
        .route("/delete_account", delete(routes::profile::delete_account))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            session_auth_layer,
        ));

    let project_routes = Router::new()
        .route("/create_project", post(routes::projects::create_project))
        .route("/:project_name", get(routes::projects::get_project))
        .route("/:project_name/delete", delete(routes::projects::delete_project))
        .route("/:project_name/task/create", post(routes::projects::create_task))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            session_auth_layer,
        ));

    Router::new()
        .merge(health_routes)
        .nest("/profile", public_profile_routes.merge(session_profile_routes))
        .nest("/projects", project_routes)
        .layer(CompressionLayer::new())
        .layer(cors_layer(&state.config.api.cors_origins))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

/// CORS for the configured origins
///
/// `*` is permissive (development only: browsers reject credentials with a
/// wildcard origin). Otherwise credentials are allowed so the session
/// cookie travels with cross-origin requests.
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::COOKIE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}
