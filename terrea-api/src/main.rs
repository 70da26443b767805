//! # Terrea API Server
//!
//! CRUD API for users, projects and tasks with cookie-based sessions.
//!
//! ## Startup
//!
//! 1. Load [`Config`] from the environment
//! 2. Connect to PostgreSQL and apply migrations, or fall back to the
//!    in-memory store when `DATABASE_URL` is unset
//! 3. Ensure the default role exists
//! 4. Connect to Redis when `REDIS_URL` is set (view cache + e-mail queue)
//! 5. Serve until Ctrl-C
//!
//! ## Usage
//!
//! ```bash
//! JWT_SECRET=$(openssl rand -hex 32) cargo run -p terrea-api
//! ```

use std::sync::Arc;
use std::time::Duration;

use terrea_api::app::{build_router, AppState, Dependencies};
use terrea_api::config::Config;
use terrea_shared::auth::password::CredentialHasher;
use terrea_shared::db::{memory::MemoryStore, migrations, pool, Repositories};
use terrea_shared::models::role::ensure_default_role;
use terrea_shared::notifications::RedisEmailQueue;
use terrea_shared::redis::{RedisClient, RedisConfig, RedisViewCache};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    tracing::info!("Terrea API Server v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;

    let (repos, db) = match &config.database {
        Some(db_config) => {
            let pool =
                pool::connect(&pool::PoolConfig::new(db_config.url.clone(), db_config.max_connections))
                    .await?;
            migrations::run_migrations(&pool).await?;
            (Repositories::postgres(pool.clone()), Some(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using the in-memory store (data is lost on exit)");
            (MemoryStore::new().repositories(), None)
        }
    };

    let role = ensure_default_role(repos.roles.as_ref(), &config.accounts.default_role).await?;
    tracing::info!(role_id = role.id, role = %role.name, "Default role ready");

    let hasher = CredentialHasher::new(config.accounts.hash_cost())?;

    let mut deps = Dependencies::new(repos, hasher, role.id);
    deps.db = db.clone();

    if let Some(redis_config) = &config.redis {
        let client = RedisClient::connect(RedisConfig::new(redis_config.url.clone())).await?;
        let timeout = client.command_timeout();

        deps.cache = Arc::new(RedisViewCache::new(
            client.connection(),
            Duration::from_secs(redis_config.cache_ttl_secs),
            timeout,
        ));
        deps.notifier = Arc::new(RedisEmailQueue::new(
            client.connection(),
            redis_config.email_queue_key.clone(),
            timeout,
        ));
        deps.redis = Some(client);
    } else {
        tracing::warn!("REDIS_URL not set; view cache and e-mail notifications disabled");
    }

    let bind_address = config.bind_address();
    let app = build_router(AppState::new(config, deps));

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(pool) = db {
        pool::close(pool).await;
    }

    tracing::info!("Server stopped");
    Ok(())
}

/// `RUST_LOG` filter plus a human or JSON (`LOG_FORMAT=json`) formatter
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "terrea_api=debug,terrea_shared=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    if std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json")) {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received, draining connections...");
}
