/// Health check endpoint
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "database": "connected",
///   "database_pool": { "size": 3, "idle": 2, "in_use": 1 },
///   "redis": "disabled"
/// }
/// ```
///
/// `database` is `in_memory` when no `DATABASE_URL` is configured and
/// `redis` is `disabled` without `REDIS_URL`. Any `disconnected` backend
/// reports the service as `degraded`.

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Json};
use serde::Serialize;
use terrea_shared::db::pool;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_pool: Option<pool::PoolStats>,
    pub redis: String,
}

pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let database = match &state.db {
        Some(db) => match pool::ping(db).await {
            Ok(()) => "connected",
            Err(e) => {
                tracing::warn!(error = %e, "Database health check failed");
                "disconnected"
            }
        },
        None => "in_memory",
    };

    let redis = match &state.redis {
        Some(client) => match client.ping().await {
            Ok(()) => "connected",
            Err(e) => {
                tracing::warn!(error = %e, "Redis health check failed");
                "disconnected"
            }
        },
        None => "disabled",
    };

    let status = if database == "disconnected" || redis == "disconnected" {
        "degraded"
    } else {
        "healthy"
    };

    Ok(Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: database.to_string(),
        database_pool: state.db.as_ref().map(pool::PoolStats::of),
        redis: redis.to_string(),
    }))
}
