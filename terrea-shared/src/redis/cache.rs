/// Read-through view cache
///
/// Profile and project views are cached as JSON under
/// `user_name:{username}` and `project_name:{name}` with a TTL. The cache is
/// purely an optimization: every failure is logged and treated as a miss,
/// and [`NoCache`] can be substituted without changing behavior.
///
/// Callers invalidate keys after any mutation that changes a cached view.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::models::project::ProjectView;
use crate::models::user::ProfileView;

/// Error type for cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache backend error: {0}")]
    Backend(#[from] redis::RedisError),

    #[error("Cache entry could not be (de)serialized: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Cache command timed out")]
    Timeout,
}

/// Cache key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Profile view by username
    Profile(String),
    /// Project view by project name
    Project(String),
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Profile(username) => write!(f, "user_name:{}", username),
            CacheKey::Project(name) => write!(f, "project_name:{}", name),
        }
    }
}

/// A cached value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "view", rename_all = "snake_case")]
pub enum CachedView {
    Profile(ProfileView),
    Project(ProjectView),
}

/// Best-effort view cache
#[async_trait]
pub trait ViewCache: Send + Sync {
    /// Cached view for `key`, or `None` on miss or failure
    async fn get(&self, key: &CacheKey) -> Option<CachedView>;

    /// Stores `view` under `key`; failures are logged
    async fn put(&self, key: &CacheKey, view: &CachedView);

    /// Drops `key`; failures are logged
    async fn invalidate(&self, key: &CacheKey);
}

/// Cache that stores nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

#[async_trait]
impl ViewCache for NoCache {
    async fn get(&self, _key: &CacheKey) -> Option<CachedView> {
        None
    }

    async fn put(&self, _key: &CacheKey, _view: &CachedView) {}

    async fn invalidate(&self, _key: &CacheKey) {}
}

/// Redis-backed view cache
#[derive(Clone)]
pub struct RedisViewCache {
    conn: ConnectionManager,
    ttl: Duration,
    command_timeout: Duration,
}

impl RedisViewCache {
    pub fn new(conn: ConnectionManager, ttl: Duration, command_timeout: Duration) -> Self {
        Self {
            conn,
            ttl,
            command_timeout,
        }
    }

    async fn query<T: redis::FromRedisValue>(&self, cmd: redis::Cmd) -> Result<T, CacheError> {
        let mut conn = self.conn.clone();
        tokio::time::timeout(self.command_timeout, cmd.query_async(&mut conn))
            .await
            .map_err(|_| CacheError::Timeout)?
            .map_err(CacheError::from)
    }

    async fn try_get(&self, key: &CacheKey) -> Result<Option<CachedView>, CacheError> {
        let mut cmd = redis::cmd("GET");
        cmd.arg(key.to_string());

        let raw: Option<String> = self.query(cmd).await?;
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn try_put(&self, key: &CacheKey, view: &CachedView) -> Result<(), CacheError> {
        let mut cmd = redis::cmd("SET");
        cmd.arg(key.to_string())
            .arg(serde_json::to_string(view)?)
            .arg("EX")
            .arg(self.ttl.as_secs().max(1));

        self.query::<()>(cmd).await
    }

    async fn try_invalidate(&self, key: &CacheKey) -> Result<(), CacheError> {
        let mut cmd = redis::cmd("DEL");
        cmd.arg(key.to_string());

        self.query::<()>(cmd).await
    }
}

#[async_trait]
impl ViewCache for RedisViewCache {
    async fn get(&self, key: &CacheKey) -> Option<CachedView> {
        match self.try_get(key).await {
            Ok(hit) => {
                tracing::debug!(key = %key, hit = hit.is_some(), "Cache lookup");
                hit
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cache read failed; treating as miss");
                None
            }
        }
    }

    async fn put(&self, key: &CacheKey, view: &CachedView) {
        if let Err(e) = self.try_put(key, view).await {
            tracing::warn!(key = %key, error = %e, "Cache write failed");
        }
    }

    async fn invalidate(&self, key: &CacheKey) {
        if let Err(e) = self.try_invalidate(key).await {
            tracing::warn!(key = %key, error = %e, "Cache invalidation failed");
        }
    }
}
