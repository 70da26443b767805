/// Fire-and-forget e-mail notifications
///
/// Use-cases describe the e-mail to send as an [`EmailJob`] and hand it to a
/// [`Notifier`]. In production the job is pushed onto a Redis list and
/// delivered by `terrea-worker`; without Redis a [`NoopNotifier`] drops it.
///
/// Dispatch errors are returned to the caller, which logs them and carries
/// on: a failed notification never fails the operation that triggered it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Default Redis list holding pending e-mail jobs
pub const DEFAULT_EMAIL_QUEUE: &str = "terrea:email_jobs";

/// Error type for notification dispatch
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Queue backend error: {0}")]
    Backend(#[from] redis::RedisError),

    #[error("Failed to serialize job: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Queue push timed out")]
    Timeout,
}

/// Which e-mail to send
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailKind {
    /// Sent once after registration
    RegistrationConfirmation,
}

/// A queued e-mail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailJob {
    pub id: Uuid,
    pub kind: EmailKind,
    pub recipient: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

impl EmailJob {
    pub fn registration(recipient: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: EmailKind::RegistrationConfirmation,
            recipient: recipient.into(),
            username: username.into(),
            created_at: Utc::now(),
        }
    }
}

/// Hands e-mail jobs off for background delivery
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn dispatch(&self, job: EmailJob) -> Result<(), NotifyError>;
}

/// Discards every job
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn dispatch(&self, job: EmailJob) -> Result<(), NotifyError> {
        tracing::debug!(job_id = %job.id, "E-mail delivery disabled; dropping job");
        Ok(())
    }
}

/// Pushes jobs onto a Redis list (`LPUSH`); the worker pops with `BRPOP`
#[derive(Clone)]
pub struct RedisEmailQueue {
    conn: ConnectionManager,
    queue_key: String,
    command_timeout: Duration,
}

impl RedisEmailQueue {
    pub fn new(conn: ConnectionManager, queue_key: impl Into<String>, command_timeout: Duration) -> Self {
        Self {
            conn,
            queue_key: queue_key.into(),
            command_timeout,
        }
    }
}

#[async_trait]
impl Notifier for RedisEmailQueue {
    async fn dispatch(&self, job: EmailJob) -> Result<(), NotifyError> {
        let payload = serde_json::to_string(&job)?;
        let mut conn = self.conn.clone();

        let mut cmd = redis::cmd("LPUSH");
        cmd.arg(&self.queue_key).arg(payload);

        let depth: i64 = tokio::time::timeout(self.command_timeout, cmd.query_async(&mut conn))
            .await
            .map_err(|_| NotifyError::Timeout)??;

        tracing::info!(job_id = %job.id, queue = %self.queue_key, depth, "Queued e-mail job");
        Ok(())
    }
}
