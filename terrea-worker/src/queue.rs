/// E-mail job queue reader
///
/// The API pushes JSON-encoded [`EmailJob`]s with `LPUSH`; [`EmailQueue`]
/// pops them from the other end with `BRPOP`, so jobs are delivered in
/// FIFO order and each job reaches exactly one worker.
///
/// # Polling Strategy
///
/// `BRPOP` blocks for at most `poll_timeout_secs` and yields `None` on
/// timeout, which gives the worker loop a chance to notice shutdown.
///
/// # Example
///
/// ```no_run
/// use terrea_shared::redis::{RedisClient, RedisConfig};
/// use terrea_worker::queue::{EmailQueue, JobSource};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let redis = RedisClient::connect(RedisConfig::new("redis://localhost:6379")).await?;
/// let queue = EmailQueue::new(redis.connection(), "terrea:email_jobs", 5);
///
/// if let Some(job) = queue.next_job().await? {
///     println!("Popped job {} for {}", job.id, job.recipient);
/// }
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use terrea_shared::notifications::EmailJob;
use thiserror::Error;

/// Job queue error
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Redis error: {0}")]
    Backend(#[from] redis::RedisError),

    /// The payload is not a valid job; it has been removed from the queue
    #[error("Malformed job payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Where the worker gets its jobs from
#[async_trait]
pub trait JobSource: Send + Sync {
    /// Next job, or `None` when nothing arrived within the poll window
    async fn next_job(&self) -> Result<Option<EmailJob>, QueueError>;
}

/// Redis list consumer
pub struct EmailQueue {
    conn: ConnectionManager,
    queue_key: String,
    poll_timeout_secs: u64,
}

impl EmailQueue {
    pub fn new(conn: ConnectionManager, queue_key: impl Into<String>, poll_timeout_secs: u64) -> Self {
        Self {
            conn,
            queue_key: queue_key.into(),
            poll_timeout_secs,
        }
    }

    pub fn queue_key(&self) -> &str {
        &self.queue_key
    }
}

#[async_trait]
impl JobSource for EmailQueue {
    async fn next_job(&self) -> Result<Option<EmailJob>, QueueError> {
        let mut conn = self.conn.clone();

        let popped: Option<(String, String)> = redis::cmd("BRPOP")
            .arg(&self.queue_key)
            .arg(self.poll_timeout_secs)
            .query_async(&mut conn)
            .await?;

        match popped {
            Some((_, payload)) => Ok(Some(serde_json::from_str(&payload)?)),
            None => Ok(None),
        }
    }
}
