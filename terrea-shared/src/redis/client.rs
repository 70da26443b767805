/// Shared Redis connection
///
/// [`RedisClient`] owns one `ConnectionManager` (multiplexed, reconnects on
/// its own). The view cache and the e-mail queue take cheap clones of it
/// via [`RedisClient::connection`]; the health endpoint uses [`RedisClient::ping`].
///
/// # Example
///
/// ```no_run
/// use terrea_shared::redis::{RedisClient, RedisConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = RedisClient::connect(RedisConfig::new("redis://localhost:6379")).await?;
/// client.ping().await?;
/// # Ok(())
/// # }
/// ```

use redis::aio::ConnectionManager;
use redis::RedisError;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RedisClientError {
    #[error("Invalid Redis URL: {0}")]
    InvalidUrl(#[source] RedisError),

    #[error("Failed to connect to Redis: {0}")]
    Connect(#[source] RedisError),

    #[error("Redis command failed: {0}")]
    Command(#[from] RedisError),

    #[error("Redis did not answer within {0:?}")]
    Timeout(Duration),

    #[error("Unexpected PING reply: {0}")]
    UnexpectedReply(String),
}

/// Connection settings
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// `redis://[user:password@]host:port[/db]`
    pub url: String,

    /// Upper bound for single commands issued through this client
    pub command_timeout: Duration,
}

impl RedisConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            command_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Clone)]
pub struct RedisClient {
    manager: ConnectionManager,
    command_timeout: Duration,
}

impl RedisClient {
    pub async fn connect(config: RedisConfig) -> Result<Self, RedisClientError> {
        let client = redis::Client::open(config.url.as_str()).map_err(RedisClientError::InvalidUrl)?;
        let manager = ConnectionManager::new(client)
            .await
            .map_err(RedisClientError::Connect)?;

        tracing::info!(url = %redact_credentials(&config.url), "Connected to Redis");

        Ok(Self {
            manager,
            command_timeout: config.command_timeout,
        })
    }

    /// Handle for issuing commands; clones share the same connection
    pub fn connection(&self) -> ConnectionManager {
        self.manager.clone()
    }

    pub fn command_timeout(&self) -> Duration {
        self.command_timeout
    }

    /// `PING`, bounded by the command timeout
    pub async fn ping(&self) -> Result<(), RedisClientError> {
        let mut conn = self.manager.clone();
        let reply: String = tokio::time::timeout(
            self.command_timeout,
            redis::cmd("PING").query_async(&mut conn),
        )
        .await
        .map_err(|_| RedisClientError::Timeout(self.command_timeout))??;

        if reply == "PONG" {
            Ok(())
        } else {
            Err(RedisClientError::UnexpectedReply(reply))
        }
    }
}

/// Hides the `user:password@` part of a connection URL for logging
fn redact_credentials(url: &str) -> String {
    match url.split_once("://") {
        Some((scheme, rest)) => match rest.rsplit_once('@') {
            Some((_, host)) => format!("{}://***@{}", scheme, host),
            None => url.to_string(),
        },
        None => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_credentials() {
        assert_eq!(
            redact_credentials("redis://user:p@ss@cache:6379/0"),
            "redis://***@cache:6379/0"
        );
        assert_eq!(redact_credentials("redis://cache:6379"), "redis://cache:6379");
    }

    #[tokio::test]
    async fn test_invalid_url() {
        let result = RedisClient::connect(RedisConfig::new("not a url")).await;
        assert!(matches!(result, Err(RedisClientError::InvalidUrl(_))));
    }

    #[tokio::test]
    #[ignore] // Requires running Redis instance
    async fn test_ping() {
        let client = RedisClient::connect(RedisConfig::new("redis://localhost:6379"))
            .await
            .unwrap();
        assert!(client.ping().await.is_ok());
    }
}
