/// Redis integration
///
/// Redis is optional for Terrea. When configured it provides:
///
/// - a read-through cache of profile and project views ([`cache`])
/// - the e-mail job queue consumed by the worker
///   ([`crate::notifications::RedisEmailQueue`])
///
/// ```text
///            GET/SET EX                     LPUSH                 BRPOP
/// ┌─────┐  user_name:{username}   ┌─────┐  terrea:email_jobs  ┌────────┐
/// │ API │ <──────────────────────>│Redis│<────────────────────│ Worker │
/// └─────┘  project_name:{name}    └─────┘                     └────────┘
/// ```
///
/// # Example
///
/// ```no_run
/// use terrea_shared::redis::client::{RedisClient, RedisConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = RedisClient::connect(RedisConfig::new("redis://localhost:6379")).await?;
/// client.ping().await?;
/// # Ok(())
/// # }
/// ```

pub mod cache;
pub mod client;

pub use cache::{CacheKey, CachedView, NoCache, RedisViewCache, ViewCache};
pub use client::{RedisClient, RedisClientError, RedisConfig};
