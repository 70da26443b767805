/// Configuration management for the API server
///
/// This module loads configuration from environment variables and provides
/// a type-safe configuration struct. It is built once in `main` and handed
/// to [`crate::app::AppState`]; nothing reads the environment afterwards.
///
/// # Environment Variables
///
/// - `API_HOST` / `API_PORT`: bind address (default: 0.0.0.0:8080)
/// - `CORS_ORIGINS`: comma-separated allowed origins, `*` for any
/// - `DATABASE_URL`: PostgreSQL connection string (unset: in-memory store)
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: 10)
/// - `JWT_SECRET`: secret key for session tokens (required, >= 32 chars)
/// - `ACCESS_TOKEN_EXPIRE_DAYS`: session lifetime (default: 7)
/// - `COOKIE_SECURE`: mark the session cookie `Secure` (default: false)
/// - `REDIS_URL`: enables the view cache and the e-mail queue
/// - `CACHE_TTL_SECS`: cache entry lifetime (default: 300)
/// - `EMAIL_QUEUE_KEY`: Redis list for e-mail jobs
/// - `DEFAULT_ROLE`: role given to new users (default: user)
/// - `HASH_MEMORY_KIB` / `HASH_ITERATIONS` / `HASH_PARALLELISM`: Argon2id cost
///
/// # Example
///
/// ```no_run
/// use terrea_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use terrea_shared::auth::password::HashCost;
use terrea_shared::models::role::DEFAULT_ROLE_NAME;
use terrea_shared::notifications::DEFAULT_EMAIL_QUEUE;

/// Minimum accepted length of `JWT_SECRET`
pub const MIN_SECRET_LEN: usize = 32;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration; `None` runs on the in-memory store
    pub database: Option<DatabaseConfig>,

    /// Session token configuration
    pub jwt: JwtConfig,

    /// Redis configuration; `None` disables caching and e-mail
    pub redis: Option<RedisConfig>,

    /// Account defaults
    pub accounts: AccountConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Allowed CORS origins (`*` means any)
    pub cors_origins: Vec<String>,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// Session token configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key for HS256 signing
    ///
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,

    /// Token and cookie lifetime in days
    pub access_token_expire_days: i64,

    /// Adds `Secure` to the session cookie
    pub cookie_secure: bool,
}

/// Redis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    pub url: String,

    /// Lifetime of cached profile and project views
    pub cache_ttl_secs: u64,

    /// List that e-mail jobs are pushed onto
    pub email_queue_key: String,
}

/// Account defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Name of the role assigned at registration
    pub default_role: String,

    pub hash_memory_kib: u32,
    pub hash_iterations: u32,
    pub hash_parallelism: u32,
}

impl AccountConfig {
    /// Argon2id cost for the credential hasher
    pub fn hash_cost(&self) -> HashCost {
        HashCost {
            memory_kib: self.hash_memory_kib,
            iterations: self.hash_iterations,
            parallelism: self.hash_parallelism,
        }
    }
}

impl Default for AccountConfig {
    fn default() -> Self {
        let cost = HashCost::default();
        Self {
            default_role: DEFAULT_ROLE_NAME.to_string(),
            hash_memory_kib: cost.memory_kib,
            hash_iterations: cost.iterations,
            hash_parallelism: cost.parallelism,
        }
    }
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `JWT_SECRET` is missing or shorter than 32 characters
    /// - A numeric or boolean variable has an invalid value
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < MIN_SECRET_LEN {
            anyhow::bail!("JWT_SECRET must be at least {} characters long", MIN_SECRET_LEN);
        }

        let database = match optional("DATABASE_URL") {
            Some(url) => Some(DatabaseConfig {
                url,
                max_connections: parse_or("DATABASE_MAX_CONNECTIONS", 10)?,
            }),
            None => None,
        };

        let redis = match optional("REDIS_URL") {
            Some(url) => Some(RedisConfig {
                url,
                cache_ttl_secs: parse_or("CACHE_TTL_SECS", 300)?,
                email_queue_key: optional("EMAIL_QUEUE_KEY")
                    .unwrap_or_else(|| DEFAULT_EMAIL_QUEUE.to_string()),
            }),
            None => None,
        };

        let defaults = AccountConfig::default();

        Ok(Self {
            api: ApiConfig {
                host: optional("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_or("API_PORT", 8080)?,
                cors_origins: parse_origins(
                    &optional("CORS_ORIGINS").unwrap_or_else(|| "http://localhost:3000".to_string()),
                ),
            },
            database,
            jwt: JwtConfig {
                secret: jwt_secret,
                access_token_expire_days: parse_or("ACCESS_TOKEN_EXPIRE_DAYS", 7)?,
                cookie_secure: parse_or("COOKIE_SECURE", false)?,
            },
            redis,
            accounts: AccountConfig {
                default_role: optional("DEFAULT_ROLE").unwrap_or(defaults.default_role),
                hash_memory_kib: parse_or("HASH_MEMORY_KIB", defaults.hash_memory_kib)?,
                hash_iterations: parse_or("HASH_ITERATIONS", defaults.hash_iterations)?,
                hash_parallelism: parse_or("HASH_PARALLELISM", defaults.hash_parallelism)?,
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

/// Reads a variable, treating an empty value as unset
fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value: {:?}", key, raw)),
        None => Ok(default),
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                cors_origins: vec!["*".to_string()],
            },
            database: None,
            jwt: JwtConfig {
                secret: "test-secret-key-at-least-32-bytes-long".to_string(),
                access_token_expire_days: 7,
                cookie_secure: false,
            },
            redis: None,
            accounts: AccountConfig::default(),
        }
    }

    #[test]
    fn test_bind_address() {
        assert_eq!(config().bind_address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_parse_origins() {
        assert_eq!(
            parse_origins("http://a.test, http://b.test,,"),
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
        assert!(parse_origins("").is_empty());
    }

    #[test]
    fn test_default_hash_cost() {
        let cost = config().accounts.hash_cost();
        assert_eq!(cost.memory_kib, 65536);
        assert_eq!(cost.iterations, 3);
        assert_eq!(cost.parallelism, 4);
    }
}
