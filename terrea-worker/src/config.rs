/// Worker configuration
///
/// # Environment Variables
///
/// | Variable                  | Required | Default                  |
/// |---------------------------|----------|--------------------------|
/// | `REDIS_URL`               | yes      |                          |
/// | `EMAIL_QUEUE_KEY`         | no       | `terrea:email_jobs`      |
/// | `EMAIL_POLL_TIMEOUT_SECS` | no       | `5`                      |
/// | `SMTP_HOST`               | no       | unset: e-mails are logged |
/// | `SMTP_PORT`               | no       | `587`                    |
/// | `SMTP_FROM`               | no       | `noreply@terrea.local`   |
/// | `SMTP_USER`               | no       |                          |
/// | `SMTP_PASSWORD`           | no       |                          |

use anyhow::Context;
use std::env;
use terrea_shared::notifications::DEFAULT_EMAIL_QUEUE;

/// Default SMTP port (STARTTLS)
pub const DEFAULT_SMTP_PORT: u16 = 587;

/// Sender used when `SMTP_FROM` is unset
pub const DEFAULT_FROM_ADDRESS: &str = "noreply@terrea.local";

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub redis_url: String,

    /// Redis list the API pushes jobs onto
    pub queue_key: String,

    /// How long one `BRPOP` blocks; bounds shutdown latency
    pub poll_timeout_secs: u64,

    /// `None` logs e-mails instead of sending them
    pub smtp: Option<SmtpConfig>,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub from_address: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl WorkerConfig {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if `REDIS_URL` is missing or a numeric variable
    /// does not parse.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let redis_url = optional("REDIS_URL")
            .ok_or_else(|| anyhow::anyhow!("REDIS_URL environment variable is required"))?;

        let poll_timeout_secs = match optional("EMAIL_POLL_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("EMAIL_POLL_TIMEOUT_SECS has an invalid value: {:?}", raw))?,
            None => 5,
        };

        let smtp = match optional("SMTP_HOST") {
            Some(host) => Some(SmtpConfig {
                host,
                port: match optional("SMTP_PORT") {
                    Some(raw) => raw
                        .parse()
                        .with_context(|| format!("SMTP_PORT has an invalid value: {:?}", raw))?,
                    None => DEFAULT_SMTP_PORT,
                },
                from_address: optional("SMTP_FROM")
                    .unwrap_or_else(|| DEFAULT_FROM_ADDRESS.to_string()),
                username: optional("SMTP_USER"),
                password: optional("SMTP_PASSWORD"),
            }),
            None => None,
        };

        Ok(Self {
            redis_url,
            queue_key: optional("EMAIL_QUEUE_KEY").unwrap_or_else(|| DEFAULT_EMAIL_QUEUE.to_string()),
            poll_timeout_secs,
            smtp,
        })
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
