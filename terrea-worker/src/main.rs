//! # Terrea Worker
//!
//! Pops e-mail jobs queued by the API from Redis and delivers them over
//! SMTP. Without `SMTP_HOST` the rendered e-mails are only logged.
//!
//! ## Usage
//!
//! ```bash
//! REDIS_URL=redis://localhost:6379 cargo run -p terrea-worker
//! ```

use std::sync::Arc;

use terrea_shared::redis::{RedisClient, RedisConfig};
use terrea_worker::config::WorkerConfig;
use terrea_worker::mailer::{LogMailer, Mailer, SmtpMailer};
use terrea_worker::queue::EmailQueue;
use terrea_worker::worker::EmailWorker;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "terrea_worker=debug".into());
    let registry = tracing_subscriber::registry().with(filter);
    if std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json")) {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Terrea Worker v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = WorkerConfig::from_env()?;

    let redis = RedisClient::connect(RedisConfig::new(config.redis_url.clone())).await?;
    let queue = EmailQueue::new(
        redis.connection(),
        config.queue_key.clone(),
        config.poll_timeout_secs,
    );

    let mailer: Arc<dyn Mailer> = match &config.smtp {
        Some(smtp) => {
            tracing::info!(host = %smtp.host, port = smtp.port, "Delivering via SMTP");
            Arc::new(SmtpMailer::new(smtp)?)
        }
        None => {
            tracing::warn!("SMTP_HOST not set; e-mails will be logged, not sent");
            Arc::new(LogMailer)
        }
    };

    tracing::info!(queue = %queue.queue_key(), "Worker ready and listening for e-mail jobs");
    let worker = EmailWorker::new(Arc::new(queue), mailer);

    let shutdown = worker.shutdown_token();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for shutdown signal: {}", e);
            return;
        }
        tracing::info!("Shutdown signal received, finishing current job...");
        shutdown.cancel();
    });

    worker.run().await;
    Ok(())
}
