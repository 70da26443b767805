/// E-mail worker loop
///
/// # Architecture
///
/// ```text
/// EmailWorker
///   ├─> JobSource: Pop the next job (BRPOP with timeout)
///   ├─> templates: Render it
///   └─> Mailer: Send it
/// ```
///
/// Jobs are processed one at a time. Failures are logged and the job is
/// dropped: notifications are fire-and-forget. Shutdown is checked between
/// polls, so a popped job is always finished before the loop exits.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use terrea_shared::redis::{RedisClient, RedisConfig};
/// use terrea_worker::{mailer::LogMailer, queue::EmailQueue, worker::EmailWorker};
///
/// # async fn example() -> anyhow::Result<()> {
/// let redis = RedisClient::connect(RedisConfig::new("redis://localhost:6379")).await?;
/// let queue = EmailQueue::new(redis.connection(), "terrea:email_jobs", 5);
///
/// let worker = EmailWorker::new(Arc::new(queue), Arc::new(LogMailer));
/// let shutdown = worker.shutdown_token();
/// tokio::spawn(async move {
///     let _ = tokio::signal::ctrl_c().await;
///     shutdown.cancel();
/// });
///
/// worker.run().await;
/// # Ok(())
/// # }
/// ```

use crate::mailer::{Mailer, MailerError};
use crate::queue::{JobSource, QueueError};
use crate::templates;
use std::sync::Arc;
use std::time::Duration;
use terrea_shared::notifications::EmailJob;
use tokio_util::sync::CancellationToken;

/// Pause after a queue error before polling again
const ERROR_BACKOFF: Duration = Duration::from_secs(1);

/// Counters reported when the loop exits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub sent: u64,
    pub failed: u64,
    pub malformed: u64,
}

pub struct EmailWorker {
    source: Arc<dyn JobSource>,
    mailer: Arc<dyn Mailer>,
    shutdown_token: CancellationToken,
}

impl EmailWorker {
    pub fn new(source: Arc<dyn JobSource>, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            source,
            mailer,
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Gets shutdown token
    ///
    /// Used to signal graceful shutdown from external handlers.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// Consumes jobs until the shutdown token is cancelled
    pub async fn run(&self) -> WorkerStats {
        tracing::info!("E-mail worker starting");
        let mut stats = WorkerStats::default();

        while !self.shutdown_token.is_cancelled() {
            match self.source.next_job().await {
                Ok(Some(job)) => match process_job(self.mailer.as_ref(), &job).await {
                    Ok(()) => stats.sent += 1,
                    Err(_) => stats.failed += 1,
                },
                Ok(None) => {}
                Err(QueueError::Malformed(e)) => {
                    tracing::error!(error = %e, "Dropping malformed e-mail job");
                    stats.malformed += 1;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to read e-mail queue");
                    tokio::select! {
                        _ = self.shutdown_token.cancelled() => {}
                        _ = tokio::time::sleep(ERROR_BACKOFF) => {}
                    }
                }
            }
        }

        tracing::info!(
            sent = stats.sent,
            failed = stats.failed,
            malformed = stats.malformed,
            "E-mail worker shut down"
        );
        stats
    }
}

/// Renders and sends one job; failures are logged and returned
pub async fn process_job(mailer: &dyn Mailer, job: &EmailJob) -> Result<(), MailerError> {
    let email = templates::render(job);

    match mailer.send(email).await {
        Ok(()) => {
            tracing::info!(job_id = %job.id, kind = ?job.kind, "E-mail sent");
            Ok(())
        }
        Err(e) => {
            tracing::error!(job_id = %job.id, kind = ?job.kind, error = %e, "Failed to send e-mail");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mailer::OutgoingEmail;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays scripted results, then cancels the worker
    struct ScriptedSource {
        script: Mutex<VecDeque<Result<Option<EmailJob>, QueueError>>>,
        shutdown: CancellationToken,
    }

    #[async_trait]
    impl JobSource for ScriptedSource {
        async fn next_job(&self) -> Result<Option<EmailJob>, QueueError> {
            let next = self.script.lock().unwrap().pop_front();
            match next {
                Some(result) => result,
                None => {
                    self.shutdown.cancel();
                    Ok(None)
                }
            }
        }
    }

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<OutgoingEmail>>,
        reject: Option<String>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, email: OutgoingEmail) -> Result<(), MailerError> {
            if let Some(reason) = &self.reject {
                return Err(MailerError::Build(reason.clone()));
            }
            self.sent.lock().unwrap().push(email);
            Ok(())
        }
    }

    fn worker_with(
        script: Vec<Result<Option<EmailJob>, QueueError>>,
        mailer: Arc<RecordingMailer>,
    ) -> EmailWorker {
        let shutdown = CancellationToken::new();
        let source = Arc::new(ScriptedSource {
            script: Mutex::new(script.into()),
            shutdown: shutdown.clone(),
        });
        EmailWorker {
            source,
            mailer,
            shutdown_token: shutdown,
        }
    }

    #[tokio::test]
    async fn test_sends_every_job() {
        let mailer = Arc::new(RecordingMailer::default());
        let worker = worker_with(
            vec![
                Ok(Some(EmailJob::registration("a@x.com", "alice"))),
                Ok(None),
                Ok(Some(EmailJob::registration("b@x.com", "bob"))),
            ],
            mailer.clone(),
        );

        let stats = worker.run().await;

        assert_eq!(stats.sent, 2);
        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent[0].to, "a@x.com");
        assert_eq!(sent[1].to, "b@x.com");
        assert_eq!(sent[0].subject, "Confirm Registration");
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_the_loop() {
        let mailer = Arc::new(RecordingMailer {
            reject: Some("relay down".to_string()),
            ..Default::default()
        });
        let malformed = serde_json::from_str::<EmailJob>("not json").unwrap_err();
        let worker = worker_with(
            vec![
                Ok(Some(EmailJob::registration("a@x.com", "alice"))),
                Err(QueueError::Malformed(malformed)),
                Ok(Some(EmailJob::registration("b@x.com", "bob"))),
            ],
            mailer,
        );

        let stats = worker.run().await;

        assert_eq!(
            stats,
            WorkerStats {
                sent: 0,
                failed: 2,
                malformed: 1
            }
        );
    }

    #[tokio::test]
    async fn test_stops_when_cancelled_before_start() {
        let mailer = Arc::new(RecordingMailer::default());
        let worker = worker_with(
            vec![Ok(Some(EmailJob::registration("a@x.com", "alice")))],
            mailer.clone(),
        );
        worker.shutdown_token().cancel();

        let stats = worker.run().await;

        assert_eq!(stats, WorkerStats::default());
        assert!(mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_process_job_reports_failure() {
        let mailer = RecordingMailer {
            reject: Some("mailbox full".to_string()),
            ..Default::default()
        };

        let result = process_job(&mailer, &EmailJob::registration("a@x.com", "alice")).await;

        assert!(matches!(result, Err(MailerError::Build(ref r)) if r == "mailbox full"));
    }
}
