/// E-mail templates
///
/// Usernames are restricted to letters, digits and `_` at registration, so
/// they are inserted into the HTML without escaping.

use crate::mailer::OutgoingEmail;
use terrea_shared::notifications::{EmailJob, EmailKind};

pub const REGISTRATION_SUBJECT: &str = "Confirm Registration";

/// Renders a queued job into the message to send
pub fn render(job: &EmailJob) -> OutgoingEmail {
    match job.kind {
        EmailKind::RegistrationConfirmation => OutgoingEmail {
            to: job.recipient.clone(),
            subject: REGISTRATION_SUBJECT.to_string(),
            html_body: format!(
                "<h1>Registration</h1><p>Hi {}, you have been registered at Terrea Web.</p>",
                job.username
            ),
        },
    }
}
