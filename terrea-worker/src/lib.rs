//! # Terrea Worker Library
//!
//! Delivers the e-mails the API queues in Redis.
//!
//! ## Modules
//!
//! - `config`: Worker configuration from the environment
//! - `queue`: Job source reading the Redis list
//! - `templates`: Rendering jobs into messages
//! - `mailer`: SMTP delivery
//! - `worker`: The consume-render-send loop

pub mod config;
pub mod mailer;
pub mod queue;
pub mod templates;
pub mod worker;
