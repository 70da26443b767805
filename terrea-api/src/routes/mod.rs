/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `profile`: Registration, login, logout and profile management
/// - `projects`: Projects and their tasks

pub mod health;
pub mod profile;
pub mod projects;

use serde::{Deserialize, Serialize};

/// Body of successful mutations
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub status_code: u16,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status_code: 200,
            message: message.into(),
        }
    }
}
