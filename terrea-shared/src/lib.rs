//! # Terrea Shared Library
//!
//! This crate contains the domain types, persistence layer and use-case
//! services shared by the Terrea API server and the notification worker.
//!
//! ## Module Organization
//!
//! - `models`: Users, roles, projects, tasks and their read views
//! - `db`: Connection pool, migrations and the generic repository layer
//! - `auth`: Password hashing, session tokens, cookie handling and ownership checks
//! - `redis`: Redis client and the read-through view cache
//! - `notifications`: Fire-and-forget e-mail job dispatch
//! - `services`: Profile and project/task use-cases
//! - `validation`: Character policies for user-supplied names
//! - `error`: The use-case error taxonomy

pub mod auth;
pub mod db;
pub mod error;
pub mod models;
pub mod notifications;
pub mod redis;
pub mod services;
pub mod validation;

/// Current version of the Terrea shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
