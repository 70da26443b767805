/// Request middleware
///
/// - `auth`: resolves the session cookie into the acting user

pub mod auth;
