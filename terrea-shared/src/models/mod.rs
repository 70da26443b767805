/// Domain models
///
/// Each model is a plain `sqlx::FromRow` record implementing
/// [`crate::db::repository::Entity`], together with its creation payload,
/// partial-update payload, lookup key and (where exposed over HTTP) a
/// password-free read view.
///
/// - [`user`]: Accounts, credentials and the profile view
/// - [`role`]: Named permission sets
/// - [`project`]: Owned projects and the project view
/// - [`task`]: Tasks inside a project

pub mod project;
pub mod role;
pub mod task;
pub mod user;
