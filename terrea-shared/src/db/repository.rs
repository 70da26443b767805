/// Generic repository abstraction
///
/// Every persisted entity (user, role, project, task) implements [`Entity`],
/// which names its creation payload, partial-update payload and lookup key.
/// A single [`Repository`] trait then covers all CRUD access, and each
/// storage backend provides one generic implementation:
///
/// - [`crate::db::postgres::PgRepository`] for PostgreSQL
/// - [`crate::db::memory::MemoryRepository`] for the in-process store
///
/// All backend failures surface as [`StoreError`]. Unique-constraint
/// violations are reported separately so that use-cases can turn a lost
/// race into a `Conflict` instead of a server error.
///
/// # Example
///
/// ```no_run
/// use terrea_shared::db::repository::Repository;
/// use terrea_shared::models::user::{User, UserKey};
///
/// # async fn example(users: &dyn Repository<User>) -> Result<(), Box<dyn std::error::Error>> {
/// if let Some(user) = users.find_one(&UserKey::Email("alice@example.com".into())).await? {
///     println!("found {}", user.username);
/// }
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use std::fmt::Debug;
use thiserror::Error;

/// Error type for repository operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A unique constraint rejected the write
    #[error("Unique constraint violated: {constraint}")]
    Conflict { constraint: String },

    /// Any other backend failure
    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Returns true if this is a violation of `constraint`
    pub fn is_conflict_on(&self, constraint: &str) -> bool {
        matches!(self, StoreError::Conflict { constraint: c } if c == constraint)
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return StoreError::Conflict {
                    constraint: db_err.constraint().unwrap_or_default().to_string(),
                };
            }
        }
        StoreError::Backend(err.to_string())
    }
}

/// A persisted record type
pub trait Entity: Clone + Debug + Send + Sync + Unpin + 'static {
    /// Payload for `insert`
    type New: Debug + Send + 'static;
    /// Partial update payload; unset fields are left unchanged
    type Patch: Debug + Default + Send + 'static;
    /// Lookup key used by `find_*`, `update` and `delete`
    type Key: Debug + Send + Sync + 'static;

    /// Human-readable name used in logs
    const NAME: &'static str;

    /// Primary key of this record
    fn id(&self) -> i64;
}

/// CRUD access to one entity type
#[async_trait]
pub trait Repository<E: Entity>: Send + Sync {
    /// Persists a new record and returns it with its generated fields
    async fn insert(&self, new: E::New) -> Result<E, StoreError>;

    /// First record (lowest id) matching `key`
    async fn find_one(&self, key: &E::Key) -> Result<Option<E>, StoreError>;

    /// All records matching `key`, ordered by id
    async fn find_many(&self, key: &E::Key) -> Result<Vec<E>, StoreError>;

    /// Applies `patch` to the first record matching `key`
    async fn update(&self, key: &E::Key, patch: E::Patch) -> Result<Option<E>, StoreError>;

    /// Deletes every record matching `key` and returns how many were removed
    async fn delete(&self, key: &E::Key) -> Result<u64, StoreError>;
}
