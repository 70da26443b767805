/// Database layer for Terrea
///
/// # Modules
///
/// - `pool`: PostgreSQL connection pool, ping and usage stats
/// - `migrations`: Embedded migration runner
/// - `repository`: The generic `Repository<E>` trait and `StoreError`
/// - `postgres`: `PgRepository<E>`, the PostgreSQL backend
/// - `memory`: `MemoryStore`, the in-process backend
///
/// # Example
///
/// ```no_run
/// use terrea_shared::db::pool::{self, PoolConfig};
/// use terrea_shared::db::Repositories;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = pool::connect(&PoolConfig::new(std::env::var("DATABASE_URL")?, 10)).await?;
///
/// let repos = Repositories::postgres(pool);
/// # Ok(())
/// # }
/// ```

pub mod memory;
pub mod migrations;
pub mod pool;
pub mod postgres;
pub mod repository;

use std::sync::Arc;

use sqlx::PgPool;

use crate::models::{project::Project, role::Role, task::Task, user::User};
use postgres::PgRepository;
use repository::Repository;

/// One repository per entity, all backed by the same store
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn Repository<User>>,
    pub roles: Arc<dyn Repository<Role>>,
    pub projects: Arc<dyn Repository<Project>>,
    pub tasks: Arc<dyn Repository<Task>>,
}

impl Repositories {
    /// PostgreSQL-backed repositories sharing `pool`
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PgRepository::<User>::new(pool.clone())),
            roles: Arc::new(PgRepository::<Role>::new(pool.clone())),
            projects: Arc::new(PgRepository::<Project>::new(pool.clone())),
            tasks: Arc::new(PgRepository::<Task>::new(pool)),
        }
    }
}
