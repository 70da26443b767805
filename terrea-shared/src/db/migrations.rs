/// Schema migrations
///
/// The SQL files in `migrations/` at the workspace root are compiled into
/// the binary; `terrea-api` applies pending ones on startup.
///
/// # Example
///
/// ```no_run
/// use terrea_shared::db::{migrations, pool};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = pool::connect(&pool::PoolConfig::new(std::env::var("DATABASE_URL")?, 5)).await?;
/// migrations::run_migrations(&pool).await?;
///
/// let status = migrations::get_migration_status(&pool).await?;
/// assert_eq!(status.pending(), 0);
/// # Ok(())
/// # }
/// ```

use sqlx::migrate::{MigrateError, Migrator};
use sqlx::postgres::PgPool;

static MIGRATOR: Migrator = sqlx::migrate!("../migrations");

/// Applied versus embedded migrations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    /// Successfully applied migrations recorded in `_sqlx_migrations`
    pub applied: usize,

    /// Migrations compiled into this binary
    pub embedded: usize,

    /// Highest applied version
    pub latest_version: Option<i64>,
}

impl MigrationStatus {
    pub fn pending(&self) -> usize {
        self.embedded.saturating_sub(self.applied)
    }
}

pub fn embedded_migrations() -> usize {
    MIGRATOR.iter().count()
}

/// Applies every pending migration
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrateError> {
    let embedded = embedded_migrations();
    tracing::info!(embedded, "Applying database migrations");

    MIGRATOR.run(pool).await.map_err(|e| {
        tracing::error!(error = %e, "Database migration failed");
        e
    })?;

    tracing::info!("Database schema is up to date");
    Ok(())
}

/// Reads `_sqlx_migrations`; a database that was never migrated has none applied
pub async fn get_migration_status(pool: &PgPool) -> Result<MigrationStatus, sqlx::Error> {
    let tracked: bool =
        sqlx::query_scalar("SELECT to_regclass('public._sqlx_migrations') IS NOT NULL")
            .fetch_one(pool)
            .await?;

    let (applied, latest_version) = if tracked {
        let (count, latest): (i64, Option<i64>) = sqlx::query_as(
            "SELECT COUNT(*), MAX(version) FROM _sqlx_migrations WHERE success",
        )
        .fetch_one(pool)
        .await?;
        (count as usize, latest)
    } else {
        (0, None)
    };

    Ok(MigrationStatus {
        applied,
        embedded: embedded_migrations(),
        latest_version,
    })
}
