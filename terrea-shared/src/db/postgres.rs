/// PostgreSQL repository implementation
///
/// [`PgRepository`] implements [`Repository`] once for every entity that
/// describes its table through [`PgEntity`]. Queries are assembled with
/// `sqlx::QueryBuilder`, so every value is bound as a parameter:
///
/// ```text
/// INSERT INTO users (username, email, password, role_id) VALUES ($1, $2, $3, $4) RETURNING ...
/// SELECT ... FROM users WHERE email = $1 ORDER BY id LIMIT 1
/// UPDATE users SET username = $1, is_active = $2 WHERE id = $3 RETURNING ...
/// DELETE FROM users WHERE id = $1
/// ```

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::query_builder::Separated;
use sqlx::{FromRow, Postgres, QueryBuilder};
use std::marker::PhantomData;

use super::repository::{Entity, Repository, StoreError};

/// Table mapping for an entity stored in PostgreSQL
pub trait PgEntity: Entity + for<'r> FromRow<'r, PgRow> {
    /// Table name
    const TABLE: &'static str;
    /// Columns selected and returned, in `FromRow` order
    const COLUMNS: &'static str;
    /// Columns written by `bind_insert`, in bind order
    const INSERT_COLUMNS: &'static str;

    /// Binds one value per `INSERT_COLUMNS` entry
    fn bind_insert(values: &mut Separated<'_, 'static, Postgres, &'static str>, new: Self::New);

    /// Pushes `column = $n` assignments; returns the number of patched fields
    fn push_patch(set: &mut Separated<'_, 'static, Postgres, &'static str>, patch: Self::Patch) -> usize;

    /// Pushes the `WHERE` predicate for `key`
    fn push_key(builder: &mut QueryBuilder<'static, Postgres>, key: &Self::Key);
}

/// Generic PostgreSQL repository
pub struct PgRepository<E> {
    pool: PgPool,
    _entity: PhantomData<fn() -> E>,
}

impl<E> PgRepository<E> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _entity: PhantomData,
        }
    }
}

impl<E> Clone for PgRepository<E> {
    fn clone(&self) -> Self {
        Self::new(self.pool.clone())
    }
}

impl<E: PgEntity> PgRepository<E> {
    fn select(key: &E::Key) -> QueryBuilder<'static, Postgres> {
        let mut builder = QueryBuilder::new(format!("SELECT {} FROM {} WHERE ", E::COLUMNS, E::TABLE));
        E::push_key(&mut builder, key);
        builder.push(" ORDER BY id");
        builder
    }
}

#[async_trait]
impl<E: PgEntity> Repository<E> for PgRepository<E> {
    async fn insert(&self, new: E::New) -> Result<E, StoreError> {
        let mut builder: QueryBuilder<'static, Postgres> = QueryBuilder::new(format!(
            "INSERT INTO {} ({}) VALUES (",
            E::TABLE,
            E::INSERT_COLUMNS
        ));
        E::bind_insert(&mut builder.separated(", "), new);
        builder.push(") RETURNING ").push(E::COLUMNS);

        let record = builder
            .build_query_as::<E>()
            .fetch_one(&self.pool)
            .await
            .map_err(StoreError::from)?;

        tracing::debug!(entity = E::NAME, id = record.id(), "Inserted record");
        Ok(record)
    }

    async fn find_one(&self, key: &E::Key) -> Result<Option<E>, StoreError> {
        let mut builder = Self::select(key);
        builder.push(" LIMIT 1");

        Ok(builder
            .build_query_as::<E>()
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_many(&self, key: &E::Key) -> Result<Vec<E>, StoreError> {
        let mut builder = Self::select(key);

        Ok(builder.build_query_as::<E>().fetch_all(&self.pool).await?)
    }

    async fn update(&self, key: &E::Key, patch: E::Patch) -> Result<Option<E>, StoreError> {
        let mut builder: QueryBuilder<'static, Postgres> =
            QueryBuilder::new(format!("UPDATE {} SET ", E::TABLE));
        let fields = E::push_patch(&mut builder.separated(", "), patch);
        if fields == 0 {
            return self.find_one(key).await;
        }

        builder.push(" WHERE id = (SELECT id FROM ")
            .push(E::TABLE)
            .push(" WHERE ");
        E::push_key(&mut builder, key);
        builder.push(" ORDER BY id LIMIT 1) RETURNING ").push(E::COLUMNS);

        Ok(builder
            .build_query_as::<E>()
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete(&self, key: &E::Key) -> Result<u64, StoreError> {
        let mut builder: QueryBuilder<'static, Postgres> =
            QueryBuilder::new(format!("DELETE FROM {} WHERE ", E::TABLE));
        E::push_key(&mut builder, key);

        let result = builder.build().execute(&self.pool).await?;

        tracing::debug!(entity = E::NAME, key = ?key, removed = result.rows_affected(), "Deleted records");
        Ok(result.rows_affected())
    }
}
