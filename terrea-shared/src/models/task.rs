/// Task model
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id BIGSERIAL PRIMARY KEY,
///     name VARCHAR(100) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     deadline DATE,
///     project_id BIGINT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     customer_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     performer_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE
/// );
/// ```
///
/// The customer is the user who created the task; the performer is the
/// user expected to complete it. Access is governed by the parent project.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::query_builder::Separated;
use sqlx::{Postgres, QueryBuilder};

use crate::db::postgres::PgEntity;
use crate::db::repository::Entity;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    /// Refreshed on every update
    pub updated_at: DateTime<Utc>,
    pub deadline: Option<NaiveDate>,
    pub project_id: i64,
    pub customer_id: i64,
    pub performer_id: i64,
}

#[derive(Debug, Clone)]
pub struct NewTask {
    pub name: String,
    pub deadline: Option<NaiveDate>,
    pub project_id: i64,
    pub customer_id: i64,
    pub performer_id: i64,
}

#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub name: Option<String>,
    /// `Some(None)` clears the deadline
    pub deadline: Option<Option<NaiveDate>>,
    pub performer_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskKey {
    Id(i64),
    Project(i64),
    Customer(i64),
    Performer(i64),
}

impl Entity for Task {
    type New = NewTask;
    type Patch = TaskPatch;
    type Key = TaskKey;

    const NAME: &'static str = "task";

    fn id(&self) -> i64 {
        self.id
    }
}

impl PgEntity for Task {
    const TABLE: &'static str = "tasks";
    const COLUMNS: &'static str =
        "id, name, created_at, updated_at, deadline, project_id, customer_id, performer_id";
    const INSERT_COLUMNS: &'static str = "name, deadline, project_id, customer_id, performer_id";

    fn bind_insert(values: &mut Separated<'_, 'static, Postgres, &'static str>, new: NewTask) {
        values
            .push_bind(new.name)
            .push_bind(new.deadline)
            .push_bind(new.project_id)
            .push_bind(new.customer_id)
            .push_bind(new.performer_id);
    }

    fn push_patch(set: &mut Separated<'_, 'static, Postgres, &'static str>, patch: TaskPatch) -> usize {
        let mut fields = 0;
        if let Some(name) = patch.name {
            set.push("name = ").push_bind_unseparated(name);
            fields += 1;
        }
        if let Some(deadline) = patch.deadline {
            set.push("deadline = ").push_bind_unseparated(deadline);
            fields += 1;
        }
        if let Some(performer_id) = patch.performer_id {
            set.push("performer_id = ").push_bind_unseparated(performer_id);
            fields += 1;
        }
        if fields > 0 {
            set.push("updated_at = NOW()");
        }
        fields
    }

    fn push_key(builder: &mut QueryBuilder<'static, Postgres>, key: &TaskKey) {
        match key {
            TaskKey::Id(id) => builder.push("id = ").push_bind(*id),
            TaskKey::Project(id) => builder.push("project_id = ").push_bind(*id),
            TaskKey::Customer(id) => builder.push("customer_id = ").push_bind(*id),
            TaskKey::Performer(id) => builder.push("performer_id = ").push_bind(*id),
        };
    }
}

/// A task as returned to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskView {
    pub id: i64,
    pub name: String,
    pub customer_id: i64,
    pub performer_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deadline: Option<NaiveDate>,
}

impl From<Task> for TaskView {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            name: task.name,
            customer_id: task.customer_id,
            performer_id: task.performer_id,
            created_at: task.created_at,
            updated_at: task.updated_at,
            deadline: task.deadline,
        }
    }
}
