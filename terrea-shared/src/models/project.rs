/// Project model
///
/// # Schema
///
/// ```sql
/// CREATE TABLE projects (
///     id BIGSERIAL PRIMARY KEY,
///     name VARCHAR(50) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     owner_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     UNIQUE (owner_id, name)
/// );
/// ```
///
/// Project names are unique per owner only; lookups by name alone return
/// the lowest id.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::query_builder::Separated;
use sqlx::{Postgres, QueryBuilder};

use super::task::TaskView;
use crate::db::postgres::PgEntity;
use crate::db::repository::Entity;

/// Unique constraint on `(projects.owner_id, projects.name)`
pub const OWNER_NAME_CONSTRAINT: &str = "projects_owner_name_key";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub owner_id: i64,
}

#[derive(Debug, Clone)]
pub struct NewProject {
    pub name: String,
    pub owner_id: i64,
}

#[derive(Debug, Clone, Default)]
pub struct ProjectPatch {
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectKey {
    Id(i64),
    Name(String),
    Owner(i64),
}

impl Entity for Project {
    type New = NewProject;
    type Patch = ProjectPatch;
    type Key = ProjectKey;

    const NAME: &'static str = "project";

    fn id(&self) -> i64 {
        self.id
    }
}

impl PgEntity for Project {
    const TABLE: &'static str = "projects";
    const COLUMNS: &'static str = "id, name, created_at, owner_id";
    const INSERT_COLUMNS: &'static str = "name, owner_id";

    fn bind_insert(values: &mut Separated<'_, 'static, Postgres, &'static str>, new: NewProject) {
        values.push_bind(new.name).push_bind(new.owner_id);
    }

    fn push_patch(set: &mut Separated<'_, 'static, Postgres, &'static str>, patch: ProjectPatch) -> usize {
        match patch.name {
            Some(name) => {
                set.push("name = ").push_bind_unseparated(name);
                1
            }
            None => 0,
        }
    }

    fn push_key(builder: &mut QueryBuilder<'static, Postgres>, key: &ProjectKey) {
        match key {
            ProjectKey::Id(id) => builder.push("id = ").push_bind(*id),
            ProjectKey::Name(name) => builder.push("name = ").push_bind(name.clone()),
            ProjectKey::Owner(owner_id) => builder.push("owner_id = ").push_bind(*owner_id),
        };
    }
}

/// A project with its tasks, as returned to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectView {
    pub id: i64,
    pub name: String,
    /// Creation date (time of day dropped)
    pub created_at: NaiveDate,
    pub owner_id: i64,
    pub tasks: Vec<TaskView>,
}

impl ProjectView {
    pub fn new(project: &Project, tasks: Vec<TaskView>) -> Self {
        Self {
            id: project.id,
            name: project.name.clone(),
            created_at: project.created_at.date_naive(),
            owner_id: project.owner_id,
            tasks,
        }
    }
}
