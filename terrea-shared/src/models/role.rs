/// Role model
///
/// A role is a named, ordered list of permission strings. Users reference a
/// role through `role_id`; newly registered users get the default role,
/// which is created at startup if it does not exist yet (see
/// [`ensure_default_role`]).
///
/// Permissions are informational: endpoint access is decided by ownership.

use serde::{Deserialize, Serialize};
use sqlx::query_builder::Separated;
use sqlx::{Postgres, QueryBuilder};

use crate::db::postgres::PgEntity;
use crate::db::repository::{Entity, Repository, StoreError};

/// Name of the role assigned at registration when none is configured
pub const DEFAULT_ROLE_NAME: &str = "user";

/// Permissions granted to a freshly created default role
pub const DEFAULT_PERMISSIONS: [&str; 2] = ["read", "write"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Role {
    pub id: i64,
    pub name: String,
    pub permissions: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct NewRole {
    pub name: String,
    pub permissions: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RolePatch {
    pub name: Option<String>,
    pub permissions: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleKey {
    Id(i64),
    Name(String),
}

impl Entity for Role {
    type New = NewRole;
    type Patch = RolePatch;
    type Key = RoleKey;

    const NAME: &'static str = "role";

    fn id(&self) -> i64 {
        self.id
    }
}

impl PgEntity for Role {
    const TABLE: &'static str = "roles";
    const COLUMNS: &'static str = "id, name, permissions";
    const INSERT_COLUMNS: &'static str = "name, permissions";

    fn bind_insert(values: &mut Separated<'_, 'static, Postgres, &'static str>, new: NewRole) {
        values.push_bind(new.name).push_bind(new.permissions);
    }

    fn push_patch(set: &mut Separated<'_, 'static, Postgres, &'static str>, patch: RolePatch) -> usize {
        let mut fields = 0;
        if let Some(name) = patch.name {
            set.push("name = ").push_bind_unseparated(name);
            fields += 1;
        }
        if let Some(permissions) = patch.permissions {
            set.push("permissions = ").push_bind_unseparated(permissions);
            fields += 1;
        }
        fields
    }

    fn push_key(builder: &mut QueryBuilder<'static, Postgres>, key: &RoleKey) {
        match key {
            RoleKey::Id(id) => builder.push("id = ").push_bind(*id),
            RoleKey::Name(name) => builder.push("name = ").push_bind(name.clone()),
        };
    }
}

/// Returns the role called `name`, creating it with the default
/// permissions if it does not exist
///
/// A concurrent creation by another instance is resolved by re-reading.
pub async fn ensure_default_role(
    roles: &dyn Repository<Role>,
    name: &str,
) -> Result<Role, StoreError> {
    let key = RoleKey::Name(name.to_string());
    if let Some(role) = roles.find_one(&key).await? {
        return Ok(role);
    }

    let created = roles
        .insert(NewRole {
            name: name.to_string(),
            permissions: DEFAULT_PERMISSIONS.iter().map(|p| p.to_string()).collect(),
        })
        .await;

    match created {
        Ok(role) => {
            tracing::info!(role_id = role.id, role = %role.name, "Created default role");
            Ok(role)
        }
        Err(StoreError::Conflict { .. }) => roles
            .find_one(&key)
            .await?
            .ok_or_else(|| StoreError::Backend(format!("Role '{}' vanished after conflict", name))),
        Err(e) => Err(e),
    }
}
