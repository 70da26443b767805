/// User model
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id BIGSERIAL PRIMARY KEY,
///     username VARCHAR(20) NOT NULL UNIQUE,
///     email VARCHAR(255) NOT NULL UNIQUE,
///     password TEXT NOT NULL,
///     registered_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     role_id BIGINT NOT NULL REFERENCES roles(id),
///     is_active BOOLEAN NOT NULL DEFAULT TRUE
/// );
/// ```
///
/// Deleting a user cascades to the projects they own and to every task in
/// which they are customer or performer.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::query_builder::Separated;
use sqlx::{Postgres, QueryBuilder};

use super::project::ProjectView;
use super::task::TaskView;
use crate::db::postgres::PgEntity;
use crate::db::repository::Entity;

/// Unique constraint on `users.username`
pub const USERNAME_CONSTRAINT: &str = "users_username_key";
/// Unique constraint on `users.email`
pub const EMAIL_CONSTRAINT: &str = "users_email_key";

/// A registered account
///
/// The password field holds an Argon2id hash and is never serialized.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,

    #[serde(skip_serializing)]
    pub password: String,

    /// Set at creation, never changed
    pub registered_at: DateTime<Utc>,
    pub role_id: i64,

    /// False after logout, true again after login
    pub is_active: bool,
}

/// Input for creating a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    /// Already-hashed password
    pub password: String,
    pub role_id: i64,
}

/// Partial user update; `None` fields are left unchanged
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub username: Option<String>,
    pub email: Option<String>,
    /// Already-hashed password
    pub password: Option<String>,
    pub is_active: Option<bool>,
}

/// User lookup keys
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserKey {
    Id(i64),
    Email(String),
    Username(String),
}

impl Entity for User {
    type New = NewUser;
    type Patch = UserPatch;
    type Key = UserKey;

    const NAME: &'static str = "user";

    fn id(&self) -> i64 {
        self.id
    }
}

impl PgEntity for User {
    const TABLE: &'static str = "users";
    const COLUMNS: &'static str = "id, username, email, password, registered_at, role_id, is_active";
    const INSERT_COLUMNS: &'static str = "username, email, password, role_id";

    fn bind_insert(values: &mut Separated<'_, 'static, Postgres, &'static str>, new: NewUser) {
        values
            .push_bind(new.username)
            .push_bind(new.email)
            .push_bind(new.password)
            .push_bind(new.role_id);
    }

    fn push_patch(set: &mut Separated<'_, 'static, Postgres, &'static str>, patch: UserPatch) -> usize {
        let mut fields = 0;
        if let Some(username) = patch.username {
            set.push("username = ").push_bind_unseparated(username);
            fields += 1;
        }
        if let Some(email) = patch.email {
            set.push("email = ").push_bind_unseparated(email);
            fields += 1;
        }
        if let Some(password) = patch.password {
            set.push("password = ").push_bind_unseparated(password);
            fields += 1;
        }
        if let Some(is_active) = patch.is_active {
            set.push("is_active = ").push_bind_unseparated(is_active);
            fields += 1;
        }
        fields
    }

    fn push_key(builder: &mut QueryBuilder<'static, Postgres>, key: &UserKey) {
        match key {
            UserKey::Id(id) => builder.push("id = ").push_bind(*id),
            UserKey::Email(email) => builder.push("email = ").push_bind(email.clone()),
            UserKey::Username(username) => builder.push("username = ").push_bind(username.clone()),
        };
    }
}

/// Public profile of a user
///
/// Never carries the password. Includes the projects the user owns (with
/// their tasks) and the tasks the user is assigned to perform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileView {
    pub username: String,
    pub email: String,
    /// Registration date (time of day dropped)
    pub registered_at: NaiveDate,
    pub role_id: i64,
    pub is_active: bool,
    pub projects: Vec<ProjectView>,
    pub assigned_tasks: Vec<TaskView>,
}

impl ProfileView {
    pub fn new(user: &User, projects: Vec<ProjectView>, assigned_tasks: Vec<TaskView>) -> Self {
        Self {
            username: user.username.clone(),
            email: user.email.clone(),
            registered_at: user.registered_at.date_naive(),
            role_id: user.role_id,
            is_active: user.is_active,
            projects,
            assigned_tasks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_user() -> User {
        User {
            id: 1,
            username: "alice".to_string(),
            email: "a@x.com".to_string(),
            password: "$argon2id$v=19$m=1024,t=1,p=1$salt$hash".to_string(),
            registered_at: Utc.with_ymd_and_hms(2024, 11, 22, 17, 45, 3).unwrap(),
            role_id: 1,
            is_active: true,
        }
    }

    #[test]
    fn test_password_never_serialized() {
        let json = serde_json::to_value(sample_user()).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["username"], "alice");
    }

    #[test]
    fn test_profile_view_truncates_registration_date() {
        let view = ProfileView::new(&sample_user(), vec![], vec![]);
        assert_eq!(view.registered_at, NaiveDate::from_ymd_opt(2024, 11, 22).unwrap());

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["registered_at"], "2024-11-22");
        assert!(json.get("password").is_none());
    }
}
