/// In-process storage backend
///
/// [`MemoryStore`] keeps every table in memory behind a single async
/// `RwLock` and mirrors the PostgreSQL schema's behavior:
///
/// - ids are assigned from a per-table sequence starting at 1
/// - the same unique constraints are enforced and reported under the same
///   constraint names
/// - deleting a user or project cascades exactly like `ON DELETE CASCADE`
///
/// It backs the API when no `DATABASE_URL` is configured and is the store
/// used throughout the test suites.
///
/// # Example
///
/// ```
/// use terrea_shared::db::memory::MemoryStore;
/// use terrea_shared::models::role::{NewRole, RoleKey};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let repos = MemoryStore::new().repositories();
/// let role = repos.roles.insert(NewRole { name: "user".into(), permissions: vec![] }).await?;
/// assert_eq!(role.id, 1);
/// assert!(repos.roles.find_one(&RoleKey::Name("user".into())).await?.is_some());
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::repository::{Entity, Repository, StoreError};
use super::Repositories;
use crate::models::project::{self, NewProject, Project, ProjectKey, ProjectPatch};
use crate::models::role::{NewRole, Role, RoleKey, RolePatch};
use crate::models::task::{NewTask, Task, TaskKey, TaskPatch};
use crate::models::user::{self, NewUser, User, UserKey, UserPatch};

/// All in-memory tables
#[derive(Debug, Default)]
pub struct Tables {
    users: Vec<User>,
    roles: Vec<Role>,
    projects: Vec<Project>,
    tasks: Vec<Task>,
    sequences: HashMap<&'static str, i64>,
}

impl Tables {
    fn next_id(&mut self, entity: &'static str) -> i64 {
        let seq = self.sequences.entry(entity).or_insert(0);
        *seq += 1;
        *seq
    }
}

/// Shared handle to the in-memory tables
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repositories over this store
    pub fn repositories(&self) -> Repositories {
        Repositories {
            users: Arc::new(MemoryRepository::<User>::new(self.clone())),
            roles: Arc::new(MemoryRepository::<Role>::new(self.clone())),
            projects: Arc::new(MemoryRepository::<Project>::new(self.clone())),
            tasks: Arc::new(MemoryRepository::<Task>::new(self.clone())),
        }
    }
}

/// Table mapping for an entity held in [`MemoryStore`]
pub trait MemoryEntity: Entity {
    fn rows(tables: &Tables) -> &Vec<Self>;
    fn rows_mut(tables: &mut Tables) -> &mut Vec<Self>;

    /// Materializes a new row with generated fields filled in
    fn build(id: i64, new: Self::New, now: DateTime<Utc>) -> Self;

    fn matches(&self, key: &Self::Key) -> bool;

    fn apply(&mut self, patch: Self::Patch, now: DateTime<Utc>);

    /// Unique constraint violated by `self` and `other` coexisting
    fn conflicts_with(&self, _other: &Self) -> Option<&'static str> {
        None
    }

    /// Removes rows that reference the deleted ones
    fn cascade(_tables: &mut Tables, _removed: &[Self]) {}
}

/// Generic repository over [`MemoryStore`]
pub struct MemoryRepository<E> {
    store: MemoryStore,
    _entity: PhantomData<fn() -> E>,
}

impl<E> MemoryRepository<E> {
    pub fn new(store: MemoryStore) -> Self {
        Self {
            store,
            _entity: PhantomData,
        }
    }
}

fn check_unique<E: MemoryEntity>(rows: &[E], candidate: &E) -> Result<(), StoreError> {
    for row in rows.iter().filter(|row| row.id() != candidate.id()) {
        if let Some(constraint) = candidate.conflicts_with(row) {
            return Err(StoreError::Conflict {
                constraint: constraint.to_string(),
            });
        }
    }
    Ok(())
}

#[async_trait]
impl<E: MemoryEntity> Repository<E> for MemoryRepository<E> {
    async fn insert(&self, new: E::New) -> Result<E, StoreError> {
        let mut tables = self.store.tables.write().await;

        let id = tables.next_id(E::NAME);
        let record = E::build(id, new, Utc::now());
        check_unique(E::rows(&tables), &record)?;

        E::rows_mut(&mut tables).push(record.clone());
        Ok(record)
    }

    async fn find_one(&self, key: &E::Key) -> Result<Option<E>, StoreError> {
        let tables = self.store.tables.read().await;
        Ok(E::rows(&tables).iter().find(|row| row.matches(key)).cloned())
    }

    async fn find_many(&self, key: &E::Key) -> Result<Vec<E>, StoreError> {
        let tables = self.store.tables.read().await;
        Ok(E::rows(&tables)
            .iter()
            .filter(|row| row.matches(key))
            .cloned()
            .collect())
    }

    async fn update(&self, key: &E::Key, patch: E::Patch) -> Result<Option<E>, StoreError> {
        let mut tables = self.store.tables.write().await;

        let Some(index) = E::rows(&tables).iter().position(|row| row.matches(key)) else {
            return Ok(None);
        };

        let mut updated = E::rows(&tables)[index].clone();
        updated.apply(patch, Utc::now());
        check_unique(E::rows(&tables), &updated)?;

        E::rows_mut(&mut tables)[index] = updated.clone();
        Ok(Some(updated))
    }

    async fn delete(&self, key: &E::Key) -> Result<u64, StoreError> {
        let mut tables = self.store.tables.write().await;

        let (removed, kept): (Vec<E>, Vec<E>) = std::mem::take(E::rows_mut(&mut tables))
            .into_iter()
            .partition(|row| row.matches(key));
        *E::rows_mut(&mut tables) = kept;

        E::cascade(&mut tables, &removed);
        Ok(removed.len() as u64)
    }
}

impl MemoryEntity for User {
    fn rows(tables: &Tables) -> &Vec<Self> {
        &tables.users
    }

    fn rows_mut(tables: &mut Tables) -> &mut Vec<Self> {
        &mut tables.users
    }

    fn build(id: i64, new: NewUser, now: DateTime<Utc>) -> Self {
        User {
            id,
            username: new.username,
            email: new.email,
            password: new.password,
            registered_at: now,
            role_id: new.role_id,
            is_active: true,
        }
    }

    fn matches(&self, key: &UserKey) -> bool {
        match key {
            UserKey::Id(id) => self.id == *id,
            UserKey::Email(email) => &self.email == email,
            UserKey::Username(username) => &self.username == username,
        }
    }

    fn apply(&mut self, patch: UserPatch, _now: DateTime<Utc>) {
        if let Some(username) = patch.username {
            self.username = username;
        }
        if let Some(email) = patch.email {
            self.email = email;
        }
        if let Some(password) = patch.password {
            self.password = password;
        }
        if let Some(is_active) = patch.is_active {
            self.is_active = is_active;
        }
    }

    fn conflicts_with(&self, other: &Self) -> Option<&'static str> {
        if self.username == other.username {
            Some(user::USERNAME_CONSTRAINT)
        } else if self.email == other.email {
            Some(user::EMAIL_CONSTRAINT)
        } else {
            None
        }
    }

    fn cascade(tables: &mut Tables, removed: &[Self]) {
        let ids: Vec<i64> = removed.iter().map(|u| u.id).collect();

        let (gone, kept): (Vec<Project>, Vec<Project>) = std::mem::take(&mut tables.projects)
            .into_iter()
            .partition(|p| ids.contains(&p.owner_id));
        tables.projects = kept;
        Project::cascade(tables, &gone);

        tables
            .tasks
            .retain(|t| !ids.contains(&t.customer_id) && !ids.contains(&t.performer_id));
    }
}

impl MemoryEntity for Role {
    fn rows(tables: &Tables) -> &Vec<Self> {
        &tables.roles
    }

    fn rows_mut(tables: &mut Tables) -> &mut Vec<Self> {
        &mut tables.roles
    }

    fn build(id: i64, new: NewRole, _now: DateTime<Utc>) -> Self {
        Role {
            id,
            name: new.name,
            permissions: new.permissions,
        }
    }

    fn matches(&self, key: &RoleKey) -> bool {
        match key {
            RoleKey::Id(id) => self.id == *id,
            RoleKey::Name(name) => &self.name == name,
        }
    }

    fn apply(&mut self, patch: RolePatch, _now: DateTime<Utc>) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(permissions) = patch.permissions {
            self.permissions = permissions;
        }
    }

    fn conflicts_with(&self, other: &Self) -> Option<&'static str> {
        (self.name == other.name).then_some("roles_name_key")
    }
}

impl MemoryEntity for Project {
    fn rows(tables: &Tables) -> &Vec<Self> {
        &tables.projects
    }

    fn rows_mut(tables: &mut Tables) -> &mut Vec<Self> {
        &mut tables.projects
    }

    fn build(id: i64, new: NewProject, now: DateTime<Utc>) -> Self {
        Project {
            id,
            name: new.name,
            created_at: now,
            owner_id: new.owner_id,
        }
    }

    fn matches(&self, key: &ProjectKey) -> bool {
        match key {
            ProjectKey::Id(id) => self.id == *id,
            ProjectKey::Name(name) => &self.name == name,
            ProjectKey::Owner(owner_id) => self.owner_id == *owner_id,
        }
    }

    fn apply(&mut self, patch: ProjectPatch, _now: DateTime<Utc>) {
        if let Some(name) = patch.name {
            self.name = name;
        }
    }

    fn conflicts_with(&self, other: &Self) -> Option<&'static str> {
        (self.owner_id == other.owner_id && self.name == other.name)
            .then_some(project::OWNER_NAME_CONSTRAINT)
    }

    fn cascade(tables: &mut Tables, removed: &[Self]) {
        let ids: Vec<i64> = removed.iter().map(|p| p.id).collect();
        tables.tasks.retain(|t| !ids.contains(&t.project_id));
    }
}

impl MemoryEntity for Task {
    fn rows(tables: &Tables) -> &Vec<Self> {
        &tables.tasks
    }

    fn rows_mut(tables: &mut Tables) -> &mut Vec<Self> {
        &mut tables.tasks
    }

    fn build(id: i64, new: NewTask, now: DateTime<Utc>) -> Self {
        Task {
            id,
            name: new.name,
            created_at: now,
            updated_at: now,
            deadline: new.deadline,
            project_id: new.project_id,
            customer_id: new.customer_id,
            performer_id: new.performer_id,
        }
    }

    fn matches(&self, key: &TaskKey) -> bool {
        match key {
            TaskKey::Id(id) => self.id == *id,
            TaskKey::Project(id) => self.project_id == *id,
            TaskKey::Customer(id) => self.customer_id == *id,
            TaskKey::Performer(id) => self.performer_id == *id,
        }
    }

    fn apply(&mut self, patch: TaskPatch, now: DateTime<Utc>) {
        let mut touched = false;
        if let Some(name) = patch.name {
            self.name = name;
            touched = true;
        }
        if let Some(deadline) = patch.deadline {
            self.deadline = deadline;
            touched = true;
        }
        if let Some(performer_id) = patch.performer_id {
            self.performer_id = performer_id;
            touched = true;
        }
        if touched {
            self.updated_at = now;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seed_user(repos: &Repositories, username: &str) -> User {
        repos
            .users
            .insert(NewUser {
                username: username.to_string(),
                email: format!("{}@x.com", username),
                password: "hash".to_string(),
                role_id: 1,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_insert_assigns_sequential_ids() {
        let repos = MemoryStore::new().repositories();

        let alice = seed_user(&repos, "alice").await;
        let bob = seed_user(&repos, "bob").await;

        assert_eq!(alice.id, 1);
        assert_eq!(bob.id, 2);
        assert!(alice.is_active);
    }

    #[tokio::test]
    async fn test_unique_username_and_email() {
        let repos = MemoryStore::new().repositories();
        seed_user(&repos, "alice").await;

        let same_username = repos
            .users
            .insert(NewUser {
                username: "alice".to_string(),
                email: "other@x.com".to_string(),
                password: "hash".to_string(),
                role_id: 1,
            })
            .await;
        assert!(same_username.unwrap_err().is_conflict_on(user::USERNAME_CONSTRAINT));

        let same_email = repos
            .users
            .insert(NewUser {
                username: "alice2".to_string(),
                email: "alice@x.com".to_string(),
                password: "hash".to_string(),
                role_id: 1,
            })
            .await;
        assert!(same_email.unwrap_err().is_conflict_on(user::EMAIL_CONSTRAINT));
    }

    #[tokio::test]
    async fn test_update_checks_uniqueness_against_other_rows() {
        let repos = MemoryStore::new().repositories();
        let alice = seed_user(&repos, "alice").await;
        seed_user(&repos, "bob").await;

        // Re-setting your own username is not a conflict.
        let same = repos
            .users
            .update(
                &UserKey::Id(alice.id),
                UserPatch {
                    username: Some("alice".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(same.is_some());

        let taken = repos
            .users
            .update(
                &UserKey::Id(alice.id),
                UserPatch {
                    username: Some("bob".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(taken.unwrap_err().is_conflict_on(user::USERNAME_CONSTRAINT));
    }

    #[tokio::test]
    async fn test_update_missing_row_returns_none() {
        let repos = MemoryStore::new().repositories();
        let result = repos
            .users
            .update(&UserKey::Id(42), UserPatch::default())
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_deleting_user_cascades() {
        let repos = MemoryStore::new().repositories();
        let alice = seed_user(&repos, "alice").await;
        let bob = seed_user(&repos, "bob").await;

        let alices = repos
            .projects
            .insert(NewProject { name: "p1".to_string(), owner_id: alice.id })
            .await
            .unwrap();
        let bobs = repos
            .projects
            .insert(NewProject { name: "p2".to_string(), owner_id: bob.id })
            .await
            .unwrap();

        // Task in bob's project performed by alice, and one only involving bob.
        repos
            .tasks
            .insert(NewTask {
                name: "review".to_string(),
                deadline: None,
                project_id: bobs.id,
                customer_id: bob.id,
                performer_id: alice.id,
            })
            .await
            .unwrap();
        repos
            .tasks
            .insert(NewTask {
                name: "deploy".to_string(),
                deadline: None,
                project_id: bobs.id,
                customer_id: bob.id,
                performer_id: bob.id,
            })
            .await
            .unwrap();

        assert_eq!(repos.users.delete(&UserKey::Id(alice.id)).await.unwrap(), 1);

        assert!(repos.projects.find_one(&ProjectKey::Id(alices.id)).await.unwrap().is_none());
        let remaining = repos.tasks.find_many(&TaskKey::Project(bobs.id)).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].name, "deploy");
    }

    #[tokio::test]
    async fn test_deleting_project_cascades_to_tasks() {
        let repos = MemoryStore::new().repositories();
        let alice = seed_user(&repos, "alice").await;
        let project = repos
            .projects
            .insert(NewProject { name: "p1".to_string(), owner_id: alice.id })
            .await
            .unwrap();
        repos
            .tasks
            .insert(NewTask {
                name: "write".to_string(),
                deadline: None,
                project_id: project.id,
                customer_id: alice.id,
                performer_id: alice.id,
            })
            .await
            .unwrap();

        repos.projects.delete(&ProjectKey::Id(project.id)).await.unwrap();

        assert!(repos.tasks.find_many(&TaskKey::Performer(alice.id)).await.unwrap().is_empty());
        assert!(repos.users.find_one(&UserKey::Id(alice.id)).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_task_update_refreshes_updated_at() {
        let repos = MemoryStore::new().repositories();
        let alice = seed_user(&repos, "alice").await;
        let project = repos
            .projects
            .insert(NewProject { name: "p1".to_string(), owner_id: alice.id })
            .await
            .unwrap();
        let task = repos
            .tasks
            .insert(NewTask {
                name: "write".to_string(),
                deadline: None,
                project_id: project.id,
                customer_id: alice.id,
                performer_id: alice.id,
            })
            .await
            .unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        let updated = repos
            .tasks
            .update(
                &TaskKey::Id(task.id),
                TaskPatch {
                    name: Some("rewrite".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.created_at, task.created_at);
        assert!(updated.updated_at > task.updated_at);
    }

    #[tokio::test]
    async fn test_project_name_unique_per_owner_only() {
        let repos = MemoryStore::new().repositories();
        let alice = seed_user(&repos, "alice").await;
        let bob = seed_user(&repos, "bob").await;

        repos
            .projects
            .insert(NewProject { name: "p1".to_string(), owner_id: alice.id })
            .await
            .unwrap();
        assert!(repos
            .projects
            .insert(NewProject { name: "p1".to_string(), owner_id: bob.id })
            .await
            .is_ok());

        let duplicate = repos
            .projects
            .insert(NewProject { name: "p1".to_string(), owner_id: alice.id })
            .await;
        assert!(duplicate.unwrap_err().is_conflict_on(project::OWNER_NAME_CONSTRAINT));
    }
}
