/// Use-case services
///
/// - [`profile::ProfileService`]: register, login, logout, update, delete, view profiles
/// - [`projects::ProjectService`]: create/view/delete projects, create tasks
///
/// Services receive every collaborator (repositories, hasher, token
/// manager, cache, notifier) through their constructors and return
/// `Result<T, ServiceError>`.

pub mod profile;
pub mod projects;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use crate::db::repository::StoreError;
use crate::db::Repositories;
use crate::models::project::{Project, ProjectKey, ProjectView};
use crate::models::task::{TaskKey, TaskView};
use crate::models::user::{ProfileView, User, UserKey};
use crate::redis::cache::{CacheKey, ViewCache};

pub use profile::{Credentials, ProfileService, ProfileUpdate, Registration, Session};
pub use projects::{NewTaskRequest, ProjectService};

/// Builds a project view with its tasks
pub(crate) async fn build_project_view(
    repos: &Repositories,
    project: &Project,
) -> Result<ProjectView, StoreError> {
    let tasks = repos.tasks.find_many(&TaskKey::Project(project.id)).await?;
    Ok(ProjectView::new(
        project,
        tasks.into_iter().map(TaskView::from).collect(),
    ))
}

/// Builds a user's profile view: owned projects and assigned tasks
pub(crate) async fn build_profile_view(
    repos: &Repositories,
    user: &User,
) -> Result<ProfileView, StoreError> {
    let mut projects = Vec::new();
    for project in repos.projects.find_many(&ProjectKey::Owner(user.id)).await? {
        projects.push(build_project_view(repos, &project).await?);
    }

    let assigned = repos.tasks.find_many(&TaskKey::Performer(user.id)).await?;

    Ok(ProfileView::new(
        user,
        projects,
        assigned.into_iter().map(TaskView::from).collect(),
    ))
}

/// Cache keys of views that show a project or its tasks: the project
/// itself, its owner's profile and every performer's profile
pub(crate) async fn project_cache_keys(repos: &Repositories, project: &Project) -> Vec<CacheKey> {
    let mut keys = vec![CacheKey::Project(project.name.clone())];

    let mut user_ids = vec![project.owner_id];
    match repos.tasks.find_many(&TaskKey::Project(project.id)).await {
        Ok(tasks) => user_ids.extend(tasks.iter().map(|t| t.performer_id)),
        Err(e) => tracing::warn!(project_id = project.id, error = %e, "Could not list tasks for cache invalidation"),
    }
    user_ids.sort_unstable();
    user_ids.dedup();

    for user_id in user_ids {
        match repos.users.find_one(&UserKey::Id(user_id)).await {
            Ok(Some(user)) => keys.push(CacheKey::Profile(user.username)),
            Ok(None) => {}
            Err(e) => tracing::warn!(user_id, error = %e, "Could not load user for cache invalidation"),
        }
    }
    keys
}

pub(crate) async fn invalidate_all(cache: &Arc<dyn ViewCache>, keys: &[CacheKey]) {
    for key in keys {
        cache.invalidate(key).await;
    }
}

/// Drops cached views of a project after it or its tasks changed
pub(crate) async fn invalidate_project(
    repos: &Repositories,
    cache: &Arc<dyn ViewCache>,
    project: &Project,
) {
    let keys = project_cache_keys(repos, project).await;
    invalidate_all(cache, &keys).await;
}
