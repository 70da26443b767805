/// Project and task use-cases
///
/// Projects are visible only to their owner. Lookups by name search all
/// projects and return the lowest id, so a name owned by someone else
/// yields `AccessDenied` rather than `NotFound`.

use std::sync::Arc;

use chrono::NaiveDate;

use super::{build_project_view, invalidate_all, invalidate_project, project_cache_keys};
use crate::auth::authorization::authorize_or_fail;
use crate::db::Repositories;
use crate::error::ServiceError;
use crate::models::project::{self, NewProject, Project, ProjectKey, ProjectView};
use crate::models::task::{NewTask, Task};
use crate::models::user::{User, UserKey};
use crate::redis::cache::{CacheKey, CachedView, ViewCache};
use crate::services::profile::USER_NOT_FOUND;
use crate::validation;

pub const PROJECT_NOT_FOUND: &str = "Project doesn't exist";
pub const PROJECT_NAME_TAKEN: &str = "Project name is already taken";

/// Input for creating a task
#[derive(Debug, Clone)]
pub struct NewTaskRequest {
    pub name: String,
    pub deadline: Option<NaiveDate>,
    /// Username of the user who will perform the task
    pub performer: String,
}

/// Project and task use-cases
#[derive(Clone)]
pub struct ProjectService {
    repos: Repositories,
    cache: Arc<dyn ViewCache>,
}

impl ProjectService {
    pub fn new(repos: Repositories, cache: Arc<dyn ViewCache>) -> Self {
        Self { repos, cache }
    }

    /// Creates a project owned by `user`
    pub async fn create_project(&self, user: &User, name: &str) -> Result<Project, ServiceError> {
        validation::check_display_names(&[("name", name)])?;

        let owned = self.repos.projects.find_many(&ProjectKey::Owner(user.id)).await?;
        if owned.iter().any(|p| p.name == name) {
            tracing::warn!(user_id = user.id, project = name, "{}", PROJECT_NAME_TAKEN);
            return Err(ServiceError::conflict(PROJECT_NAME_TAKEN));
        }

        let project = self
            .repos
            .projects
            .insert(NewProject {
                name: name.to_string(),
                owner_id: user.id,
            })
            .await
            .map_err(|e| {
                if e.is_conflict_on(project::OWNER_NAME_CONSTRAINT) {
                    ServiceError::conflict(PROJECT_NAME_TAKEN)
                } else {
                    e.into()
                }
            })?;

        invalidate_project(&self.repos, &self.cache, &project).await;

        tracing::info!(user_id = user.id, project_id = project.id, project = %project.name, "Project created");
        Ok(project)
    }

    /// The project called `name`, with its tasks
    pub async fn get_project(&self, user: &User, name: &str) -> Result<ProjectView, ServiceError> {
        validation::check_path_segment("project_name", name)?;

        let key = CacheKey::Project(name.to_string());
        if let Some(CachedView::Project(view)) = self.cache.get(&key).await {
            authorize_or_fail(view.owner_id, user.id)?;
            return Ok(view);
        }

        let project = self.find_by_name(name).await?;
        let view = build_project_view(&self.repos, &project).await?;
        self.cache.put(&key, &CachedView::Project(view.clone())).await;

        authorize_or_fail(project.owner_id, user.id)?;
        Ok(view)
    }

    /// Deletes the project called `name` and its tasks
    pub async fn delete_project(&self, user: &User, name: &str) -> Result<(), ServiceError> {
        validation::check_path_segment("project_name", name)?;

        let project = self.find_by_name(name).await?;
        authorize_or_fail(project.owner_id, user.id)?;

        let stale = project_cache_keys(&self.repos, &project).await;
        self.repos.projects.delete(&ProjectKey::Id(project.id)).await?;
        invalidate_all(&self.cache, &stale).await;

        tracing::info!(user_id = user.id, project_id = project.id, "Project deleted");
        Ok(())
    }

    /// Adds a task to the project called `project_name`
    ///
    /// The acting user becomes the customer; the performer is looked up by
    /// username.
    pub async fn create_task(
        &self,
        user: &User,
        project_name: &str,
        input: NewTaskRequest,
    ) -> Result<Task, ServiceError> {
        validation::check_path_segment("project_name", project_name)?;
        validation::check_display_names(&[("name", input.name.as_str())])?;

        let project = self.find_by_name(project_name).await?;
        authorize_or_fail(project.owner_id, user.id)?;

        let performer = self
            .repos
            .users
            .find_one(&UserKey::Username(input.performer.clone()))
            .await?
            .ok_or_else(|| {
                tracing::warn!(performer = %input.performer, "Task performer not found");
                ServiceError::not_found(USER_NOT_FOUND)
            })?;

        let task = self
            .repos
            .tasks
            .insert(NewTask {
                name: input.name,
                deadline: input.deadline,
                project_id: project.id,
                customer_id: user.id,
                performer_id: performer.id,
            })
            .await?;

        invalidate_project(&self.repos, &self.cache, &project).await;

        tracing::info!(
            project_id = project.id,
            task_id = task.id,
            customer_id = user.id,
            performer_id = performer.id,
            "Task created"
        );
        Ok(task)
    }

    async fn find_by_name(&self, name: &str) -> Result<Project, ServiceError> {
        self.repos
            .projects
            .find_one(&ProjectKey::Name(name.to_string()))
            .await?
            .ok_or_else(|| {
                tracing::warn!(project = name, "{}", PROJECT_NOT_FOUND);
                ServiceError::not_found(PROJECT_NOT_FOUND)
            })
    }
}
