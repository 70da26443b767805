/// Project and task endpoints
///
/// Every endpoint requires a session. Projects are addressed by name;
/// reading, deleting or adding tasks to another user's project answers
/// `403 Forbidden`, a name no project carries answers `404 Not Found`.
///
/// # Endpoints
///
/// - `POST /projects/create_project` - Create a project
/// - `GET /projects/{project_name}` - Project with its tasks
/// - `DELETE /projects/{project_name}/delete` - Delete project and tasks
/// - `POST /projects/{project_name}/task/create` - Add a task

use crate::{
    app::AppState,
    error::ApiResult,
    extract::ApiJson,
    middleware::auth::CurrentUser,
    routes::MessageResponse,
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use terrea_shared::{models::project::ProjectView, services::NewTaskRequest};
use validator::Validate;

/// Create project request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    #[validate(length(min = 3, max = 50, message = "Project name must be 3-50 characters"))]
    pub name: String,
}

/// Create task request
///
/// ```json
/// {
///   "name": "Write docs",
///   "deadline": "2025-01-31",
///   "performer": "bob"
/// }
/// ```
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(min = 3, max = 100, message = "Task name must be 3-100 characters"))]
    pub name: String,

    #[serde(default)]
    pub deadline: Option<NaiveDate>,

    /// Username of the user who will perform the task
    #[validate(length(min = 1, message = "Performer is required"))]
    pub performer: String,
}

/// Create a project owned by the acting user
///
/// # Errors
///
/// - `400 Bad Request`: Name too short, too long or with forbidden characters
/// - `409 Conflict`: The user already owns a project with this name
pub async fn create_project(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ApiJson(req): ApiJson<CreateProjectRequest>,
) -> ApiResult<Json<MessageResponse>> {
    req.validate()?;

    state.projects.create_project(&user, &req.name).await?;

    Ok(Json(MessageResponse::ok("Project has been created")))
}

pub async fn get_project(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(project_name): Path<String>,
) -> ApiResult<Json<ProjectView>> {
    Ok(Json(state.projects.get_project(&user, &project_name).await?))
}

pub async fn delete_project(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(project_name): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    state.projects.delete_project(&user, &project_name).await?;

    Ok(Json(MessageResponse::ok("Project has been deleted")))
}

/// Add a task to one of the acting user's projects
///
/// The acting user becomes the task's customer.
pub async fn create_task(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(project_name): Path<String>,
    ApiJson(req): ApiJson<CreateTaskRequest>,
) -> ApiResult<Json<MessageResponse>> {
    req.validate()?;

    state
        .projects
        .create_task(
            &user,
            &project_name,
            NewTaskRequest {
                name: req.name,
                deadline: req.deadline,
                performer: req.performer,
            },
        )
        .await?;

    Ok(Json(MessageResponse::ok("Task has been created")))
}
