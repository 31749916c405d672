/// Task endpoints
///
/// Every route here sits behind the auth gate. Per-task actions fetch the
/// ownership fact from the task store and run it through
/// [`check_access`]; a standard user asking for someone else's task gets the
/// same 404 as for a task that does not exist.
///
/// # Endpoints
///
/// - `POST /api/v1/todos` - Create a task owned by the caller
/// - `GET /api/v1/todos` - The caller's tasks (`?all=true` for admins)
/// - `GET /api/v1/todos/:id` - One task
/// - `PUT /api/v1/todos/:id` - Partial update
/// - `DELETE /api/v1/todos/:id` - Delete
/// - `PATCH /api/v1/todos/:id/status` - Change status only

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use taskward_shared::{
    auth::{
        authorization::{check_access, list_scope, Action, AuthzError},
        middleware::AuthContext,
    },
    models::{
        task::{CreateTask, Task, TaskStatus, UpdateTask},
        user::Principal,
    },
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};

/// Create request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    #[serde(default)]
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: String,
}

/// Update request; absent fields are left unchanged
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,

    pub status: Option<TaskStatus>,
}

impl From<UpdateTaskRequest> for UpdateTask {
    fn from(req: UpdateTaskRequest) -> Self {
        Self {
            title: req.title,
            description: req.description,
            status: req.status,
        }
    }
}

/// Status change request
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: TaskStatus,
}

/// Listing query
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Ask for every user's tasks; ignored for non-admins
    #[serde(default)]
    pub all: bool,
}

/// Single task, with a message on mutations
#[derive(Debug, Serialize, Deserialize)]
pub struct TaskResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    pub todo: Task,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TaskListResponse {
    pub todos: Vec<Task>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

fn parse_task_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest("Invalid todo ID".to_string()))
}

/// Looks up the owner of `id` and applies the ownership policy
async fn authorize_task(
    state: &AppState,
    principal: &Principal,
    id: Uuid,
    action: Action,
) -> ApiResult<()> {
    let owner = state.tasks.find_owner_of(id).await?;
    check_access(principal, owner, action)?;
    Ok(())
}

/// Create a task owned by the caller
///
/// # Response (201)
///
/// ```json
/// { "message": "Todo created successfully", "todo": { ... } }
/// ```
pub async fn create_task(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskResponse>)> {
    req.validate()?;

    let task = state
        .tasks
        .create(CreateTask {
            user_id: auth.user_id,
            title: req.title,
            description: req.description,
        })
        .await?;

    tracing::info!(task_id = %task.id, user_id = %auth.user_id, "Task created");

    Ok((
        StatusCode::CREATED,
        Json(TaskResponse {
            message: Some("Todo created successfully".to_string()),
            todo: task,
        }),
    ))
}

/// List tasks visible to the caller, newest first
pub async fn list_tasks(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<TaskListResponse>> {
    let scope = list_scope(&auth.principal(), query.all);
    let todos = state.tasks.list(scope).await?;

    Ok(Json(TaskListResponse { todos }))
}

pub async fn get_task(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> ApiResult<Json<TaskResponse>> {
    let id = parse_task_id(&id)?;
    let principal = auth.principal();

    let task = state.tasks.find_by_id(id).await?;
    check_access(&principal, task.as_ref().map(|t| t.user_id), Action::Read)?;
    let task = task.ok_or_else(|| AuthzError::missing_for(&principal))?;

    Ok(Json(TaskResponse {
        message: None,
        todo: task,
    }))
}

pub async fn update_task(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<TaskResponse>> {
    let id = parse_task_id(&id)?;
    let principal = auth.principal();

    authorize_task(&state, &principal, id, Action::Update).await?;
    req.validate()?;

    // Deleted between the check and the write
    let task = state
        .tasks
        .update(id, UpdateTask::from(req))
        .await?
        .ok_or_else(|| AuthzError::missing_for(&principal))?;

    tracing::info!(task_id = %id, user_id = %auth.user_id, "Task updated");

    Ok(Json(TaskResponse {
        message: Some("Todo updated successfully".to_string()),
        todo: task,
    }))
}

pub async fn delete_task(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let id = parse_task_id(&id)?;
    let principal = auth.principal();

    authorize_task(&state, &principal, id, Action::Delete).await?;

    if !state.tasks.delete(id).await? {
        return Err(AuthzError::missing_for(&principal).into());
    }

    tracing::info!(task_id = %id, user_id = %auth.user_id, "Task deleted");

    Ok(Json(MessageResponse {
        message: "Todo deleted successfully".to_string(),
    }))
}

pub async fn update_status(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> ApiResult<Json<TaskResponse>> {
    let id = parse_task_id(&id)?;
    let principal = auth.principal();

    authorize_task(&state, &principal, id, Action::ChangeStatus).await?;

    let task = state
        .tasks
        .update(id, UpdateTask::status(req.status))
        .await?
        .ok_or_else(|| AuthzError::missing_for(&principal))?;

    tracing::info!(
        task_id = %id,
        user_id = %auth.user_id,
        status = task.status.as_str(),
        "Task status changed"
    );

    Ok(Json(TaskResponse {
        message: Some("Todo status updated successfully".to_string()),
        todo: task,
    }))
}
