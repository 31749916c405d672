/// Administrator endpoints
///
/// Mounted behind both the auth gate and `require_admin`; a standard user
/// gets `403 forbidden` before any handler here runs.
///
/// # Endpoints
///
/// - `GET /api/v1/users` - Every account (no password hashes)
/// - `GET /api/v1/admin/todos` - Every task, newest first

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use taskward_shared::{
    auth::{authorization::list_scope, middleware::AuthContext},
    models::user::User,
};

use super::tasks::TaskListResponse;
use crate::{app::AppState, error::ApiResult};

#[derive(Debug, Serialize, Deserialize)]
pub struct UserListResponse {
    pub users: Vec<User>,
}

pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<UserListResponse>> {
    let users = state.credentials.list_all().await?;

    Ok(Json(UserListResponse { users }))
}

pub async fn list_all_tasks(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<Json<TaskListResponse>> {
    let todos = state.tasks.list(list_scope(&auth.principal(), true)).await?;

    Ok(Json(TaskListResponse { todos }))
}
