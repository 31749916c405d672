/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /api/v1/register` - Create a standard account
/// - `POST /api/v1/login` - Exchange credentials for a session token
/// - `GET /api/v1/profile` - The authenticated caller (gate)

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use taskward_shared::{auth::middleware::AuthContext, models::user::Principal};
use validator::Validate;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Case-sensitive login name
    #[validate(length(min = 1, max = 64, message = "Username must be 1-64 characters"))]
    pub username: String,

    #[validate(length(min = 1, max = 128, message = "Password must be 1-128 characters"))]
    pub password: String,
}

/// Register response
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub message: String,

    pub status: String,

    pub data: Principal,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub message: String,

    /// HS256 session token, valid for 24 hours
    pub token: String,

    pub user: Principal,
}

/// Profile response
#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub user: Principal,
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /api/v1/register
/// Content-Type: application/json
///
/// { "username": "alice", "password": "correct horse" }
/// ```
///
/// # Response (201)
///
/// ```json
/// {
///   "message": "User registered successfully",
///   "status": "success",
///   "data": { "id": "uuid", "username": "alice", "role": "standard" }
/// }
/// ```
///
/// # Errors
///
/// - `409 duplicate_login`: Username already exists
/// - `422 validation_error`: Empty or oversized fields
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    req.validate()?;

    let principal = state.auth.register(&req.username, &req.password).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully".to_string(),
            status: "success".to_string(),
            data: principal,
        }),
    ))
}

/// Login endpoint
///
/// # Endpoint
///
/// ```text
/// POST /api/v1/login
/// Content-Type: application/json
///
/// { "username": "alice", "password": "correct horse" }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "message": "Login successful",
///   "token": "eyJ...",
///   "user": { "id": "uuid", "username": "alice", "role": "standard" }
/// }
/// ```
///
/// # Errors
///
/// - `401 invalid_credentials`: Unknown username or wrong password (same
///   response for both)
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    req.validate()?;

    let (token, user) = state.auth.login(&req.username, &req.password).await?;

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        token,
        user,
    }))
}

/// Current user
///
/// Re-reads the account so a deleted user gets a 404 rather than the stale
/// token contents.
pub async fn profile(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<Json<ProfileResponse>> {
    let user = state
        .credentials
        .find_by_id(auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(ProfileResponse {
        user: Principal::from(user),
    }))
}
