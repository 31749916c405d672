/// Error handling for the API server
///
/// One error type for every handler. Each domain error from the shared crate
/// converts into an [`ApiError`], which renders as a status code plus a JSON
/// [`ErrorResponse`]:
///
/// ```json
/// { "error": "invalid_credentials", "message": "Invalid username or password" }
/// ```
///
/// Internal failures are logged and reported to the client without detail.
/// Gate rejections (`missing_credential`, `forbidden`, ...) are rendered by
/// [`AuthError`](taskward_shared::auth::middleware::AuthError) itself in the
/// same shape.
///
/// # Example
///
/// ```
/// use taskward_api::error::{ApiError, ApiResult};
/// use axum::Json;
/// use serde_json::{json, Value};
///
/// async fn handler(id: Option<u32>) -> ApiResult<Json<Value>> {
///     let id = id.ok_or_else(|| ApiError::NotFound("Todo not found".to_string()))?;
///     Ok(Json(json!({ "id": id })))
/// }
/// ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use taskward_shared::{
    auth::{authorization::AuthzError, service::AuthServiceError},
    store::StoreError,
};
use validator::ValidationErrors;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// 400
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// 401 with a specific code (`invalid_credentials`, `invalid_token`)
    #[error("Unauthorized: {message}")]
    Unauthorized { code: &'static str, message: String },

    /// 404
    #[error("Not found: {0}")]
    NotFound(String),

    /// 409 with a specific code (`duplicate_login`)
    #[error("Conflict: {message}")]
    Conflict { code: &'static str, message: String },

    /// 422
    #[error("Validation failed: {} errors", .0.len())]
    ValidationError(Vec<ValidationErrorDetail>),

    /// 500; the detail is logged, never returned
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Validation error detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    pub field: String,
    pub message: String,
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine-readable code, e.g. "not_found"
    pub error: String,

    /// Human-readable message
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Unauthorized { code, .. } => *code,
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict { code, .. } => *code,
            ApiError::ValidationError(_) => "validation_error",
            ApiError::InternalError(_) => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let (message, details) = match self {
            ApiError::BadRequest(msg) | ApiError::NotFound(msg) => (msg, None),
            ApiError::Unauthorized { message, .. } | ApiError::Conflict { message, .. } => {
                (message, None)
            }
            ApiError::ValidationError(errors) => {
                ("Request validation failed".to_string(), Some(errors))
            }
            ApiError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                ("An internal error occurred".to_string(), None)
            }
        };

        let body = Json(ErrorResponse {
            error: code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

impl From<AuthServiceError> for ApiError {
    fn from(err: AuthServiceError) -> Self {
        match err {
            AuthServiceError::DuplicateLogin => ApiError::Conflict {
                code: "duplicate_login",
                message: err.to_string(),
            },
            AuthServiceError::InvalidCredentials => ApiError::Unauthorized {
                code: "invalid_credentials",
                message: err.to_string(),
            },
            AuthServiceError::InvalidToken => ApiError::Unauthorized {
                code: "invalid_token",
                message: err.to_string(),
            },
            AuthServiceError::HashingFailure(_)
            | AuthServiceError::TokenIssuance(_)
            | AuthServiceError::StorageFailure(_) => ApiError::InternalError(err.to_string()),
        }
    }
}

impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        ApiError::NotFound(err.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateLogin => ApiError::Conflict {
                code: "duplicate_login",
                message: err.to_string(),
            },
            StoreError::Backend(_) => ApiError::InternalError(err.to_string()),
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut details: Vec<ValidationErrorDetail> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| ValidationErrorDetail {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string()),
                })
            })
            .collect();

        // field_errors() is a HashMap; keep output stable
        details.sort_by(|a, b| a.field.cmp(&b.field));

        ApiError::ValidationError(details)
    }
}
