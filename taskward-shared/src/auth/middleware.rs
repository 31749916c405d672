/// Request authentication gate for Axum
///
/// [`jwt_auth_middleware`] turns an `Authorization: Bearer <token>` header
/// into an [`AuthContext`] stored in the request extensions. Handlers take
/// the context as a typed extractor. [`require_admin`] is layered inside the
/// gate on admin-only routes.
///
/// # Gate Steps
///
/// Each step either passes or ends the request:
///
/// 1. No `Authorization` header: `missing_credential`
/// 2. Header not visible ASCII, or scheme is not `Bearer `:
///    `malformed_credential`
/// 3. Empty token after the scheme: `missing_credential`
/// 4. Token fails verification: `invalid_token`
/// 5. Context bound, request continues
///
/// Rejections are JSON: `{"error": "<code>", "message": "<text>"}`.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use axum::{middleware, routing::get, Router};
/// use taskward_shared::auth::middleware::{jwt_auth_middleware, AuthContext};
/// use taskward_shared::auth::service::AuthService;
///
/// async fn whoami(auth: AuthContext) -> String {
///     format!("Hello, {}!", auth.username)
/// }
///
/// fn router(service: Arc<AuthService>) -> Router {
///     Router::new()
///         .route("/whoami", get(whoami))
///         .route_layer(middleware::from_fn_with_state(service, jwt_auth_middleware))
/// }
/// ```

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::jwt::Claims;
use super::service::AuthService;
use crate::models::user::{Principal, Role};

/// Authenticated caller, bound by the gate
///
/// Reflects the token at issuance; role changes take effect at next login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: Uuid,

    pub username: String,

    pub role: Role,
}

impl AuthContext {
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            user_id: claims.user_id,
            username: claims.username.clone(),
            role: claims.role,
        }
    }

    /// Identity for policy checks
    pub fn principal(&self) -> Principal {
        Principal {
            id: self.user_id,
            username: self.username.clone(),
            role: self.role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<AuthContext>().cloned().ok_or_else(|| {
            tracing::error!("AuthContext requested on a route without the auth gate");
            AuthError::Unauthenticated
        })
    }
}

/// Error type for the authentication gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Authorization header is missing")]
    MissingCredential,

    #[error("Authorization header must use the Bearer scheme")]
    MalformedCredential,

    #[error("Invalid or expired token")]
    InvalidToken,

    /// No context bound; the route is missing the gate
    #[error("Authentication required")]
    Unauthenticated,

    #[error("Insufficient permissions")]
    Forbidden,
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    /// Machine-readable code for the response body
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingCredential => "missing_credential",
            AuthError::MalformedCredential => "malformed_credential",
            AuthError::InvalidToken => "invalid_token",
            AuthError::Unauthenticated => "unauthenticated",
            AuthError::Forbidden => "forbidden",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.code(),
            "message": self.to_string(),
        }));

        (self.status(), body).into_response()
    }
}

/// Extracts the bearer token from request headers (steps 1-3)
pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingCredential)?
        .to_str()
        .map_err(|_| AuthError::MalformedCredential)?;

    let token = value
        .strip_prefix("Bearer ")
        .ok_or(AuthError::MalformedCredential)?
        .trim();

    if token.is_empty() {
        return Err(AuthError::MissingCredential);
    }

    Ok(token)
}

/// Runs the full gate over a set of headers
pub fn authenticate(headers: &HeaderMap, service: &AuthService) -> Result<AuthContext, AuthError> {
    let token = extract_bearer(headers)?;

    let claims = service
        .verify_token(token)
        .map_err(|_| AuthError::InvalidToken)?;

    Ok(AuthContext::from_claims(&claims))
}

/// JWT authentication middleware
///
/// Use with `middleware::from_fn_with_state(Arc<AuthService>, jwt_auth_middleware)`.
pub async fn jwt_auth_middleware(
    State(service): State<Arc<AuthService>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let context = authenticate(req.headers(), &service).map_err(|e| {
        tracing::debug!(
            code = e.code(),
            path = %req.uri().path(),
            "Request rejected by auth gate"
        );
        e
    })?;

    req.extensions_mut().insert(context);

    Ok(next.run(req).await)
}

/// Admin-only gate
///
/// Must run after [`jwt_auth_middleware`]. A request without a bound context
/// is a wiring fault and is rejected as `Unauthenticated`.
pub async fn require_admin(req: Request, next: Next) -> Result<Response, AuthError> {
    let context = req.extensions().get::<AuthContext>().ok_or_else(|| {
        tracing::error!(path = %req.uri().path(), "require_admin reached without auth gate");
        AuthError::Unauthenticated
    })?;

    if !context.is_admin() {
        tracing::debug!(
            user_id = %context.user_id,
            role = context.role.as_str(),
            "Admin route denied"
        );
        return Err(AuthError::Forbidden);
    }

    Ok(next.run(req).await)
}
