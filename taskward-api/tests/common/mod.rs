//! Common test utilities for integration tests
//!
//! Builds the full router over in-memory stores, so these tests need no
//! database. Helpers cover account setup and JSON request/response plumbing.

// Each test binary uses a different subset of the helpers
#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use taskward_api::app::{build_router, AppState};
use taskward_api::config::Config;
use taskward_shared::models::user::Principal;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "integration-test-secret-at-least-32-bytes";

/// Test context: one application instance with its own stores
pub struct TestContext {
    pub state: AppState,
    pub app: Router,
}

/// A logged-in account
pub struct Account {
    pub principal: Principal,
    pub token: String,
}

impl Account {
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

impl TestContext {
    pub fn new() -> Self {
        let state = AppState::in_memory(Config::in_memory(TEST_SECRET)).unwrap();
        let app = build_router(state.clone());

        Self { state, app }
    }

    /// Sends a request and returns status plus parsed JSON body
    /// (`Value::Null` when the body is empty or not JSON)
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        authorization: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);

        if let Some(value) = authorization {
            request = request.header(header::AUTHORIZATION, value);
        }

        let body = match body {
            Some(json) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .app
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        (status, json)
    }

    pub async fn get(&self, uri: &str, account: &Account) -> (StatusCode, Value) {
        self.send(Method::GET, uri, Some(&account.auth_header()), None)
            .await
    }

    pub async fn register(&self, username: &str, password: &str) -> (StatusCode, Value) {
        self.send(
            Method::POST,
            "/api/v1/register",
            None,
            Some(serde_json::json!({ "username": username, "password": password })),
        )
        .await
    }

    pub async fn login(&self, username: &str, password: &str) -> (StatusCode, Value) {
        self.send(
            Method::POST,
            "/api/v1/login",
            None,
            Some(serde_json::json!({ "username": username, "password": password })),
        )
        .await
    }

    /// Registers a standard account through the API and logs it in
    pub async fn standard_account(&self, username: &str) -> Account {
        let password = format!("{}-password", username);

        let (status, _) = self.register(username, &password).await;
        assert_eq!(status, StatusCode::CREATED);

        self.logged_in(username, &password).await
    }

    /// Creates an admin account through the bootstrap path and logs it in
    pub async fn admin_account(&self, username: &str) -> Account {
        let password = format!("{}-password", username);

        self.state
            .auth
            .ensure_admin(username, &password)
            .await
            .unwrap();

        self.logged_in(username, &password).await
    }

    async fn logged_in(&self, username: &str, password: &str) -> Account {
        let (status, body) = self.login(username, password).await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);

        Account {
            principal: serde_json::from_value(body["user"].clone()).unwrap(),
            token: body["token"].as_str().unwrap().to_string(),
        }
    }

    /// Creates a task as `account` and returns its ID
    pub async fn create_task(&self, account: &Account, title: &str) -> String {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/v1/todos",
                Some(&account.auth_header()),
                Some(serde_json::json!({ "title": title })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {}", body);

        body["todo"]["id"].as_str().unwrap().to_string()
    }
}
