/// Storage collaborators of the auth core
///
/// The authentication service and the HTTP handlers depend on these traits
/// rather than on a concrete database, so the core stays storage-agnostic and
/// every dependency is passed in explicitly.
///
/// # Implementations
///
/// - [`postgres`]: sqlx-backed stores over a `PgPool`
/// - [`memory`]: process-local stores for tests and local runs
///
/// Each operation is a single read or write; no multi-statement
/// transactions are needed.

use async_trait::async_trait;
use uuid::Uuid;

use crate::auth::authorization::ListScope;
use crate::models::task::{CreateTask, Task, UpdateTask};
use crate::models::user::{CreateUser, User};

pub mod memory;
pub mod postgres;

pub use memory::{MemoryCredentialStore, MemoryTaskStore};
pub use postgres::{PgCredentialStore, PgTaskStore};

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Username unique constraint violated
    #[error("Username already exists")]
    DuplicateLogin,

    /// Connectivity, constraint or query failure
    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            let on_username = db_err
                .constraint()
                .map(|constraint| constraint.contains("username"))
                .unwrap_or(false);

            if db_err.is_unique_violation() && on_username {
                return StoreError::DuplicateLogin;
            }
        }

        StoreError::Backend(err.to_string())
    }
}

/// Persistence of credential records
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Exact, case-sensitive lookup
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Fails with `StoreError::DuplicateLogin` if the username is taken
    async fn insert(&self, data: CreateUser) -> Result<User, StoreError>;

    /// All records, newest first
    async fn list_all(&self) -> Result<Vec<User>, StoreError>;
}

/// Persistence of tasks
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Ownership fact for authorization checks
    async fn find_owner_of(&self, id: Uuid) -> Result<Option<Uuid>, StoreError>;

    async fn create(&self, data: CreateTask) -> Result<Task, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Task>, StoreError>;

    /// Tasks visible under `scope`, newest first
    async fn list(&self, scope: ListScope) -> Result<Vec<Task>, StoreError>;

    /// `None` if the task no longer exists
    async fn update(&self, id: Uuid, data: UpdateTask) -> Result<Option<Task>, StoreError>;

    /// `false` if the task no longer exists
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
}
