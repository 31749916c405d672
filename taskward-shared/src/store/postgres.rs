/// PostgreSQL-backed stores
///
/// Thin adapters from the store traits onto the model queries in
/// [`crate::models`]. sqlx errors are translated into [`StoreError`]; a
/// unique violation on the username becomes `DuplicateLogin`.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskward_shared::db::pool::{create_pool, DatabaseConfig};
/// use taskward_shared::store::{CredentialStore, PgCredentialStore};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
/// let credentials: Arc<dyn CredentialStore> = Arc::new(PgCredentialStore::new(pool));
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{CredentialStore, StoreError, TaskStore};
use crate::auth::authorization::ListScope;
use crate::models::task::{CreateTask, Task, UpdateTask};
use crate::models::user::{CreateUser, User};

/// Credential store over the `users` table
#[derive(Debug, Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(User::find_by_username(&self.pool, username).await?)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }

    async fn insert(&self, data: CreateUser) -> Result<User, StoreError> {
        Ok(User::create(&self.pool, data).await?)
    }

    async fn list_all(&self) -> Result<Vec<User>, StoreError> {
        Ok(User::list_all(&self.pool).await?)
    }
}

/// Task store over the `tasks` table
#[derive(Debug, Clone)]
pub struct PgTaskStore {
    pool: PgPool,
}

impl PgTaskStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskStore for PgTaskStore {
    async fn find_owner_of(&self, id: Uuid) -> Result<Option<Uuid>, StoreError> {
        Ok(Task::find_owner(&self.pool, id).await?)
    }

    async fn create(&self, data: CreateTask) -> Result<Task, StoreError> {
        Ok(Task::create(&self.pool, data).await?)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Task>, StoreError> {
        Ok(Task::find_by_id(&self.pool, id).await?)
    }

    async fn list(&self, scope: ListScope) -> Result<Vec<Task>, StoreError> {
        let tasks = match scope {
            ListScope::Owner(user_id) => Task::list_by_user(&self.pool, user_id).await?,
            ListScope::All => Task::list_all(&self.pool).await?,
        };

        Ok(tasks)
    }

    async fn update(&self, id: Uuid, data: UpdateTask) -> Result<Option<Task>, StoreError> {
        Ok(Task::update(&self.pool, id, data).await?)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(Task::delete(&self.pool, id).await?)
    }
}
