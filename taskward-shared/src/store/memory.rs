/// In-memory stores
///
/// Process-local implementations of [`CredentialStore`] and [`TaskStore`]
/// behind a `tokio::sync::RwLock`. They enforce the same contract as the
/// PostgreSQL stores (case-sensitive unique usernames, newest-first listing,
/// immutable task owner) and back the test suite and `STORAGE=memory` runs.
///
/// # Example
///
/// ```
/// use taskward_shared::models::user::{CreateUser, Role};
/// use taskward_shared::store::{CredentialStore, MemoryCredentialStore};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryCredentialStore::new();
/// let user = store.insert(CreateUser {
///     username: "alice".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     role: Role::Standard,
/// }).await?;
///
/// assert!(store.find_by_username("alice").await?.is_some());
/// assert!(store.find_by_username("Alice").await?.is_none());
/// # Ok(())
/// # }
/// ```

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CredentialStore, StoreError, TaskStore};
use crate::auth::authorization::ListScope;
use crate::models::task::{CreateTask, Task, TaskStatus, UpdateTask};
use crate::models::user::{CreateUser, User};

/// Credential store held in process memory
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn insert(&self, data: CreateUser) -> Result<User, StoreError> {
        // Check and insert under one write lock
        let mut users = self.users.write().await;

        if users.values().any(|u| u.username == data.username) {
            return Err(StoreError::DuplicateLogin);
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: data.username,
            password_hash: data.password_hash,
            role: data.role,
            created_at: now,
            updated_at: now,
        };

        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn list_all(&self) -> Result<Vec<User>, StoreError> {
        let mut users: Vec<User> = self.users.read().await.values().cloned().collect();
        users.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(users)
    }
}

/// Task store held in process memory
#[derive(Debug, Default)]
pub struct MemoryTaskStore {
    tasks: RwLock<HashMap<Uuid, Task>>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn find_owner_of(&self, id: Uuid) -> Result<Option<Uuid>, StoreError> {
        Ok(self.tasks.read().await.get(&id).map(|t| t.user_id))
    }

    async fn create(&self, data: CreateTask) -> Result<Task, StoreError> {
        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4(),
            user_id: data.user_id,
            title: data.title,
            description: data.description,
            status: TaskStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        self.tasks.write().await.insert(task.id, task.clone());
        Ok(task)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Task>, StoreError> {
        Ok(self.tasks.read().await.get(&id).cloned())
    }

    async fn list(&self, scope: ListScope) -> Result<Vec<Task>, StoreError> {
        let mut tasks: Vec<Task> = self
            .tasks
            .read()
            .await
            .values()
            .filter(|t| match scope {
                ListScope::Owner(user_id) => t.user_id == user_id,
                ListScope::All => true,
            })
            .cloned()
            .collect();

        tasks.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(tasks)
    }

    async fn update(&self, id: Uuid, data: UpdateTask) -> Result<Option<Task>, StoreError> {
        let mut tasks = self.tasks.write().await;

        Ok(tasks.get_mut(&id).map(|task| {
            data.apply_to(task);
            task.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.tasks.write().await.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::Role;

    fn new_user(username: &str) -> CreateUser {
        CreateUser {
            username: username.to_string(),
            password_hash: "$argon2id$placeholder".to_string(),
            role: Role::Standard,
        }
    }

    fn new_task(user_id: Uuid, title: &str) -> CreateTask {
        CreateTask {
            user_id,
            title: title.to_string(),
            description: String::new(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let store = MemoryCredentialStore::new();
        let user = store.insert(new_user("alice")).await.unwrap();

        let by_name = store.find_by_username("alice").await.unwrap().unwrap();
        let by_id = store.find_by_id(user.id).await.unwrap().unwrap();

        assert_eq!(by_name.id, user.id);
        assert_eq!(by_id.username, "alice");
        assert_eq!(by_id.role, Role::Standard);
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let store = MemoryCredentialStore::new();
        store.insert(new_user("alice")).await.unwrap();

        let result = store.insert(new_user("alice")).await;
        assert!(matches!(result, Err(StoreError::DuplicateLogin)));
    }

    #[tokio::test]
    async fn test_username_lookup_is_case_sensitive() {
        let store = MemoryCredentialStore::new();
        store.insert(new_user("alice")).await.unwrap();

        assert!(store.find_by_username("ALICE").await.unwrap().is_none());
        assert!(store.insert(new_user("Alice")).await.is_ok());
        assert_eq!(store.list_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_task_scope_filtering() {
        let store = MemoryTaskStore::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        store.create(new_task(alice, "a1")).await.unwrap();
        store.create(new_task(alice, "a2")).await.unwrap();
        store.create(new_task(bob, "b1")).await.unwrap();

        let own = store.list(ListScope::Owner(alice)).await.unwrap();
        assert_eq!(own.len(), 2);
        assert!(own.iter().all(|t| t.user_id == alice));

        assert_eq!(store.list(ListScope::All).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_list_order_breaks_timestamp_ties_by_id() {
        let store = MemoryTaskStore::new();
        let owner = Uuid::new_v4();
        let now = Utc::now();

        {
            let mut tasks = store.tasks.write().await;
            for title in ["a", "b", "c", "d"] {
                let task = Task {
                    id: Uuid::new_v4(),
                    user_id: owner,
                    title: title.to_string(),
                    description: String::new(),
                    status: TaskStatus::Pending,
                    created_at: now,
                    updated_at: now,
                };
                tasks.insert(task.id, task);
            }
        }

        let listed = store.list(ListScope::Owner(owner)).await.unwrap();
        let ids: Vec<Uuid> = listed.iter().map(|t| t.id).collect();

        let mut expected = ids.clone();
        expected.sort_by(|a, b| b.cmp(a));
        assert_eq!(ids, expected);

        let again: Vec<Uuid> = store
            .list(ListScope::All)
            .await
            .unwrap()
            .iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(again, ids);
    }

    #[tokio::test]
    async fn test_users_listed_newest_first() {
        let store = MemoryCredentialStore::new();
        let now = Utc::now();

        {
            let mut users = store.users.write().await;
            for (offset, username) in [(0, "old"), (5, "new"), (5, "also-new")] {
                let user = User {
                    id: Uuid::new_v4(),
                    username: username.to_string(),
                    password_hash: String::new(),
                    role: Role::Standard,
                    created_at: now + chrono::Duration::seconds(offset),
                    updated_at: now,
                };
                users.insert(user.id, user);
            }
        }

        let listed = store.list_all().await.unwrap();

        assert_eq!(listed[2].username, "old");
        assert!(listed[0].id > listed[1].id);
    }

    #[tokio::test]
    async fn test_task_update_keeps_owner() {
        let store = MemoryTaskStore::new();
        let alice = Uuid::new_v4();
        let task = store.create(new_task(alice, "draft")).await.unwrap();

        let updated = store
            .update(task.id, UpdateTask::status(TaskStatus::Completed))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.status, TaskStatus::Completed);
        assert_eq!(updated.user_id, alice);
        assert_eq!(store.find_owner_of(task.id).await.unwrap(), Some(alice));
    }

    #[tokio::test]
    async fn test_missing_task_operations() {
        let store = MemoryTaskStore::new();
        let id = Uuid::new_v4();

        assert_eq!(store.find_owner_of(id).await.unwrap(), None);
        assert!(store.update(id, UpdateTask::default()).await.unwrap().is_none());
        assert!(!store.delete(id).await.unwrap());
    }

    #[tokio::test]
    async fn test_task_delete() {
        let store = MemoryTaskStore::new();
        let task = store.create(new_task(Uuid::new_v4(), "gone")).await.unwrap();

        assert!(store.delete(task.id).await.unwrap());
        assert!(store.find_by_id(task.id).await.unwrap().is_none());
    }
}
