//! Storage traits for users, tasks and permissions
//!
//! Handlers depend on these traits rather than on a database handle, so the
//! same request code runs against PostgreSQL in production
//! ([`postgres::PgStore`]) and against memory in tests
//! ([`memory::MemoryStore`]).
//!
//! # Conventions
//!
//! - Lookups return `Ok(None)` for a missing row; they never error for "not found".
//! - `*_as_owner` / `*_as_editor` methods are conditional writes: the access
//!   rule is checked by the same atomic operation that performs the write,
//!   and `None`/`false` means "missing or not allowed".
//! - Any other failure is a [`StoreError`] and ends the request.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::models::{
    permission::{CreatePermission, Permission},
    task::{CreateTask, Task, UpdateTask},
    user::{CreateUser, User},
};

/// Result alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Storage failure
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness rule rejected the write
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The write references a row that does not exist
    #[error("Missing reference: {0}")]
    MissingReference(String),

    /// Backend failure (connectivity, unexpected constraint, ...)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Persists user identities and password digests
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Finds a user by exact username
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    /// Finds a user by ID
    async fn find_user_by_id(&self, id: i64) -> StoreResult<Option<User>>;

    /// Creates a user
    ///
    /// # Errors
    ///
    /// [`StoreError::Conflict`] if the username is taken. The check is atomic
    /// with the insert.
    async fn create_user(&self, data: CreateUser) -> StoreResult<User>;
}

/// Persists tasks
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn find_task(&self, id: i64) -> StoreResult<Option<Task>>;

    /// Creates a task with `completed = false`
    async fn create_task(&self, data: CreateTask) -> StoreResult<Task>;

    /// Partial update; `None` if the task does not exist
    async fn update_task(&self, id: i64, changes: UpdateTask) -> StoreResult<Option<Task>>;

    /// Partial update applied only if `editor_id` is the owner or holds an
    /// edit-capable grant at the time of the write
    async fn update_task_as_editor(
        &self,
        id: i64,
        editor_id: i64,
        changes: UpdateTask,
    ) -> StoreResult<Option<Task>>;

    /// Deletes a task and its permissions, returning the deleted task
    async fn delete_task(&self, id: i64) -> StoreResult<Option<Task>>;

    /// Deletes a task only if `owner_id` owns it
    async fn delete_task_as_owner(&self, id: i64, owner_id: i64) -> StoreResult<Option<Task>>;

    async fn list_tasks_owned_by(&self, user_id: i64) -> StoreResult<Vec<Task>>;

    /// Tasks the user holds any grant on
    async fn list_tasks_shared_with(&self, user_id: i64) -> StoreResult<Vec<Task>>;
}

/// Persists per-task grants
#[async_trait]
pub trait PermissionStore: Send + Sync {
    /// Grant held by `user_id` on `task_id`
    async fn find_permission(&self, task_id: i64, user_id: i64)
        -> StoreResult<Option<Permission>>;

    async fn find_permission_by_id(&self, id: i64) -> StoreResult<Option<Permission>>;

    /// Creates the grant, or updates `can_edit` if the pair already has one
    ///
    /// # Errors
    ///
    /// [`StoreError::MissingReference`] if the task or user does not exist
    async fn create_permission(&self, data: CreatePermission) -> StoreResult<Permission>;

    /// Like [`create_permission`](Self::create_permission), only if
    /// `owner_id` owns the task; `None` otherwise
    async fn create_permission_as_owner(
        &self,
        owner_id: i64,
        data: CreatePermission,
    ) -> StoreResult<Option<Permission>>;

    /// True if a row was removed
    async fn delete_permission(&self, id: i64) -> StoreResult<bool>;

    /// Removes the permission only if `owner_id` owns its task
    async fn delete_permission_as_owner(&self, id: i64, owner_id: i64) -> StoreResult<bool>;
}

/// Complete storage backend used by the API
#[async_trait]
pub trait Store: CredentialStore + TaskStore + PermissionStore {
    /// Verifies the backend is reachable
    async fn ping(&self) -> StoreResult<()>;
}
