//! PostgreSQL store backed by the model queries
//!
//! Every call checks a connection out of the pool for the duration of one
//! statement; it goes back to the pool when the call returns or fails.
//!
//! # Example
//!
//! ```no_run
//! use taskshare_shared::db::pool::{create_pool, DatabaseConfig};
//! use taskshare_shared::store::{postgres::PgStore, TaskStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = create_pool(DatabaseConfig::default()).await?;
//! let store = PgStore::new(pool);
//! let tasks = store.list_tasks_owned_by(1).await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use sqlx::PgPool;

use super::{CredentialStore, PermissionStore, Store, StoreError, StoreResult, TaskStore};
use crate::db::pool::health_check;
use crate::models::{
    permission::{CreatePermission, Permission},
    task::{CreateTask, Task, UpdateTask},
    user::{CreateUser, User},
};

/// Store implementation over a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Maps constraint violations to domain errors
fn map_write_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return StoreError::Conflict(
                db_err.constraint().unwrap_or("unique constraint").to_string(),
            );
        }
        if db_err.is_foreign_key_violation() {
            return StoreError::MissingReference(
                db_err.constraint().unwrap_or("foreign key").to_string(),
            );
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(User::find_by_username(&self.pool, username).await?)
    }

    async fn find_user_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }

    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        let username = data.username.clone();
        User::create(&self.pool, data)
            .await
            .map_err(map_write_error)?
            .ok_or_else(|| StoreError::Conflict(format!("username '{}' already exists", username)))
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn find_task(&self, id: i64) -> StoreResult<Option<Task>> {
        Ok(Task::find_by_id(&self.pool, id).await?)
    }

    async fn create_task(&self, data: CreateTask) -> StoreResult<Task> {
        Task::create(&self.pool, data).await.map_err(map_write_error)
    }

    async fn update_task(&self, id: i64, changes: UpdateTask) -> StoreResult<Option<Task>> {
        Ok(Task::update(&self.pool, id, changes).await?)
    }

    async fn update_task_as_editor(
        &self,
        id: i64,
        editor_id: i64,
        changes: UpdateTask,
    ) -> StoreResult<Option<Task>> {
        Ok(Task::update_as_editor(&self.pool, id, editor_id, changes).await?)
    }

    async fn delete_task(&self, id: i64) -> StoreResult<Option<Task>> {
        Ok(Task::delete(&self.pool, id).await?)
    }

    async fn delete_task_as_owner(&self, id: i64, owner_id: i64) -> StoreResult<Option<Task>> {
        Ok(Task::delete_as_owner(&self.pool, id, owner_id).await?)
    }

    async fn list_tasks_owned_by(&self, user_id: i64) -> StoreResult<Vec<Task>> {
        Ok(Task::list_by_owner(&self.pool, user_id).await?)
    }

    async fn list_tasks_shared_with(&self, user_id: i64) -> StoreResult<Vec<Task>> {
        Ok(Task::list_shared_with(&self.pool, user_id).await?)
    }
}

#[async_trait]
impl PermissionStore for PgStore {
    async fn find_permission(
        &self,
        task_id: i64,
        user_id: i64,
    ) -> StoreResult<Option<Permission>> {
        Ok(Permission::find(&self.pool, task_id, user_id).await?)
    }

    async fn find_permission_by_id(&self, id: i64) -> StoreResult<Option<Permission>> {
        Ok(Permission::find_by_id(&self.pool, id).await?)
    }

    async fn create_permission(&self, data: CreatePermission) -> StoreResult<Permission> {
        Permission::create(&self.pool, data)
            .await
            .map_err(map_write_error)
    }

    async fn create_permission_as_owner(
        &self,
        owner_id: i64,
        data: CreatePermission,
    ) -> StoreResult<Option<Permission>> {
        Permission::create_as_owner(&self.pool, owner_id, data)
            .await
            .map_err(map_write_error)
    }

    async fn delete_permission(&self, id: i64) -> StoreResult<bool> {
        Ok(Permission::delete(&self.pool, id).await?)
    }

    async fn delete_permission_as_owner(&self, id: i64, owner_id: i64) -> StoreResult<bool> {
        Ok(Permission::delete_as_owner(&self.pool, id, owner_id).await?)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(health_check(&self.pool).await?)
    }
}
