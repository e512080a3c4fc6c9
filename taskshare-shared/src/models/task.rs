//! Task model and database operations
//!
//! A task has exactly one owner, fixed at creation. Non-owners reach a task
//! only through a [`Permission`](super::permission::Permission) grant.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE tasks (
//!     id BIGSERIAL PRIMARY KEY,
//!     title TEXT NOT NULL,
//!     description TEXT NOT NULL DEFAULT '',
//!     completed BOOLEAN NOT NULL DEFAULT FALSE,
//!     owner_id BIGINT NOT NULL REFERENCES users(id)
//! );
//! ```
//!
//! # Example
//!
//! ```no_run
//! use taskshare_shared::models::task::{CreateTask, Task, UpdateTask};
//! use sqlx::PgPool;
//!
//! # async fn example(pool: PgPool, owner_id: i64) -> Result<(), sqlx::Error> {
//! let task = Task::create(&pool, CreateTask {
//!     title: "Write report".to_string(),
//!     description: String::new(),
//!     owner_id,
//! }).await?;
//!
//! let done = UpdateTask { completed: Some(true), ..Default::default() };
//! Task::update(&pool, task.id, done).await?;
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

const TASK_COLUMNS: &str = "id, title, description, completed, owner_id";

/// Task owned by a single user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: i64,

    /// Short title
    pub title: String,

    /// Free-form description (empty by default)
    pub description: String,

    /// Completion flag (false on creation)
    pub completed: bool,

    /// Owning user, never reassigned
    pub owner_id: i64,
}

impl Task {
    /// Returns true if `user_id` owns this task
    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.owner_id == user_id
    }
}

/// Input for creating a task
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub title: String,
    pub description: String,
    pub owner_id: i64,
}

/// Partial update for a task
///
/// Only `Some` fields are written. The owner cannot be changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateTask {
    /// New title
    pub title: Option<String>,

    /// New description
    pub description: Option<String>,

    /// New completion flag
    pub completed: Option<bool>,
}

impl UpdateTask {
    /// Merges the present fields into `task`
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = description.clone();
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
    }
}

impl Task {
    /// Creates a task; `completed` starts as false
    ///
    /// # Errors
    ///
    /// Fails with a foreign key violation if the owner does not exist
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "INSERT INTO tasks (title, description, owner_id) VALUES ($1, $2, $3) RETURNING {TASK_COLUMNS}"
        ))
        .bind(data.title)
        .bind(data.description)
        .bind(data.owner_id)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Applies a partial update
    ///
    /// # Returns
    ///
    /// The updated task, or `None` if no task has this ID
    pub async fn update(
        pool: &PgPool,
        id: i64,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                completed = COALESCE($4, completed)
            WHERE id = $1
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.completed)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Applies a partial update only if `editor_id` may edit the task
    ///
    /// The edit rule (owner, or grantee with `can_edit`) is part of the
    /// statement's predicate, so a grant revoked concurrently cannot be used.
    ///
    /// # Returns
    ///
    /// The updated task, or `None` if the task is missing or not editable
    pub async fn update_as_editor(
        pool: &PgPool,
        id: i64,
        editor_id: i64,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks
            SET title = COALESCE($3, title),
                description = COALESCE($4, description),
                completed = COALESCE($5, completed)
            WHERE id = $1
              AND (
                owner_id = $2
                OR EXISTS (
                    SELECT 1 FROM permissions p
                    WHERE p.task_id = tasks.id AND p.user_id = $2 AND p.can_edit
                )
              )
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(editor_id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.completed)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Deletes a task and returns the deleted row
    ///
    /// ⚠️  Permissions on the task are removed with it (ON DELETE CASCADE).
    pub async fn delete(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "DELETE FROM tasks WHERE id = $1 RETURNING {TASK_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Deletes a task only if `owner_id` owns it
    pub async fn delete_as_owner(
        pool: &PgPool,
        id: i64,
        owner_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "DELETE FROM tasks WHERE id = $1 AND owner_id = $2 RETURNING {TASK_COLUMNS}"
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Lists tasks owned by a user, oldest first
    pub async fn list_by_owner(pool: &PgPool, owner_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE owner_id = $1 ORDER BY id"
        ))
        .bind(owner_id)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Lists tasks a user holds a grant on, whether or not it allows editing
    pub async fn list_shared_with(pool: &PgPool, user_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT t.id, t.title, t.description, t.completed, t.owner_id
            FROM tasks t
            JOIN permissions p ON p.task_id = t.id
            WHERE p.user_id = $1
            ORDER BY t.id
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }
}
