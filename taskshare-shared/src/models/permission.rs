//! Permission model and database operations
//!
//! A permission grants a non-owner access to one task: read access always,
//! write access when `can_edit` is set. Only the task owner creates or
//! deletes permissions.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE permissions (
//!     id BIGSERIAL PRIMARY KEY,
//!     task_id BIGINT NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
//!     user_id BIGINT NOT NULL REFERENCES users(id),
//!     can_edit BOOLEAN NOT NULL DEFAULT FALSE,
//!     UNIQUE (task_id, user_id)
//! );
//! ```
//!
//! Granting twice to the same user updates `can_edit` on the existing row.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Access grant on a task for a single user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Permission {
    /// Unique permission ID
    pub id: i64,

    /// Task the grant applies to
    pub task_id: i64,

    /// Grantee
    pub user_id: i64,

    /// Whether the grantee may edit the task
    pub can_edit: bool,
}

/// Input for creating a permission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePermission {
    pub task_id: i64,
    pub user_id: i64,
    #[serde(default)]
    pub can_edit: bool,
}

impl Permission {
    /// Creates (or refreshes) the grant for `(task_id, user_id)`
    ///
    /// # Errors
    ///
    /// Fails with a foreign key violation if the task or user does not exist
    pub async fn create(pool: &PgPool, data: CreatePermission) -> Result<Self, sqlx::Error> {
        let permission = sqlx::query_as::<_, Permission>(
            r#"
            INSERT INTO permissions (task_id, user_id, can_edit)
            VALUES ($1, $2, $3)
            ON CONFLICT (task_id, user_id) DO UPDATE SET can_edit = EXCLUDED.can_edit
            RETURNING id, task_id, user_id, can_edit
            "#,
        )
        .bind(data.task_id)
        .bind(data.user_id)
        .bind(data.can_edit)
        .fetch_one(pool)
        .await?;

        Ok(permission)
    }

    /// Creates the grant only if `owner_id` owns the task
    ///
    /// # Returns
    ///
    /// The grant, or `None` if the task is missing or owned by someone else
    pub async fn create_as_owner(
        pool: &PgPool,
        owner_id: i64,
        data: CreatePermission,
    ) -> Result<Option<Self>, sqlx::Error> {
        let permission = sqlx::query_as::<_, Permission>(
            r#"
            INSERT INTO permissions (task_id, user_id, can_edit)
            SELECT t.id, $2, $3
            FROM tasks t
            WHERE t.id = $1 AND t.owner_id = $4
            ON CONFLICT (task_id, user_id) DO UPDATE SET can_edit = EXCLUDED.can_edit
            RETURNING id, task_id, user_id, can_edit
            "#,
        )
        .bind(data.task_id)
        .bind(data.user_id)
        .bind(data.can_edit)
        .bind(owner_id)
        .fetch_optional(pool)
        .await?;

        Ok(permission)
    }

    /// Finds the grant a user holds on a task
    pub async fn find(
        pool: &PgPool,
        task_id: i64,
        user_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        let permission = sqlx::query_as::<_, Permission>(
            r#"
            SELECT id, task_id, user_id, can_edit
            FROM permissions
            WHERE task_id = $1 AND user_id = $2
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(task_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(permission)
    }

    /// Finds a permission by ID
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        let permission = sqlx::query_as::<_, Permission>(
            "SELECT id, task_id, user_id, can_edit FROM permissions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(permission)
    }

    /// Deletes a permission
    ///
    /// # Returns
    ///
    /// True if a row was removed
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM permissions WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes a permission only if `owner_id` owns its task
    pub async fn delete_as_owner(
        pool: &PgPool,
        id: i64,
        owner_id: i64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM permissions p
            USING tasks t
            WHERE p.id = $1 AND t.id = p.task_id AND t.owner_id = $2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_permission_defaults_to_read_only() {
        let data: CreatePermission =
            serde_json::from_str(r#"{"task_id": 1, "user_id": 2}"#).unwrap();
        assert!(!data.can_edit);
    }
}
