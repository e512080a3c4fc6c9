//! User model and database operations
//!
//! Users are created at registration and never modified afterwards. They own
//! tasks and can be named as grantees in permissions.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE users (
//!     id BIGSERIAL PRIMARY KEY,
//!     username VARCHAR(150) NOT NULL UNIQUE,
//!     password_digest VARCHAR(255) NOT NULL
//! );
//! ```
//!
//! # Example
//!
//! ```no_run
//! use taskshare_shared::models::user::{User, CreateUser};
//! use taskshare_shared::db::pool::{create_pool, DatabaseConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = create_pool(DatabaseConfig::default()).await?;
//!
//! let created = User::create(&pool, CreateUser {
//!     username: "alice".to_string(),
//!     password_digest: "$argon2id$...".to_string(),
//! }).await?;
//!
//! let found = User::find_by_username(&pool, "alice").await?;
//! assert_eq!(created.map(|u| u.id), found.map(|u| u.id));
//! # Ok(())
//! # }
//! ```

use serde::Serialize;
use sqlx::PgPool;

/// User account
///
/// The password digest is an Argon2id PHC string. It is never serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID
    pub id: i64,

    /// Unique login name
    pub username: String,

    /// One-way password digest
    #[serde(skip_serializing)]
    pub password_digest: String,
}

/// Input for creating a new user
///
/// Carries the digest, never the raw password.
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Login name
    pub username: String,

    /// Password digest produced by [`crate::auth::password::PasswordService`]
    pub password_digest: String,
}

impl User {
    /// Inserts a user unless the username is already taken
    ///
    /// The uniqueness check and the insert are a single statement, so two
    /// concurrent registrations of the same name cannot both succeed.
    ///
    /// # Returns
    ///
    /// The new user, or `None` if the username already exists
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password_digest)
            VALUES ($1, $2)
            ON CONFLICT (username) DO NOTHING
            RETURNING id, username, password_digest
            "#,
        )
        .bind(data.username)
        .bind(data.password_digest)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_digest
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by username (exact match)
    pub async fn find_by_username(
        pool: &PgPool,
        username: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_digest
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_is_not_serialized() {
        let user = User {
            id: 7,
            username: "alice".to_string(),
            password_digest: "$argon2id$secret".to_string(),
        };

        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["username"], "alice");
        assert!(json.get("password_digest").is_none());
    }
}
