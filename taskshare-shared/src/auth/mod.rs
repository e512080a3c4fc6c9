//! Authentication and authorization
//!
//! # Modules
//!
//! - [`password`]: Argon2id password hashing and verification
//! - [`jwt`]: Bearer token issuance and validation
//! - [`credentials`]: Registration and password login
//! - [`middleware`]: Request authentication for Axum
//! - [`authorization`]: Who may view, edit, delete, grant and revoke
//!
//! # Example
//!
//! ```no_run
//! use chrono::Duration;
//! use taskshare_shared::auth::{credentials, jwt::TokenService, password::PasswordService};
//! use taskshare_shared::store::memory::MemoryStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = MemoryStore::new();
//! let passwords = PasswordService::default();
//! let tokens = TokenService::new("a-secret-key-of-at-least-32-bytes!", Duration::minutes(30));
//!
//! credentials::register(&store, &passwords, "alice", "s3cret").await?;
//! if let Some(user) = credentials::authenticate(&store, &passwords, "alice", "s3cret").await? {
//!     let token = tokens.issue(&user.username)?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod authorization;
pub mod credentials;
pub mod jwt;
pub mod middleware;
pub mod password;
