//! Database models for TaskShare
//!
//! Each model carries its own SQL as associated functions taking a `PgPool`.
//! Handlers do not call these directly; they go through the traits in
//! [`crate::store`], whose PostgreSQL backend delegates here.
//!
//! # Models
//!
//! - `user`: Accounts with a password digest
//! - `task`: Tasks with a single owner
//! - `permission`: Per-task grants for non-owners

pub mod permission;
pub mod task;
pub mod user;
