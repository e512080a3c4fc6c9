//! API route handlers, organized by resource
//!
//! - `health`: Service banner and health check
//! - `auth`: Registration and login
//! - `tasks`: Task CRUD
//! - `permissions`: Grant and revoke

pub mod auth;
pub mod health;
pub mod permissions;
pub mod tasks;
