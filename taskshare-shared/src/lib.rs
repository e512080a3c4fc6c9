//! # TaskShare Shared Library
//!
//! This crate contains the domain types, storage layer and access-control
//! rules used by the TaskShare API server.
//!
//! ## Module Organization
//!
//! - `models`: Database models (users, tasks, permissions) and their SQL
//! - `store`: Storage traits with PostgreSQL and in-memory backends
//! - `auth`: Passwords, tokens, request authentication and the access evaluator
//! - `db`: Connection pool and migrations

pub mod auth;
pub mod db;
pub mod models;
pub mod store;

/// Current version of the TaskShare shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
