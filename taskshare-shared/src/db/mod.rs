//! PostgreSQL connection pool and schema migrations
//!
//! Models live in [`crate::models`]; the store backend over this pool is
//! [`crate::store::postgres::PgStore`].

pub mod migrations;
pub mod pool;
