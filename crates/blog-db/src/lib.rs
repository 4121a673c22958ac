//! Database layer for the blog.
//!
//! Provides SQLite connection pooling (via `r2d2`), WAL-mode initialization
//! with foreign keys enforced, and embedded SQL migrations. Every table the
//! blog uses is created through versioned migrations managed by this crate.
//!
//! Migrations are compiled into the binary with `include_str!`, so the schema
//! always ships with the code that queries it.

mod migrations;
mod pool;

pub use migrations::{run_migrations, MigrationError};
pub use pool::{create_pool, DbPool, DbRuntimeSettings, PoolError};
