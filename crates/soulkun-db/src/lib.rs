//! # soulkun-db
//!
//! PostgreSQL persistence layer for the Soul-kun access control core.
//!
//! Provides the connection pool, embedded migrations, and one model module
//! per table. Every tenant-scoped query binds `organization_id`; no query
//! in this crate may span organizations.
//!
//! # Example
//!
//! ```rust,ignore
//! use soulkun_db::{DbConfig, DbPool, run_migrations};
//!
//! let config = DbConfig::new("postgres://localhost/soulkun");
//! let pool = DbPool::connect(&config).await?;
//! run_migrations(&pool).await?;
//! ```

pub mod error;
pub mod migrations;
pub mod models;
pub mod pool;

pub use error::DbError;
pub use migrations::run_migrations;
pub use pool::{DbConfig, DbPool};
