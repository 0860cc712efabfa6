//! Database layer for the Porchlight API.
//!
//! Provides the connection pool, embedded migrations, and entity models
//! for webhook configurations and delivery logs.

pub mod error;
pub mod migrations;
pub mod models;
pub mod pool;

pub use error::DbError;
pub use migrations::run_migrations;
pub use pool::create_pool;
