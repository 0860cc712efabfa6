//! Database connection pool setup.

use crate::error::DbError;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

/// Create a connection pool for the given database URL.
///
/// Uses a maximum of 10 connections and a 5 second acquire timeout.
///
/// # Errors
///
/// Returns `DbError::ConnectionFailed` if the database is unreachable
/// or the credentials are invalid.
pub async fn create_pool(database_url: &str) -> Result<PgPool, DbError> {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
        .map_err(DbError::ConnectionFailed)
}
