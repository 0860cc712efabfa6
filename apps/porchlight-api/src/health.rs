//! Health check endpoint.

use std::sync::OnceLock;
use std::time::Instant;

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use sqlx::PgPool;
use utoipa::ToSchema;

static STARTED_AT: OnceLock<Instant> = OnceLock::new();

/// Record the server start time for uptime reporting.
pub fn mark_started() {
    let _ = STARTED_AT.set(Instant::now());
}

/// Service health report.
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// `healthy` when all checks pass, `degraded` otherwise.
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
    /// Database connectivity: `ok` or `unavailable`.
    pub database: &'static str,
    pub timestamp: String,
}

/// Report service health.
///
/// Answers 200 with a `degraded` status when the database is
/// unreachable, so load balancers can tell a slow dependency from a
/// dead process.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service health report", body = HealthResponse)
    )
)]
pub async fn health_handler(State(pool): State<PgPool>) -> Json<HealthResponse> {
    let database_ok = sqlx::query("SELECT 1").execute(&pool).await.is_ok();

    let uptime_seconds = STARTED_AT
        .get()
        .map(|started| started.elapsed().as_secs())
        .unwrap_or(0);

    Json(HealthResponse {
        status: if database_ok { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds,
        database: if database_ok { "ok" } else { "unavailable" },
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_started_is_idempotent() {
        mark_started();
        let first = *STARTED_AT.get().expect("start time should be recorded");
        mark_started();
        assert_eq!(first, *STARTED_AT.get().expect("start time should persist"));
    }
}
