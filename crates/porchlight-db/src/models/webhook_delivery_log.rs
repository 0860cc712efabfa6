//! Webhook delivery log entity model.
//!
//! One row per delivery sequence. The automatic retry loop writes a single
//! row after the final attempt; manual retries mutate that row in place so
//! a payload never has more than one log entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Terminal status of a delivery sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebhookDeliveryStatus {
    Success,
    Failed,
}

impl WebhookDeliveryStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookDeliveryStatus::Success => "success",
            WebhookDeliveryStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for WebhookDeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A webhook delivery log entry.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct WebhookDeliveryLog {
    /// Unique identifier for the log entry.
    pub id: Uuid,

    /// The configuration this delivery was sent for.
    ///
    /// Not a foreign key: logs outlive deleted configurations.
    pub webhook_id: Uuid,

    /// The tenant that owns the configuration (denormalized for listing).
    pub tenant_id: Uuid,

    /// Event type that was delivered.
    pub event: String,

    /// The event payload that was signed and sent.
    pub payload: serde_json::Value,

    /// Terminal status: "success" or "failed".
    pub status: String,

    /// Total attempts made so far, including manual retries.
    pub attempts: i32,

    /// Error message from the last attempt (None on success).
    pub error: Option<String>,

    /// When the most recent attempt finished.
    pub last_attempt_at: DateTime<Utc>,

    /// When the log entry was created.
    pub created_at: DateTime<Utc>,
}

/// Data for creating a delivery log entry.
#[derive(Debug, Clone)]
pub struct CreateWebhookDeliveryLog {
    pub webhook_id: Uuid,
    pub tenant_id: Uuid,
    pub event: String,
    pub payload: serde_json::Value,
    pub status: WebhookDeliveryStatus,
    pub attempts: i32,
    pub error: Option<String>,
}

impl WebhookDeliveryLog {
    /// Create a new delivery log entry.
    pub async fn create(
        pool: &sqlx::PgPool,
        log: CreateWebhookDeliveryLog,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as(
            r"
            INSERT INTO webhook_delivery_logs (
                webhook_id, tenant_id, event, payload, status, attempts, error
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            ",
        )
        .bind(log.webhook_id)
        .bind(log.tenant_id)
        .bind(&log.event)
        .bind(&log.payload)
        .bind(log.status.as_str())
        .bind(log.attempts)
        .bind(&log.error)
        .fetch_one(pool)
        .await
    }

    /// Find a log entry by ID within a tenant.
    pub async fn find_by_id(
        pool: &sqlx::PgPool,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as(
            r"
            SELECT * FROM webhook_delivery_logs
            WHERE tenant_id = $1 AND id = $2
            ",
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// List log entries for a configuration with pagination, newest first.
    pub async fn list_by_webhook(
        pool: &sqlx::PgPool,
        tenant_id: Uuid,
        webhook_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as(
            r"
            SELECT * FROM webhook_delivery_logs
            WHERE tenant_id = $1 AND webhook_id = $2
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            ",
        )
        .bind(tenant_id)
        .bind(webhook_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    /// Count log entries for a configuration.
    pub async fn count_by_webhook(
        pool: &sqlx::PgPool,
        tenant_id: Uuid,
        webhook_id: Uuid,
    ) -> Result<i64, sqlx::Error> {
        let result: (i64,) = sqlx::query_as(
            r"
            SELECT COUNT(*) FROM webhook_delivery_logs
            WHERE tenant_id = $1 AND webhook_id = $2
            ",
        )
        .bind(tenant_id)
        .bind(webhook_id)
        .fetch_one(pool)
        .await?;

        Ok(result.0)
    }

    /// Record the outcome of a further attempt on an existing entry.
    ///
    /// Overwrites status and error, and stamps `last_attempt_at`. Used by
    /// manual retry, which mutates the sequence's single row in place.
    pub async fn record_attempt(
        pool: &sqlx::PgPool,
        id: Uuid,
        status: WebhookDeliveryStatus,
        attempts: i32,
        error: Option<&str>,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as(
            r"
            UPDATE webhook_delivery_logs
            SET status = $2, attempts = $3, error = $4, last_attempt_at = NOW()
            WHERE id = $1
            RETURNING *
            ",
        )
        .bind(id)
        .bind(status.as_str())
        .bind(attempts)
        .bind(error)
        .fetch_optional(pool)
        .await
    }
}
