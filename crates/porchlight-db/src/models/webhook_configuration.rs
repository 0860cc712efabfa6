//! Webhook configuration entity model.
//!
//! A configuration is one tenant-owned endpoint subscribed to a set of
//! event types. The signing secret is stored encrypted and only ever
//! returned in plaintext at creation time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A registered webhook endpoint.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct WebhookConfiguration {
    /// Unique identifier for the configuration.
    pub id: Uuid,

    /// The tenant that owns this endpoint.
    pub tenant_id: Uuid,

    /// Destination URL for deliveries.
    pub url: String,

    /// Event types this endpoint is subscribed to.
    pub events: Vec<String>,

    /// Whether deliveries are currently enabled.
    pub active: bool,

    /// AES-256-GCM encrypted signing secret (base64).
    pub secret_encrypted: String,

    /// When the configuration was created.
    pub created_at: DateTime<Utc>,

    /// When the configuration was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Data for creating a webhook configuration.
#[derive(Debug, Clone)]
pub struct CreateWebhookConfiguration {
    pub tenant_id: Uuid,
    pub url: String,
    pub events: Vec<String>,
    pub active: bool,
    pub secret_encrypted: String,
}

/// Data for updating a webhook configuration.
///
/// `None` fields are left unchanged. The signing secret is immutable
/// and deliberately absent.
#[derive(Debug, Clone, Default)]
pub struct UpdateWebhookConfiguration {
    pub url: Option<String>,
    pub events: Option<Vec<String>>,
    pub active: Option<bool>,
}

impl WebhookConfiguration {
    /// Create a new webhook configuration.
    pub async fn create(
        pool: &sqlx::PgPool,
        config: CreateWebhookConfiguration,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as(
            r"
            INSERT INTO webhook_configurations (tenant_id, url, events, active, secret_encrypted)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            ",
        )
        .bind(config.tenant_id)
        .bind(&config.url)
        .bind(&config.events)
        .bind(config.active)
        .bind(&config.secret_encrypted)
        .fetch_one(pool)
        .await
    }

    /// Find a configuration by ID within a tenant.
    pub async fn find_by_id(
        pool: &sqlx::PgPool,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as(
            r"
            SELECT * FROM webhook_configurations
            WHERE tenant_id = $1 AND id = $2
            ",
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// List configurations for a tenant with pagination, newest first.
    pub async fn list_by_tenant(
        pool: &sqlx::PgPool,
        tenant_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as(
            r"
            SELECT * FROM webhook_configurations
            WHERE tenant_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            ",
        )
        .bind(tenant_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    /// Count configurations for a tenant.
    pub async fn count_by_tenant(pool: &sqlx::PgPool, tenant_id: Uuid) -> Result<i64, sqlx::Error> {
        let result: (i64,) = sqlx::query_as(
            r"
            SELECT COUNT(*) FROM webhook_configurations
            WHERE tenant_id = $1
            ",
        )
        .bind(tenant_id)
        .fetch_one(pool)
        .await?;

        Ok(result.0)
    }

    /// Find active configurations subscribed to an event type.
    ///
    /// This is the dispatch query: only active endpoints whose event list
    /// contains the given type receive deliveries.
    pub async fn find_active_by_event(
        pool: &sqlx::PgPool,
        tenant_id: Uuid,
        event: &str,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as(
            r"
            SELECT * FROM webhook_configurations
            WHERE tenant_id = $1 AND active = TRUE AND $2 = ANY(events)
            ",
        )
        .bind(tenant_id)
        .bind(event)
        .fetch_all(pool)
        .await
    }

    /// Update a configuration, leaving `None` fields unchanged.
    ///
    /// Returns `None` if the configuration does not exist in the tenant.
    pub async fn update(
        pool: &sqlx::PgPool,
        tenant_id: Uuid,
        id: Uuid,
        update: UpdateWebhookConfiguration,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as(
            r"
            UPDATE webhook_configurations
            SET url = COALESCE($3, url),
                events = COALESCE($4, events),
                active = COALESCE($5, active),
                updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            RETURNING *
            ",
        )
        .bind(tenant_id)
        .bind(id)
        .bind(&update.url)
        .bind(&update.events)
        .bind(update.active)
        .fetch_optional(pool)
        .await
    }

    /// Delete a configuration. Returns `true` if a row was removed.
    ///
    /// Delivery logs referencing the configuration are intentionally kept.
    pub async fn delete(
        pool: &sqlx::PgPool,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r"
            DELETE FROM webhook_configurations
            WHERE tenant_id = $1 AND id = $2
            ",
        )
        .bind(tenant_id)
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
