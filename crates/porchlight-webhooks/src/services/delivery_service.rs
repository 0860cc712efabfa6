//! Webhook delivery orchestration.
//!
//! Finds matching configurations for an event, runs each delivery sequence
//! through the executor with bounded fan-out, and records one log row per
//! sequence. Also implements manual retry of a logged delivery.

use std::sync::Arc;

use chrono::Utc;
use sqlx::PgPool;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use uuid::Uuid;

use crate::crypto;
use crate::error::WebhookError;
use crate::models::{RetryDeliveryResponse, WebhookDeliveryLogResponse, WebhookPayload};
use crate::services::event_publisher::WebhookEvent;
use crate::services::executor::{DeliveryExecutor, DeliveryOutcome};
use porchlight_db::models::{
    CreateWebhookDeliveryLog, WebhookConfiguration, WebhookDeliveryLog, WebhookDeliveryStatus,
};

/// Default number of endpoints delivered to concurrently per event.
pub const DEFAULT_FANOUT_CONCURRENCY: usize = 8;

/// How the log write for a delivery sequence concluded.
#[derive(Debug, Clone)]
pub enum LogWriteOutcome {
    /// A log row was written.
    Recorded(Uuid),
    /// The write failed. The delivery outcome stands regardless.
    Failed,
}

/// Combined result of a delivery sequence and its log write.
#[derive(Debug, Clone)]
pub struct DeliveryReport {
    pub delivery: DeliveryOutcome,
    pub log_write: LogWriteOutcome,
}

/// Service for webhook delivery operations.
#[derive(Clone)]
pub struct DeliveryService {
    pool: PgPool,
    executor: DeliveryExecutor,
    encryption_key: Vec<u8>,
    fanout: Arc<Semaphore>,
}

impl DeliveryService {
    /// Create a new delivery service with its own HTTP executor.
    ///
    /// # Errors
    ///
    /// Returns `WebhookError::Internal` if the HTTP client cannot be built.
    pub fn new(pool: PgPool, encryption_key: Vec<u8>) -> Result<Self, WebhookError> {
        Ok(Self {
            pool,
            executor: DeliveryExecutor::new()?,
            encryption_key,
            fanout: Arc::new(Semaphore::new(DEFAULT_FANOUT_CONCURRENCY)),
        })
    }

    /// Replace the executor. Tests use short backoffs.
    #[must_use]
    pub fn with_executor(mut self, executor: DeliveryExecutor) -> Self {
        self.executor = executor;
        self
    }

    /// Set the per-event fan-out concurrency limit.
    #[must_use]
    pub fn with_fanout_concurrency(mut self, concurrency: usize) -> Self {
        self.fanout = Arc::new(Semaphore::new(concurrency.max(1)));
        self
    }

    /// Deliver an event to all matching active configurations.
    ///
    /// Endpoints are delivered to concurrently, bounded by the fan-out
    /// limit, and each sequence's failures are contained to that endpoint.
    /// Never returns an error; problems are logged and the event is dropped
    /// for the affected endpoints only.
    pub async fn deliver_event(&self, event: &WebhookEvent) {
        let configurations = match WebhookConfiguration::find_active_by_event(
            &self.pool,
            event.tenant_id,
            &event.event_type,
        )
        .await
        {
            Ok(configs) => configs,
            Err(e) => {
                tracing::error!(
                    target: "webhook_delivery",
                    event_id = %event.event_id,
                    event_type = %event.event_type,
                    tenant_id = %event.tenant_id,
                    error = %e,
                    "Failed to query matching webhook configurations"
                );
                return;
            }
        };

        if configurations.is_empty() {
            tracing::debug!(
                target: "webhook_delivery",
                event_id = %event.event_id,
                event_type = %event.event_type,
                tenant_id = %event.tenant_id,
                "No active webhook configurations match event type"
            );
            return;
        }

        tracing::info!(
            target: "webhook_delivery",
            event_id = %event.event_id,
            event_type = %event.event_type,
            tenant_id = %event.tenant_id,
            configuration_count = configurations.len(),
            "Delivering event to matching webhook configurations"
        );

        let payload = WebhookPayload {
            event: event.event_type.clone(),
            timestamp: Utc::now(),
            data: event.data.clone(),
        };

        let mut tasks = JoinSet::new();
        for config in configurations {
            // The fan-out semaphore is never closed, so acquisition only
            // fails if the runtime is tearing down.
            let Ok(permit) = Arc::clone(&self.fanout).acquire_owned().await else {
                break;
            };

            let service = self.clone();
            let payload = payload.clone();
            tasks.spawn(async move {
                let _permit = permit;
                service.deliver_with_retry(&config, &payload).await;
            });
        }

        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result {
                tracing::error!(
                    target: "webhook_delivery",
                    event_id = %event.event_id,
                    error = %e,
                    "Delivery task panicked"
                );
            }
        }
    }

    /// Run a full delivery sequence against one configuration and record
    /// exactly one log row for it.
    ///
    /// The envelope is serialized once; every attempt sends identical bytes.
    /// Nothing propagates: the HTTP outcome and the log write result are
    /// both reported in the returned `DeliveryReport`.
    pub async fn deliver_with_retry(
        &self,
        config: &WebhookConfiguration,
        payload: &WebhookPayload,
    ) -> DeliveryReport {
        let secret = match crypto::decrypt_secret(&config.secret_encrypted, &self.encryption_key) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(
                    target: "webhook_delivery",
                    webhook_id = %config.id,
                    tenant_id = %config.tenant_id,
                    error = %e,
                    "Failed to decrypt webhook secret"
                );
                return self
                    .record_aborted_sequence(
                        config,
                        payload,
                        format!("Failed to decrypt webhook secret: {e}"),
                    )
                    .await;
            }
        };

        let body = match serde_json::to_vec(payload) {
            Ok(b) => b,
            Err(e) => {
                tracing::error!(
                    target: "webhook_delivery",
                    webhook_id = %config.id,
                    tenant_id = %config.tenant_id,
                    error = %e,
                    "Failed to serialize webhook payload"
                );
                return self
                    .record_aborted_sequence(
                        config,
                        payload,
                        format!("Failed to serialize payload: {e}"),
                    )
                    .await;
            }
        };

        let outcome = self
            .executor
            .run_with_retry(&config.url, &secret, &body, &payload.event)
            .await;

        if outcome.success {
            tracing::info!(
                target: "webhook_delivery",
                webhook_id = %config.id,
                tenant_id = %config.tenant_id,
                event = %payload.event,
                attempts = outcome.attempts,
                "Webhook delivery succeeded"
            );
        } else {
            tracing::warn!(
                target: "webhook_delivery",
                webhook_id = %config.id,
                tenant_id = %config.tenant_id,
                event = %payload.event,
                attempts = outcome.attempts,
                error = outcome.error.as_deref().unwrap_or("unknown"),
                "Webhook delivery failed"
            );
        }

        let log_write = self.record_sequence(config, payload, &outcome).await;
        DeliveryReport {
            delivery: outcome,
            log_write,
        }
    }

    /// Retry a logged delivery with a single attempt.
    ///
    /// Loads the log entry and its owning configuration, re-sends the
    /// stored envelope once, and updates the entry in place: attempts
    /// increments and status, error, and last_attempt_at reflect the new
    /// attempt. A failed attempt is still an `Ok` result; its outcome is
    /// carried in the response.
    ///
    /// # Errors
    ///
    /// Fails fast without sending anything if the log entry is missing, the
    /// owning configuration was deleted, or the configuration is inactive.
    /// The log entry is left untouched in those cases.
    pub async fn retry_delivery(
        &self,
        tenant_id: Uuid,
        delivery_id: Uuid,
    ) -> Result<RetryDeliveryResponse, WebhookError> {
        let log = WebhookDeliveryLog::find_by_id(&self.pool, tenant_id, delivery_id)
            .await?
            .ok_or(WebhookError::DeliveryNotFound)?;

        let config = WebhookConfiguration::find_by_id(&self.pool, tenant_id, log.webhook_id)
            .await?
            .ok_or(WebhookError::ConfigurationNotFound)?;

        if !config.active {
            return Err(WebhookError::ConfigurationInactive);
        }

        let secret = crypto::decrypt_secret(&config.secret_encrypted, &self.encryption_key)?;

        let body = serde_json::to_vec(&log.payload)
            .map_err(|e| WebhookError::Internal(format!("Failed to serialize payload: {e}")))?;

        let outcome = self
            .executor
            .execute(&config.url, &secret, &body, &log.event)
            .await;

        let status = if outcome.success {
            WebhookDeliveryStatus::Success
        } else {
            WebhookDeliveryStatus::Failed
        };

        let updated = WebhookDeliveryLog::record_attempt(
            &self.pool,
            log.id,
            status,
            log.attempts + 1,
            outcome.error.as_deref(),
        )
        .await?
        .ok_or(WebhookError::DeliveryNotFound)?;

        tracing::info!(
            target: "webhook_delivery",
            delivery_id = %log.id,
            webhook_id = %config.id,
            tenant_id = %tenant_id,
            success = outcome.success,
            attempts = updated.attempts,
            "Manual delivery retry completed"
        );

        Ok(RetryDeliveryResponse {
            success: outcome.success,
            error: outcome.error,
            delivery: Some(delivery_log_to_response(updated)),
        })
    }

    /// Record a sequence that never reached the wire.
    async fn record_aborted_sequence(
        &self,
        config: &WebhookConfiguration,
        payload: &WebhookPayload,
        error: String,
    ) -> DeliveryReport {
        let outcome = DeliveryOutcome {
            success: false,
            attempts: 0,
            error: Some(error),
        };
        let log_write = self.record_sequence(config, payload, &outcome).await;
        DeliveryReport {
            delivery: outcome,
            log_write,
        }
    }

    /// Write the single log row for a completed sequence.
    ///
    /// A failed write is logged and swallowed so it cannot disturb the
    /// delivery outcome or other endpoints.
    async fn record_sequence(
        &self,
        config: &WebhookConfiguration,
        payload: &WebhookPayload,
        outcome: &DeliveryOutcome,
    ) -> LogWriteOutcome {
        let status = if outcome.success {
            WebhookDeliveryStatus::Success
        } else {
            WebhookDeliveryStatus::Failed
        };

        let payload_json = match serde_json::to_value(payload) {
            Ok(v) => v,
            Err(e) => {
                tracing::error!(
                    target: "webhook_delivery",
                    webhook_id = %config.id,
                    tenant_id = %config.tenant_id,
                    error = %e,
                    "Failed to serialize payload for delivery log"
                );
                return LogWriteOutcome::Failed;
            }
        };

        match WebhookDeliveryLog::create(
            &self.pool,
            CreateWebhookDeliveryLog {
                webhook_id: config.id,
                tenant_id: config.tenant_id,
                event: payload.event.clone(),
                payload: payload_json,
                status,
                attempts: outcome.attempts,
                error: outcome.error.clone(),
            },
        )
        .await
        {
            Ok(log) => LogWriteOutcome::Recorded(log.id),
            Err(e) => {
                tracing::error!(
                    target: "webhook_delivery",
                    webhook_id = %config.id,
                    tenant_id = %config.tenant_id,
                    event = %payload.event,
                    error = %e,
                    "Failed to record delivery log"
                );
                LogWriteOutcome::Failed
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Response converters
// ---------------------------------------------------------------------------

/// Convert a delivery log row to its API representation.
pub(crate) fn delivery_log_to_response(log: WebhookDeliveryLog) -> WebhookDeliveryLogResponse {
    WebhookDeliveryLogResponse {
        id: log.id,
        webhook_id: log.webhook_id,
        event: log.event,
        payload: log.payload,
        status: log.status,
        attempts: log.attempts,
        error: log.error,
        last_attempt_at: log.last_attempt_at,
        created_at: log.created_at,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
