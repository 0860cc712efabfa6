//! Axum router setup for webhook endpoints.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use sqlx::PgPool;

use crate::error::WebhookError;
use crate::handlers::{configurations, deliveries};
use crate::services::configuration_service::ConfigurationService;
use crate::services::delivery_service::DeliveryService;

/// Shared state for webhook handlers.
#[derive(Clone)]
pub struct WebhooksState {
    pub configuration_service: Arc<ConfigurationService>,
    /// Shared with the background worker, which runs the same delivery
    /// sequences for published events.
    pub delivery_service: Arc<DeliveryService>,
    pool: PgPool,
}

impl WebhooksState {
    /// Create a new webhooks state.
    ///
    /// # Errors
    ///
    /// Returns `WebhookError::Internal` if an HTTP client cannot be built.
    pub fn new(
        pool: PgPool,
        encryption_key: Vec<u8>,
        allow_http: bool,
    ) -> Result<Self, WebhookError> {
        Ok(Self {
            configuration_service: Arc::new(
                ConfigurationService::new(pool.clone(), encryption_key.clone())?
                    .with_allow_http(allow_http),
            ),
            delivery_service: Arc::new(DeliveryService::new(pool.clone(), encryption_key)?),
            pool,
        })
    }

    /// Get a reference to the database pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Creates the webhook router with all routes.
pub fn webhooks_router(state: WebhooksState) -> Router {
    Router::new()
        // Configuration CRUD
        .route(
            "/webhooks",
            post(configurations::create_webhook_handler)
                .get(configurations::list_webhooks_handler),
        )
        .route(
            "/webhooks/:id",
            get(configurations::get_webhook_handler)
                .patch(configurations::update_webhook_handler)
                .delete(configurations::delete_webhook_handler),
        )
        // URL connectivity test
        .route(
            "/webhooks/test",
            post(configurations::test_webhook_url_handler),
        )
        // Event types
        .route(
            "/webhooks/event-types",
            get(configurations::list_event_types_handler),
        )
        // Delivery history and manual retry
        .route(
            "/webhooks/:id/deliveries",
            get(deliveries::list_deliveries_handler),
        )
        .route(
            "/webhooks/deliveries/:delivery_id",
            get(deliveries::get_delivery_handler),
        )
        .route(
            "/webhooks/deliveries/:delivery_id/retry",
            post(deliveries::retry_delivery_handler),
        )
        .with_state(state)
}
