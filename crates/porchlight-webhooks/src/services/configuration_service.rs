//! Webhook configuration CRUD service.
//!
//! Provides business logic for creating, listing, updating, and deleting
//! webhook configurations with URL validation, SSRF protection,
//! connectivity probes, secret generation and encryption, and per-tenant
//! limits.

use sqlx::PgPool;
use uuid::Uuid;

use crate::crypto;
use crate::error::WebhookError;
use crate::models::{
    CreateWebhookConfigurationRequest, ListQuery, TestWebhookUrlResponse,
    UpdateWebhookConfigurationRequest, WebhookConfigurationListResponse,
    WebhookConfigurationResponse,
};
use crate::services::executor::{AttemptOutcome, DeliveryExecutor};
use crate::validation;
use porchlight_db::models::{
    CreateWebhookConfiguration, UpdateWebhookConfiguration, WebhookConfiguration,
};

/// Default maximum configurations per tenant.
pub const DEFAULT_MAX_CONFIGURATIONS: i64 = 25;

/// Service for webhook configuration operations.
#[derive(Clone)]
pub struct ConfigurationService {
    pool: PgPool,
    executor: DeliveryExecutor,
    encryption_key: Vec<u8>,
    max_configurations: i64,
    allow_http: bool,
}

impl ConfigurationService {
    /// Create a new configuration service with its own probe executor.
    ///
    /// # Errors
    ///
    /// Returns `WebhookError::Internal` if the HTTP client cannot be built.
    pub fn new(pool: PgPool, encryption_key: Vec<u8>) -> Result<Self, WebhookError> {
        Ok(Self {
            pool,
            executor: DeliveryExecutor::new()?,
            encryption_key,
            max_configurations: DEFAULT_MAX_CONFIGURATIONS,
            allow_http: false,
        })
    }

    /// Set the maximum configurations per tenant.
    #[must_use]
    pub fn with_max_configurations(mut self, max: i64) -> Self {
        self.max_configurations = max;
        self
    }

    /// Allow HTTP URLs and local hosts (for development/testing).
    #[must_use]
    pub fn with_allow_http(mut self, allow: bool) -> Self {
        self.allow_http = allow;
        self
    }

    /// Replace the probe executor.
    #[must_use]
    pub fn with_executor(mut self, executor: DeliveryExecutor) -> Self {
        self.executor = executor;
        self
    }

    /// Create a new webhook configuration.
    ///
    /// The endpoint must accept a connectivity probe before anything is
    /// stored. The generated signing secret is returned in plaintext exactly
    /// once, in this response.
    pub async fn create_configuration(
        &self,
        tenant_id: Uuid,
        request: CreateWebhookConfigurationRequest,
    ) -> Result<WebhookConfigurationResponse, WebhookError> {
        // Validate URL and SSRF
        validation::validate_webhook_url(&request.url, self.allow_http)?;

        // Validate event types
        validation::validate_event_types(&request.events)?;

        // Check configuration limit
        let count = WebhookConfiguration::count_by_tenant(&self.pool, tenant_id).await?;
        if count >= self.max_configurations {
            return Err(WebhookError::ConfigurationLimitExceeded {
                limit: self.max_configurations,
            });
        }

        // Probe before storing anything
        let probe = self.executor.probe(&request.url).await;
        if !probe.success {
            return Err(probe_failure(probe));
        }

        let secret = crypto::generate_webhook_secret();
        let secret_encrypted = crypto::encrypt_secret(&secret, &self.encryption_key)?;

        let input = CreateWebhookConfiguration {
            tenant_id,
            url: request.url,
            events: request.events,
            active: true,
            secret_encrypted,
        };

        let config = WebhookConfiguration::create(&self.pool, input).await?;

        let mut response = configuration_to_response(config);
        response.secret = Some(secret);
        Ok(response)
    }

    /// List webhook configurations for a tenant with pagination.
    pub async fn list_configurations(
        &self,
        tenant_id: Uuid,
        query: ListQuery,
    ) -> Result<WebhookConfigurationListResponse, WebhookError> {
        let limit = query.limit.clamp(1, 100);
        let offset = query.offset.max(0);

        let configs =
            WebhookConfiguration::list_by_tenant(&self.pool, tenant_id, limit, offset).await?;
        let total = WebhookConfiguration::count_by_tenant(&self.pool, tenant_id).await?;

        Ok(WebhookConfigurationListResponse {
            items: configs.into_iter().map(configuration_to_response).collect(),
            total,
            limit,
            offset,
        })
    }

    /// Get a single webhook configuration.
    pub async fn get_configuration(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<WebhookConfigurationResponse, WebhookError> {
        let config = WebhookConfiguration::find_by_id(&self.pool, tenant_id, id)
            .await?
            .ok_or(WebhookError::ConfigurationNotFound)?;

        Ok(configuration_to_response(config))
    }

    /// Update a webhook configuration.
    ///
    /// A changed URL must accept a connectivity probe before the update is
    /// stored. Event types and active state change without a probe.
    pub async fn update_configuration(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        request: UpdateWebhookConfigurationRequest,
    ) -> Result<WebhookConfigurationResponse, WebhookError> {
        // Validate URL if provided
        if let Some(ref url) = request.url {
            validation::validate_webhook_url(url, self.allow_http)?;
        }

        // Validate event types if provided
        if let Some(ref events) = request.events {
            validation::validate_event_types(events)?;
        }

        let existing = WebhookConfiguration::find_by_id(&self.pool, tenant_id, id)
            .await?
            .ok_or(WebhookError::ConfigurationNotFound)?;

        // Probe only when the URL actually changes
        if let Some(ref url) = request.url {
            if *url != existing.url {
                let probe = self.executor.probe(url).await;
                if !probe.success {
                    return Err(probe_failure(probe));
                }
            }
        }

        let input = UpdateWebhookConfiguration {
            url: request.url,
            events: request.events,
            active: request.active,
        };

        let config = WebhookConfiguration::update(&self.pool, tenant_id, id, input)
            .await?
            .ok_or(WebhookError::ConfigurationNotFound)?;

        Ok(configuration_to_response(config))
    }

    /// Delete a webhook configuration.
    ///
    /// Delivery logs referencing the configuration are kept.
    pub async fn delete_configuration(&self, tenant_id: Uuid, id: Uuid) -> Result<(), WebhookError> {
        let deleted = WebhookConfiguration::delete(&self.pool, tenant_id, id).await?;
        if !deleted {
            return Err(WebhookError::ConfigurationNotFound);
        }
        Ok(())
    }

    /// Probe an arbitrary URL without storing anything.
    ///
    /// URL validation failures are errors; a reachable-but-unhappy endpoint
    /// is a successful call with `success: false`.
    pub async fn test_url(&self, url: &str) -> Result<TestWebhookUrlResponse, WebhookError> {
        validation::validate_webhook_url(url, self.allow_http)?;

        let probe = self.executor.probe(url).await;
        Ok(TestWebhookUrlResponse {
            success: probe.success,
            error: probe.error,
        })
    }
}

/// Convert a DB model to an API response.
///
/// The stored secret never leaves the service; the creation path fills in
/// the plaintext separately.
fn configuration_to_response(config: WebhookConfiguration) -> WebhookConfigurationResponse {
    WebhookConfigurationResponse {
        id: config.id,
        url: config.url,
        events: config.events,
        active: config.active,
        secret: None,
        created_at: config.created_at,
        updated_at: config.updated_at,
    }
}

fn probe_failure(probe: AttemptOutcome) -> WebhookError {
    WebhookError::ProbeFailed(
        probe
            .error
            .unwrap_or_else(|| "Endpoint did not accept the probe".to_string()),
    )
}
