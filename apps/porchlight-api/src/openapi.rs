//! OpenAPI documentation and Swagger UI configuration.

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// OpenAPI documentation for the Porchlight API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Porchlight API",
        version = "0.1.0",
        description = "Open house management API. Covers webhook subscriptions and signed event delivery to external systems.",
        contact(name = "Porchlight Team")
    ),
    servers(
        (url = "http://localhost:8080", description = "Development server")
    ),
    tags(
        (name = "Health", description = "Service health and status"),
        (name = "Webhooks", description = "Webhook configuration, delivery history, and manual retry")
    ),
    paths(
        crate::health::health_handler,
        porchlight_webhooks::handlers::configurations::create_webhook_handler,
        porchlight_webhooks::handlers::configurations::list_webhooks_handler,
        porchlight_webhooks::handlers::configurations::get_webhook_handler,
        porchlight_webhooks::handlers::configurations::update_webhook_handler,
        porchlight_webhooks::handlers::configurations::delete_webhook_handler,
        porchlight_webhooks::handlers::configurations::test_webhook_url_handler,
        porchlight_webhooks::handlers::configurations::list_event_types_handler,
        porchlight_webhooks::handlers::deliveries::list_deliveries_handler,
        porchlight_webhooks::handlers::deliveries::get_delivery_handler,
        porchlight_webhooks::handlers::deliveries::retry_delivery_handler,
    ),
    components(schemas(
        crate::health::HealthResponse,
        porchlight_webhooks::error::ErrorResponse,
        porchlight_webhooks::models::CreateWebhookConfigurationRequest,
        porchlight_webhooks::models::UpdateWebhookConfigurationRequest,
        porchlight_webhooks::models::TestWebhookUrlRequest,
        porchlight_webhooks::models::TestWebhookUrlResponse,
        porchlight_webhooks::models::WebhookConfigurationResponse,
        porchlight_webhooks::models::WebhookConfigurationListResponse,
        porchlight_webhooks::models::WebhookDeliveryLogResponse,
        porchlight_webhooks::models::WebhookDeliveryLogListResponse,
        porchlight_webhooks::models::RetryDeliveryResponse,
        porchlight_webhooks::models::EventTypeInfo,
        porchlight_webhooks::models::EventTypeListResponse,
    ))
)]
pub struct ApiDoc;

/// Swagger UI routes serving the generated documentation.
pub fn swagger_routes() -> Router {
    Router::new().merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
}
