//! CRUD handlers for webhook configurations.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::error::{ApiResult, WebhookError};
use crate::models::{
    CreateWebhookConfigurationRequest, EventTypeInfo, EventTypeListResponse, ListQuery,
    TenantContext, TestWebhookUrlRequest, TestWebhookUrlResponse,
    UpdateWebhookConfigurationRequest, WebhookConfigurationListResponse,
    WebhookConfigurationResponse, WebhookEventType,
};
use crate::router::WebhooksState;

/// Extract the tenant identity attached by the tenant middleware.
fn extract_tenant_id(context: Option<&Extension<TenantContext>>) -> Result<Uuid, WebhookError> {
    context
        .map(|Extension(ctx)| ctx.tenant_id)
        .ok_or(WebhookError::Unauthorized)
}

// ---------------------------------------------------------------------------
// Configuration CRUD handlers
// ---------------------------------------------------------------------------

/// Create a new webhook configuration.
#[utoipa::path(
    post,
    path = "/webhooks",
    tag = "Webhooks",
    request_body = CreateWebhookConfigurationRequest,
    responses(
        (status = 201, description = "Configuration created; the response carries the signing secret exactly once", body = WebhookConfigurationResponse),
        (status = 400, description = "Validation error or endpoint rejected the test delivery"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Configuration limit exceeded"),
    )
)]
pub async fn create_webhook_handler(
    State(state): State<WebhooksState>,
    context: Option<Extension<TenantContext>>,
    Json(request): Json<CreateWebhookConfigurationRequest>,
) -> ApiResult<(StatusCode, Json<WebhookConfigurationResponse>)> {
    let tenant_id = extract_tenant_id(context.as_ref())?;

    request
        .validate()
        .map_err(|e| WebhookError::Validation(e.to_string()))?;

    let response = state
        .configuration_service
        .create_configuration(tenant_id, request)
        .await?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// List webhook configurations.
#[utoipa::path(
    get,
    path = "/webhooks",
    tag = "Webhooks",
    params(ListQuery),
    responses(
        (status = 200, description = "Paginated configuration list", body = WebhookConfigurationListResponse),
        (status = 401, description = "Unauthorized"),
    )
)]
pub async fn list_webhooks_handler(
    State(state): State<WebhooksState>,
    context: Option<Extension<TenantContext>>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<WebhookConfigurationListResponse>> {
    let tenant_id = extract_tenant_id(context.as_ref())?;

    let response = state
        .configuration_service
        .list_configurations(tenant_id, query)
        .await?;

    Ok(Json(response))
}

/// Get a single webhook configuration.
#[utoipa::path(
    get,
    path = "/webhooks/{id}",
    tag = "Webhooks",
    params(
        ("id" = Uuid, Path, description = "Configuration ID")
    ),
    responses(
        (status = 200, description = "Configuration details", body = WebhookConfigurationResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Configuration not found"),
    )
)]
pub async fn get_webhook_handler(
    State(state): State<WebhooksState>,
    context: Option<Extension<TenantContext>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<WebhookConfigurationResponse>> {
    let tenant_id = extract_tenant_id(context.as_ref())?;

    let response = state
        .configuration_service
        .get_configuration(tenant_id, id)
        .await?;

    Ok(Json(response))
}

/// Update a webhook configuration.
#[utoipa::path(
    patch,
    path = "/webhooks/{id}",
    tag = "Webhooks",
    params(
        ("id" = Uuid, Path, description = "Configuration ID")
    ),
    request_body = UpdateWebhookConfigurationRequest,
    responses(
        (status = 200, description = "Configuration updated", body = WebhookConfigurationResponse),
        (status = 400, description = "Validation error or endpoint rejected the test delivery"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Configuration not found"),
    )
)]
pub async fn update_webhook_handler(
    State(state): State<WebhooksState>,
    context: Option<Extension<TenantContext>>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateWebhookConfigurationRequest>,
) -> ApiResult<Json<WebhookConfigurationResponse>> {
    let tenant_id = extract_tenant_id(context.as_ref())?;

    request
        .validate()
        .map_err(|e| WebhookError::Validation(e.to_string()))?;

    let response = state
        .configuration_service
        .update_configuration(tenant_id, id, request)
        .await?;

    Ok(Json(response))
}

/// Delete a webhook configuration.
#[utoipa::path(
    delete,
    path = "/webhooks/{id}",
    tag = "Webhooks",
    params(
        ("id" = Uuid, Path, description = "Configuration ID")
    ),
    responses(
        (status = 204, description = "Configuration deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Configuration not found"),
    )
)]
pub async fn delete_webhook_handler(
    State(state): State<WebhooksState>,
    context: Option<Extension<TenantContext>>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let tenant_id = extract_tenant_id(context.as_ref())?;

    state
        .configuration_service
        .delete_configuration(tenant_id, id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// URL test handler
// ---------------------------------------------------------------------------

/// Probe a webhook URL without creating a configuration.
///
/// A reachable endpoint that rejects the probe is a 200 response with
/// `success: false`; only invalid URLs are HTTP errors.
#[utoipa::path(
    post,
    path = "/webhooks/test",
    tag = "Webhooks",
    request_body = TestWebhookUrlRequest,
    responses(
        (status = 200, description = "Probe outcome", body = TestWebhookUrlResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
    )
)]
pub async fn test_webhook_url_handler(
    State(state): State<WebhooksState>,
    context: Option<Extension<TenantContext>>,
    Json(request): Json<TestWebhookUrlRequest>,
) -> ApiResult<Json<TestWebhookUrlResponse>> {
    extract_tenant_id(context.as_ref())?;

    request
        .validate()
        .map_err(|e| WebhookError::Validation(e.to_string()))?;

    let response = state.configuration_service.test_url(&request.url).await?;

    Ok(Json(response))
}

// ---------------------------------------------------------------------------
// Event types handler
// ---------------------------------------------------------------------------

/// List all supported webhook event types.
#[utoipa::path(
    get,
    path = "/webhooks/event-types",
    tag = "Webhooks",
    responses(
        (status = 200, description = "List of event types", body = EventTypeListResponse),
        (status = 401, description = "Unauthorized"),
    )
)]
pub async fn list_event_types_handler(
    context: Option<Extension<TenantContext>>,
) -> ApiResult<Json<EventTypeListResponse>> {
    extract_tenant_id(context.as_ref())?;

    let event_types = WebhookEventType::all()
        .iter()
        .map(|et| EventTypeInfo {
            event_type: et.as_str().to_string(),
            category: et.category().to_string(),
            description: et.description().to_string(),
        })
        .collect();

    Ok(Json(EventTypeListResponse { event_types }))
}
