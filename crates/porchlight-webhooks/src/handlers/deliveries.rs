//! Delivery history and manual retry handlers.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use uuid::Uuid;

use crate::error::{ApiResult, WebhookError};
use crate::models::{
    ListQuery, RetryDeliveryResponse, TenantContext, WebhookDeliveryLogListResponse,
    WebhookDeliveryLogResponse,
};
use crate::router::WebhooksState;
use crate::services::delivery_service::delivery_log_to_response;
use porchlight_db::models::{WebhookConfiguration, WebhookDeliveryLog};

/// Extract the tenant identity attached by the tenant middleware.
fn extract_tenant_id(context: Option<&Extension<TenantContext>>) -> Result<Uuid, WebhookError> {
    context
        .map(|Extension(ctx)| ctx.tenant_id)
        .ok_or(WebhookError::Unauthorized)
}

// ---------------------------------------------------------------------------
// Delivery history handlers
// ---------------------------------------------------------------------------

/// List delivery log entries for a configuration.
#[utoipa::path(
    get,
    path = "/webhooks/{id}/deliveries",
    tag = "Webhooks",
    params(
        ("id" = Uuid, Path, description = "Configuration ID"),
        ListQuery,
    ),
    responses(
        (status = 200, description = "Paginated delivery list", body = WebhookDeliveryLogListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Configuration not found"),
    )
)]
pub async fn list_deliveries_handler(
    State(state): State<WebhooksState>,
    context: Option<Extension<TenantContext>>,
    Path(webhook_id): Path<Uuid>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<WebhookDeliveryLogListResponse>> {
    let tenant_id = extract_tenant_id(context.as_ref())?;

    // Verify the configuration exists and belongs to the tenant
    WebhookConfiguration::find_by_id(state.pool(), tenant_id, webhook_id)
        .await
        .map_err(WebhookError::Database)?
        .ok_or(WebhookError::ConfigurationNotFound)?;

    let limit = query.limit.clamp(1, 100);
    let offset = query.offset.max(0);

    let deliveries =
        WebhookDeliveryLog::list_by_webhook(state.pool(), tenant_id, webhook_id, limit, offset)
            .await
            .map_err(WebhookError::Database)?;

    let total = WebhookDeliveryLog::count_by_webhook(state.pool(), tenant_id, webhook_id)
        .await
        .map_err(WebhookError::Database)?;

    let items = deliveries.into_iter().map(delivery_log_to_response).collect();

    Ok(Json(WebhookDeliveryLogListResponse {
        items,
        total,
        limit,
        offset,
    }))
}

/// Get a single delivery log entry.
#[utoipa::path(
    get,
    path = "/webhooks/deliveries/{delivery_id}",
    tag = "Webhooks",
    params(
        ("delivery_id" = Uuid, Path, description = "Delivery log ID"),
    ),
    responses(
        (status = 200, description = "Delivery details", body = WebhookDeliveryLogResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Delivery not found"),
    )
)]
pub async fn get_delivery_handler(
    State(state): State<WebhooksState>,
    context: Option<Extension<TenantContext>>,
    Path(delivery_id): Path<Uuid>,
) -> ApiResult<Json<WebhookDeliveryLogResponse>> {
    let tenant_id = extract_tenant_id(context.as_ref())?;

    let delivery = WebhookDeliveryLog::find_by_id(state.pool(), tenant_id, delivery_id)
        .await
        .map_err(WebhookError::Database)?
        .ok_or(WebhookError::DeliveryNotFound)?;

    Ok(Json(delivery_log_to_response(delivery)))
}

// ---------------------------------------------------------------------------
// Manual retry handler
// ---------------------------------------------------------------------------

/// Retry a logged delivery with a single attempt.
#[utoipa::path(
    post,
    path = "/webhooks/deliveries/{delivery_id}/retry",
    tag = "Webhooks",
    params(
        ("delivery_id" = Uuid, Path, description = "Delivery log ID"),
    ),
    responses(
        (status = 200, description = "Retry outcome; preconditions that fail are reported in the body", body = RetryDeliveryResponse),
        (status = 401, description = "Unauthorized"),
    )
)]
pub async fn retry_delivery_handler(
    State(state): State<WebhooksState>,
    context: Option<Extension<TenantContext>>,
    Path(delivery_id): Path<Uuid>,
) -> ApiResult<Json<RetryDeliveryResponse>> {
    let tenant_id = extract_tenant_id(context.as_ref())?;

    match state
        .delivery_service
        .retry_delivery(tenant_id, delivery_id)
        .await
    {
        Ok(response) => Ok(Json(response)),
        // Failed preconditions come back in the response body so callers
        // can tell which one failed. The log row is untouched.
        Err(
            e @ (WebhookError::DeliveryNotFound
            | WebhookError::ConfigurationNotFound
            | WebhookError::ConfigurationInactive),
        ) => Ok(Json(RetryDeliveryResponse {
            success: false,
            error: Some(e.to_string()),
            delivery: None,
        })),
        Err(e) => Err(e),
    }
}
