//! Request middleware for the Porchlight API.

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use porchlight_webhooks::TenantContext;
use uuid::Uuid;

/// Header carrying the authenticated tenant id.
///
/// The platform gateway terminates authentication and forwards the
/// resolved tenant here. Requests arriving without it are treated as
/// unauthenticated.
pub const TENANT_HEADER: &str = "x-tenant-id";

/// Attach a [`TenantContext`] to requests carrying a valid tenant header.
///
/// A missing or malformed header leaves the request without a context,
/// which tenant-scoped handlers answer with 401.
pub async fn tenant_context_middleware(mut request: Request, next: Next) -> Response {
    match request
        .headers()
        .get(TENANT_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(Uuid::parse_str)
    {
        Some(Ok(tenant_id)) => {
            request.extensions_mut().insert(TenantContext { tenant_id });
        }
        Some(Err(_)) => {
            tracing::warn!(target: "security", "Malformed tenant id header, treating request as unauthenticated");
        }
        None => {}
    }

    next.run(request).await
}
