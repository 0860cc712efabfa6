//! Webhook delivery system for open house lifecycle event subscriptions.
//!
//! Provides tenant-scoped webhook configuration management with endpoint
//! connectivity probes, async delivery with HMAC-SHA256 signing, exponential
//! backoff retries, per-sequence delivery logs, and manual retry.

pub mod crypto;
pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;
pub mod validation;
pub mod worker;

pub use error::WebhookError;
pub use models::{TenantContext, WebhookEventType};
pub use router::{webhooks_router, WebhooksState};
pub use services::event_publisher::{EventPublisher, WebhookEvent};
pub use worker::WebhookWorker;
