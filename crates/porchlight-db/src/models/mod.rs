//! Database entity models for porchlight-db.
//!
//! These models represent the database tables and provide
//! type-safe interactions with PostgreSQL.

pub mod webhook_configuration;
pub mod webhook_delivery_log;

pub use webhook_configuration::{
    CreateWebhookConfiguration, UpdateWebhookConfiguration, WebhookConfiguration,
};
pub use webhook_delivery_log::{
    CreateWebhookDeliveryLog, WebhookDeliveryLog, WebhookDeliveryStatus,
};
