//! Data types for the webhook configuration and delivery APIs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Event name used by the connectivity probe.
///
/// Not a subscribable event type. Probe requests carry this name so
/// receivers can recognize and discard them.
pub const WEBHOOK_TEST_EVENT: &str = "webhook.test";

/// Event types that webhook configurations can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookEventType {
    /// A visitor checked in at an open house.
    VisitorCheckedIn,
    /// An open house session started.
    SessionStarted,
    /// An open house session ended.
    SessionEnded,
    /// A follow-up message was sent to a visitor.
    FollowUpSent,
}

impl WebhookEventType {
    /// The wire name of this event type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VisitorCheckedIn => "visitor.checked_in",
            Self::SessionStarted => "session.started",
            Self::SessionEnded => "session.ended",
            Self::FollowUpSent => "follow_up.sent",
        }
    }

    /// Parse a wire name into an event type. Returns `None` for unknown names.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "visitor.checked_in" => Some(Self::VisitorCheckedIn),
            "session.started" => Some(Self::SessionStarted),
            "session.ended" => Some(Self::SessionEnded),
            "follow_up.sent" => Some(Self::FollowUpSent),
            _ => None,
        }
    }

    /// All known event types.
    #[must_use]
    pub fn all() -> &'static [Self] {
        &[
            Self::VisitorCheckedIn,
            Self::SessionStarted,
            Self::SessionEnded,
            Self::FollowUpSent,
        ]
    }

    /// Grouping used by the event type listing endpoint.
    #[must_use]
    pub fn category(&self) -> &'static str {
        match self {
            Self::VisitorCheckedIn => "visitor",
            Self::SessionStarted | Self::SessionEnded => "session",
            Self::FollowUpSent => "follow_up",
        }
    }

    /// Human-readable description.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::VisitorCheckedIn => "A visitor checked in at an open house",
            Self::SessionStarted => "An open house session started",
            Self::SessionEnded => "An open house session ended",
            Self::FollowUpSent => "A follow-up message was sent to a visitor",
        }
    }
}

impl std::fmt::Display for WebhookEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Wire envelope sent to webhook endpoints.
///
/// Serialized once per delivery sequence; the signature covers the exact
/// serialized bytes. The timestamp records when the envelope was built and
/// is informational only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookPayload {
    /// Event type name.
    pub event: String,
    /// When the envelope was built.
    pub timestamp: DateTime<Utc>,
    /// Event-specific payload.
    pub data: serde_json::Value,
}

/// Tenant identity attached to authenticated requests.
#[derive(Debug, Clone, Copy)]
pub struct TenantContext {
    pub tenant_id: Uuid,
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request body for creating a webhook configuration.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateWebhookConfigurationRequest {
    /// Destination URL for deliveries.
    #[validate(length(min = 1, max = 2048))]
    pub url: String,
    /// Event types to subscribe to.
    #[validate(length(min = 1, message = "At least one event type is required"))]
    pub events: Vec<String>,
}

/// Request body for updating a webhook configuration.
///
/// Absent fields are left unchanged. The signing secret is immutable.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateWebhookConfigurationRequest {
    /// New destination URL.
    #[validate(length(min = 1, max = 2048))]
    pub url: Option<String>,
    /// Replacement event type list.
    #[validate(length(min = 1, message = "At least one event type is required"))]
    pub events: Option<Vec<String>>,
    /// Enable or disable deliveries.
    pub active: Option<bool>,
}

/// Request body for testing endpoint connectivity.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct TestWebhookUrlRequest {
    /// URL to probe.
    #[validate(length(min = 1, max = 2048))]
    pub url: String,
}

/// Query parameters for list endpoints.
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListQuery {
    /// Maximum number of items to return (1-100).
    #[serde(default = "default_limit")]
    pub limit: i64,
    /// Number of items to skip.
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    20
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// Webhook configuration as returned to API clients.
#[derive(Debug, Serialize, ToSchema)]
pub struct WebhookConfigurationResponse {
    /// Configuration ID.
    pub id: Uuid,
    /// Destination URL.
    pub url: String,
    /// Subscribed event types.
    pub events: Vec<String>,
    /// Whether deliveries are enabled.
    pub active: bool,
    /// Plaintext signing secret. Present only in the creation response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

/// Paginated list of webhook configurations.
#[derive(Debug, Serialize, ToSchema)]
pub struct WebhookConfigurationListResponse {
    pub items: Vec<WebhookConfigurationResponse>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Delivery log entry as returned to API clients.
#[derive(Debug, Serialize, ToSchema)]
pub struct WebhookDeliveryLogResponse {
    /// Log entry ID.
    pub id: Uuid,
    /// Configuration the delivery targeted.
    pub webhook_id: Uuid,
    /// Event type delivered.
    pub event: String,
    /// Envelope that was sent.
    pub payload: serde_json::Value,
    /// Final status: "success" or "failed".
    pub status: String,
    /// Attempts made so far, including manual retries.
    pub attempts: i32,
    /// Error from the most recent failed attempt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Time of the most recent attempt.
    pub last_attempt_at: DateTime<Utc>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// Paginated list of delivery log entries.
#[derive(Debug, Serialize, ToSchema)]
pub struct WebhookDeliveryLogListResponse {
    pub items: Vec<WebhookDeliveryLogResponse>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Outcome of a connectivity probe.
#[derive(Debug, Serialize, ToSchema)]
pub struct TestWebhookUrlResponse {
    /// Whether the endpoint accepted the probe.
    pub success: bool,
    /// Failure description when the probe did not succeed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of a manual delivery retry.
#[derive(Debug, Serialize, ToSchema)]
pub struct RetryDeliveryResponse {
    /// Whether the retry attempt succeeded.
    pub success: bool,
    /// Failure description when the retry did not succeed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Updated delivery log entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery: Option<WebhookDeliveryLogResponse>,
}

/// Metadata for one subscribable event type.
#[derive(Debug, Serialize, ToSchema)]
pub struct EventTypeInfo {
    /// Wire name, e.g. "visitor.checked_in".
    pub event_type: String,
    /// Grouping, e.g. "session".
    pub category: String,
    /// Human-readable description.
    pub description: String,
}

/// List of subscribable event types.
#[derive(Debug, Serialize, ToSchema)]
pub struct EventTypeListResponse {
    pub event_types: Vec<EventTypeInfo>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
