//! HTTP execution engine for webhook deliveries.
//!
//! Owns the outbound HTTP client and implements single delivery attempts,
//! the connectivity probe, and the bounded retry loop. Holds no database
//! state; persistence lives in the delivery service.

use std::time::Duration;

use chrono::Utc;
use reqwest::Client;

use crate::crypto;
use crate::error::WebhookError;
use crate::models::{WebhookPayload, WEBHOOK_TEST_EVENT};

/// Default maximum attempts per delivery sequence (initial + 2 retries).
pub const DEFAULT_MAX_RETRIES: i32 = 3;

/// Base delay for exponential backoff between attempts.
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_secs(1);

/// Request timeout for delivery attempts.
const DELIVERY_TIMEOUT_SECS: u64 = 10;

/// Request timeout for connectivity probes.
const PROBE_TIMEOUT_SECS: u64 = 5;

/// Outcome of a single HTTP attempt.
#[derive(Debug, Clone)]
pub struct AttemptOutcome {
    /// Whether the endpoint accepted the request.
    pub success: bool,
    /// HTTP status code, when a response was received.
    pub status: Option<u16>,
    /// Failure description, when the attempt did not succeed.
    pub error: Option<String>,
}

/// Final outcome of a retry sequence.
#[derive(Debug, Clone)]
pub struct DeliveryOutcome {
    /// Whether any attempt succeeded.
    pub success: bool,
    /// Number of attempts made.
    pub attempts: i32,
    /// Error from the last attempt, absent on success.
    pub error: Option<String>,
}

/// HTTP execution engine shared by event dispatch, manual retry, and probes.
#[derive(Clone)]
pub struct DeliveryExecutor {
    http_client: Client,
    max_retries: i32,
    backoff_base: Duration,
    delivery_timeout: Duration,
}

impl DeliveryExecutor {
    /// Create a new executor with a shared HTTP client.
    ///
    /// The client never follows redirects; a redirect status is reported
    /// back as the attempt's result. Timeouts are applied per request.
    ///
    /// # Errors
    ///
    /// Returns `WebhookError::Internal` if the HTTP client cannot be built.
    pub fn new() -> Result<Self, WebhookError> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(DELIVERY_TIMEOUT_SECS))
            .user_agent("Porchlight-Webhook/1.0")
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| WebhookError::Internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base: DEFAULT_BACKOFF_BASE,
            delivery_timeout: Duration::from_secs(DELIVERY_TIMEOUT_SECS),
        })
    }

    /// Set the maximum attempts per delivery sequence.
    #[must_use]
    pub fn with_max_retries(mut self, max: i32) -> Self {
        self.max_retries = max;
        self
    }

    /// Set the base backoff delay. Tests use a short base.
    #[must_use]
    pub fn with_backoff_base(mut self, base: Duration) -> Self {
        self.backoff_base = base;
        self
    }

    /// Set the delivery attempt timeout. Tests use a short timeout; the
    /// reported wording follows whole seconds.
    #[must_use]
    pub fn with_delivery_timeout(mut self, timeout: Duration) -> Self {
        self.delivery_timeout = timeout;
        self
    }

    /// Maximum attempts per delivery sequence.
    #[must_use]
    pub fn max_retries(&self) -> i32 {
        self.max_retries
    }

    /// Probe an endpoint with a synthetic test event.
    ///
    /// The probe is unsigned and marked with `X-Webhook-Test: true` so
    /// receivers can recognize and discard it. Uses a shorter timeout than
    /// real deliveries.
    pub async fn probe(&self, url: &str) -> AttemptOutcome {
        let payload = WebhookPayload {
            event: WEBHOOK_TEST_EVENT.to_string(),
            timestamp: Utc::now(),
            data: serde_json::json!({
                "message": "This is a test webhook from Porchlight"
            }),
        };

        let mut headers = reqwest::header::HeaderMap::new();
        if let Ok(v) = "true".parse() {
            headers.insert("X-Webhook-Test", v);
        }

        let result = self
            .http_client
            .post(url)
            .timeout(Duration::from_secs(PROBE_TIMEOUT_SECS))
            .headers(headers)
            .json(&payload)
            .send()
            .await;

        outcome_from_result(result, PROBE_TIMEOUT_SECS)
    }

    /// Execute a single delivery attempt.
    ///
    /// Signs the exact body bytes with HMAC-SHA256 and POSTs them to the
    /// endpoint. The caller serializes the envelope once per sequence so
    /// every attempt sends identical bytes.
    pub async fn execute(&self, url: &str, secret: &str, body: &[u8], event: &str) -> AttemptOutcome {
        let signature = crypto::compute_signature(secret, body);

        // Header values here are constants, hex, or validated event names,
        // so parse failures do not occur.
        let mut headers = reqwest::header::HeaderMap::new();
        if let Ok(v) = "application/json".parse() {
            headers.insert("Content-Type", v);
        }
        if let Ok(v) = signature.parse() {
            headers.insert("X-Webhook-Signature", v);
        }
        if let Ok(v) = event.parse() {
            headers.insert("X-Webhook-Event", v);
        }

        let result = self
            .http_client
            .post(url)
            .timeout(self.delivery_timeout)
            .headers(headers)
            .body(body.to_vec())
            .send()
            .await;

        outcome_from_result(result, self.delivery_timeout.as_secs())
    }

    /// Run a full delivery sequence against an endpoint.
    ///
    /// Attempts up to `max_retries` times, sleeping `base * 2^(n-1)` after
    /// the nth failed attempt. No delay follows the final attempt. Returns
    /// the aggregate outcome; the error reflects the last attempt and is
    /// absent when any attempt succeeded.
    pub async fn run_with_retry(
        &self,
        url: &str,
        secret: &str,
        body: &[u8],
        event: &str,
    ) -> DeliveryOutcome {
        let mut attempts = 0;
        let mut success = false;
        let mut last_error = None;

        while attempts < self.max_retries && !success {
            attempts += 1;
            let outcome = self.execute(url, secret, body, event).await;
            success = outcome.success;
            last_error = outcome.error;

            if !success && attempts < self.max_retries {
                tokio::time::sleep(backoff_delay(self.backoff_base, attempts)).await;
            }
        }

        DeliveryOutcome {
            success,
            attempts,
            error: last_error,
        }
    }
}

/// Delay before the attempt following `completed_attempts` failures.
///
/// Doubles from the base: 1s after the first failure, 2s after the second.
#[must_use]
pub fn backoff_delay(base: Duration, completed_attempts: i32) -> Duration {
    let exp = completed_attempts.saturating_sub(1).max(0) as u32;
    base * 2u32.saturating_pow(exp)
}

/// Whether an HTTP status counts as a successful delivery.
///
/// Any status below 400 is accepted, including redirects, which are
/// reported as success without being followed.
#[must_use]
pub fn is_success_status(status: u16) -> bool {
    (200..400).contains(&status)
}

fn outcome_from_result(
    result: Result<reqwest::Response, reqwest::Error>,
    timeout_secs: u64,
) -> AttemptOutcome {
    match result {
        Ok(response) => {
            let status = response.status().as_u16();
            if is_success_status(status) {
                AttemptOutcome {
                    success: true,
                    status: Some(status),
                    error: None,
                }
            } else {
                AttemptOutcome {
                    success: false,
                    status: Some(status),
                    error: Some(format!("Endpoint returned status {status}")),
                }
            }
        }
        Err(e) => {
            let error_msg = if e.is_timeout() {
                format!("Request timed out after {timeout_secs} seconds")
            } else if e.is_connect() {
                format!("Connection failed: {e}")
            } else {
                format!("Request error: {e}")
            };

            AttemptOutcome {
                success: false,
                status: None,
                error: Some(error_msg),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
