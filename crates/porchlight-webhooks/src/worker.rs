//! Background worker that drains the event channel into deliveries.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::services::delivery_service::DeliveryService;
use crate::services::event_publisher::WebhookEvent;

/// Background worker that consumes published events and delivers them.
pub struct WebhookWorker {
    delivery_service: Arc<DeliveryService>,
    receiver: broadcast::Receiver<WebhookEvent>,
    shutdown: CancellationToken,
}

impl WebhookWorker {
    /// Create a new worker.
    #[must_use]
    pub fn new(
        delivery_service: Arc<DeliveryService>,
        receiver: broadcast::Receiver<WebhookEvent>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            delivery_service,
            receiver,
            shutdown,
        }
    }

    /// Run until the channel closes or shutdown is requested.
    ///
    /// Events are processed one at a time; fan-out across endpoints within
    /// an event is concurrent. An event whose deliveries are in flight
    /// finishes before shutdown completes.
    pub async fn run(mut self) {
        tracing::info!(target: "webhook_delivery", "Webhook delivery worker started");

        loop {
            tokio::select! {
                () = self.shutdown.cancelled() => {
                    tracing::info!(
                        target: "webhook_delivery",
                        "Webhook delivery worker shutting down"
                    );
                    break;
                }
                result = self.receiver.recv() => match result {
                    Ok(event) => {
                        self.delivery_service.deliver_event(&event).await;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(
                            target: "webhook_delivery",
                            skipped,
                            "Event channel lagged; events were dropped"
                        );
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::info!(
                            target: "webhook_delivery",
                            "Event channel closed; worker stopping"
                        );
                        break;
                    }
                },
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::event_publisher::EventPublisher;
    use sqlx::postgres::PgPoolOptions;
    use std::time::Duration;

    // A pool pointing at an unroutable address. Connections are established
    // lazily, so constructing it never touches the network.
    fn lazy_service() -> Arc<DeliveryService> {
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(200))
            .connect_lazy("postgres://127.0.0.1:1/porchlight")
            .unwrap();
        Arc::new(DeliveryService::new(pool, vec![0u8; 32]).unwrap())
    }

    #[tokio::test]
    async fn test_worker_stops_on_cancellation() {
        let (publisher, receiver) = EventPublisher::new(16);
        let token = CancellationToken::new();
        let worker = WebhookWorker::new(lazy_service(), receiver, token.clone());
        let handle = tokio::spawn(worker.run());

        token.cancel();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("worker did not stop after cancellation")
            .unwrap();
        drop(publisher);
    }

    #[tokio::test]
    async fn test_worker_stops_when_channel_closes() {
        let (publisher, receiver) = EventPublisher::new(16);
        let token = CancellationToken::new();
        let worker = WebhookWorker::new(lazy_service(), receiver, token);
        let handle = tokio::spawn(worker.run());

        drop(publisher);
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("worker did not stop after channel close")
            .unwrap();
    }

    #[tokio::test]
    async fn test_worker_survives_query_failure() {
        let (publisher, receiver) = EventPublisher::new(16);
        let token = CancellationToken::new();
        let worker = WebhookWorker::new(lazy_service(), receiver, token.clone());
        let handle = tokio::spawn(worker.run());

        // The configuration query fails against the unroutable pool; the
        // worker must log the error and keep running.
        publisher.publish(WebhookEvent::new(
            uuid::Uuid::new_v4(),
            "visitor.checked_in",
            serde_json::json!({}),
        ));

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(!handle.is_finished());

        token.cancel();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("worker did not stop after cancellation")
            .unwrap();
    }
}
