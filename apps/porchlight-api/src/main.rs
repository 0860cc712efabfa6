//! Porchlight API server.
//!
//! Serves the webhook management API and runs the background delivery
//! worker that fans open house lifecycle events out to subscribers.

mod config;
mod health;
mod logging;
mod middleware;
mod openapi;

use std::net::SocketAddr;

use axum::{routing::get, Extension, Router};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::info;

use config::Config;
use porchlight_webhooks::{webhooks_router, EventPublisher, WebhookWorker, WebhooksState};

/// Lifecycle events buffered for the delivery worker.
const EVENT_CHANNEL_CAPACITY: usize = 1024;

#[tokio::main]
async fn main() {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    logging::init_logging(&config.rust_log);
    health::mark_started();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        host = %config.host,
        port = config.port,
        env = %config.app_env,
        "Starting Porchlight API"
    );

    match config.validate_security_config() {
        Ok(warnings) => {
            for warning in &warnings {
                tracing::warn!(target: "security", "{}", warning);
            }
            if !warnings.is_empty() {
                tracing::warn!(
                    target: "security",
                    count = warnings.len(),
                    "Insecure default values detected (allowed in {} mode)",
                    config.app_env
                );
            }
        }
        Err(errors) => {
            for error in &errors {
                tracing::error!(target: "security", "{}", error);
            }
            eprintln!(
                "FATAL: {} insecure default(s) detected in production mode. Set proper keys or use APP_ENV=development.",
                errors.len()
            );
            std::process::exit(1);
        }
    }

    let pool = match porchlight_db::create_pool(&config.database_url).await {
        Ok(pool) => {
            info!("Database connection established");
            pool
        }
        Err(e) => {
            eprintln!("Failed to connect to database: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = porchlight_db::run_migrations(&pool).await {
        eprintln!("Failed to run database migrations: {e}");
        std::process::exit(1);
    }
    info!("Database migrations applied");

    // Handlers and the background worker share one delivery service so
    // manual retries and event fan-out behave identically.
    let (event_publisher, event_rx) = EventPublisher::new(EVENT_CHANNEL_CAPACITY);

    let webhooks_state = match WebhooksState::new(
        pool.clone(),
        config.webhook_encryption_key.to_vec(),
        config.allow_insecure_webhook_urls,
    ) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("Failed to create webhook services: {e}");
            std::process::exit(1);
        }
    };

    let worker_token = CancellationToken::new();
    let worker = WebhookWorker::new(
        webhooks_state.delivery_service.clone(),
        event_rx,
        worker_token.clone(),
    );
    let worker_handle = tokio::spawn(async move {
        worker.run().await;
    });
    info!("Webhook delivery worker started");

    let app = Router::new()
        .route(
            "/health",
            get(health::health_handler).with_state(pool.clone()),
        )
        .merge(openapi::swagger_routes())
        .merge(webhooks_router(webhooks_state))
        .layer(axum::middleware::from_fn(
            middleware::tenant_context_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        // Other subsystems publish lifecycle events through this handle.
        .layer(Extension(event_publisher));

    let addr: SocketAddr = match config.bind_addr().parse() {
        Ok(addr) => addr,
        Err(e) => {
            tracing::error!("Invalid bind address {}: {e}", config.bind_addr());
            std::process::exit(1);
        }
    };

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind to address {addr}: {e}");
            std::process::exit(1);
        }
    };

    info!(%addr, "Server listening");

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    }

    // Let the worker finish in-flight deliveries before exiting.
    worker_token.cancel();
    if let Err(e) = worker_handle.await {
        tracing::error!("Webhook delivery worker task failed: {e}");
    }

    info!("Shutdown complete");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {e}");
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
