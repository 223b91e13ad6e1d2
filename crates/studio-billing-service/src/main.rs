//! Studio-Billing Service - HTTP API for generation credits.
//!
//! This is the main entry point for the studio-billing service.

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use studio_billing_service::{create_router, AppState, ServiceConfig};
use studio_billing_store::{Ledger, PgLedger};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,studio_billing=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Studio-Billing Service");

    // Load configuration from environment
    let config = ServiceConfig::from_env();

    tracing::info!(
        listen_addr = %config.listen_addr,
        db_max_connections = %config.db_max_connections,
        novita_configured = %config.novita_api_key.is_some(),
        "Service configuration loaded"
    );

    // Connect the ledger pool and apply migrations
    let ledger = Arc::new(
        PgLedger::connect(
            &config.database_url,
            config.db_max_connections,
            Duration::from_secs(config.db_acquire_timeout_seconds),
            Duration::from_secs(config.db_statement_timeout_seconds),
        )
        .await?,
    );
    ledger.migrate().await?;

    match ledger.ping().await {
        Ok(()) => tracing::info!("Database ping OK"),
        Err(e) => tracing::error!(error = %e, "Database ping failed"),
    }

    // Periodic liveness probe; surfaces connectivity loss early and keeps
    // idle hosting from dropping the pool's connections.
    if config.db_keepalive_seconds > 0 {
        let probe = Arc::clone(&ledger);
        let period = Duration::from_secs(config.db_keepalive_seconds);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await; // first tick fires immediately
            loop {
                interval.tick().await;
                if let Err(e) = probe.ping().await {
                    tracing::warn!(error = %e, "Keepalive ping failed");
                }
            }
        });
    }

    // Build app state
    let state = AppState::new(ledger, config.clone());

    // Create the router
    let app = create_router(state);
    tracing::info!("Router configured with all API endpoints");

    // Start HTTP server
    tracing::info!(listen_addr = %config.listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
