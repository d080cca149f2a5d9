//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors; request-scoped errors are the
//! loyalty crate's `LoyaltyError`.

mod config;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use loyalty::{AccrualClient, PgLedgerRepository, ReconcileConfig, Reconciler, loyalty_router};
use platform::token::TokenCodec;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

/// How long in-flight work may keep running after the shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,loyalty=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;

    // Database connection
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_uri)
        .await
        .context("connecting to database")?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    let repo = PgLedgerRepository::new(pool);
    let accrual = AccrualClient::new(config.accrual_address.clone());
    let tokens = Arc::new(TokenCodec::new(config.secret.as_bytes()));

    // Background reconciliation: scanner feeding the worker pool.
    let shutdown = CancellationToken::new();
    let reconcile = ReconcileConfig::default();
    let orders = repo.spawn_order_scanner(reconcile.scan_period, shutdown.clone());
    let reconciler = Reconciler::new(
        Arc::new(repo.clone()),
        Arc::new(accrual.clone()),
        reconcile,
    );
    let supervisor = tokio::spawn(reconciler.run(orders, shutdown.clone()));

    // Build router
    let app = Router::new()
        .nest("/api/user", loyalty_router(repo, accrual, tokens))
        .layer(TraceLayer::new_for_http());

    // Start server
    tracing::info!(address = %config.run_address, "Listening");
    let listener = TcpListener::bind(&config.run_address)
        .await
        .context("binding listen address")?;

    let signal = shutdown.clone();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown_signal().await;
                signal.cancel();
            })
            .await
    });

    tokio::select! {
        // The server exited on its own (bind lost, fatal I/O error).
        result = &mut server => result??,
        _ = shutdown.cancelled() => {
            match tokio::time::timeout(SHUTDOWN_GRACE, &mut server).await {
                Ok(result) => result??,
                Err(_) => {
                    tracing::warn!("Forcing shutdown after grace period");
                    server.abort();
                }
            }
        }
    }

    // Stop the scanner and workers, then wait for them to drain.
    shutdown.cancel();
    match tokio::time::timeout(SHUTDOWN_GRACE, supervisor).await {
        Ok(Err(err)) => tracing::error!(error = %err, "Reconciliation supervisor failed"),
        Err(_) => tracing::warn!("Reconciliation pool did not stop in time"),
        Ok(Ok(())) => {}
    }

    tracing::info!("Server stopped gracefully");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
