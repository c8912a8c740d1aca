//! Herald API server binary entrypoint.
//!
//! Runs the HTTP API, the job scheduler and the email dispatcher in one
//! process.

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use herald_common::config::AppConfig;
use herald_common::db::{create_pool, run_migrations};
use herald_common::repository::Stores;
use herald_engine::Scheduler;
use herald_notifier::{EmailDispatcher, EmailGateway, LogMailer, NotificationService, ResendMailer};

use herald_api::routes::create_router;
use herald_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("herald_api=info,herald_engine=info,herald_notifier=info,tower_http=info")
        }))
        .init();

    tracing::info!("Starting Herald API server...");

    // Load configuration
    let config = AppConfig::from_env()?;

    // Create database connection pool
    let pool = create_pool(&config.database_url, config.db_max_connections).await?;
    run_migrations(&pool).await?;
    tracing::info!("Database pool created");

    let stores = Stores::postgres(pool);

    let gateway: Arc<dyn EmailGateway> = match &config.resend_api_key {
        Some(key) => Arc::new(ResendMailer::new(
            key.clone(),
            &config.email_from,
            &config.email_from_name,
        )),
        None => {
            tracing::warn!("RESEND_API_KEY not set, emails will only be logged");
            Arc::new(LogMailer)
        }
    };

    let dispatcher = EmailDispatcher::start(
        gateway,
        stores.events.clone(),
        config.email_workers,
        config.email_queue_capacity,
    );
    let notifications = NotificationService::new(stores.notifications.clone(), dispatcher.clone());

    let scheduler = Scheduler::new(
        stores.jobs.clone(),
        stores.participants.clone(),
        stores.users.clone(),
        Arc::new(notifications.clone()),
        config.scheduler_interval(),
    )
    .start();

    // Build application state
    let addr = SocketAddr::from(([0, 0, 0, 0], config.api_port));
    let state = AppState::new(config, &stores, notifications);

    // Build router
    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    tracing::info!("API server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Stop producing work before draining the email queue.
    scheduler.stop();
    scheduler.join().await;
    dispatcher.shutdown().await;

    tracing::info!("Herald stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
