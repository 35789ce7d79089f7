// File: services/bookwise_backend/src/main.rs
use bookwise_backend::app::build_router;
use bookwise_backend::reminders::spawn_reminder_scheduler;
use bookwise_backend::StartupError;
use bookwise_common::logging;
use bookwise_config::load_config;
use bookwise_db::{BookingRepository, DbClient, SqlBookingRepository};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info};

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    logging::init();
    let config = Arc::new(load_config()?);

    let db_client = DbClient::new(&config).await?;
    let repository = Arc::new(SqlBookingRepository::new(db_client));
    repository.init_schema().await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler = spawn_reminder_scheduler(&config, Arc::clone(&repository), shutdown_rx)?;

    let app = build_router(&config, repository);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Starting server at http://{}", addr);
    info!("API endpoints available at http://{}/api", addr);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = shutdown_tx.send(true);
    if let Some(handle) = scheduler {
        if let Err(e) = handle.await {
            error!("Reminder scheduler task failed: {}", e);
        }
    }
    info!("Server stopped");
    Ok(())
}
