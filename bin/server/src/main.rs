mod auth;
mod config;
mod constants;
mod handlers;
mod logging;
mod state;

use actix_web::{web, App, HttpServer};
use anyhow::Context;
use config::ServerConfig;
use state::AppState;
use tracing::{error, info, warn};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::load()?;
    logging::init(&config.log_file)?;

    info!("Starting file sharing server (PID: {})", std::process::id());

    let state = AppState::from_config(&config).await.map_err(|e| {
        error!("Failed to initialize server state: {:#}", e);
        e
    })?;
    match &state.credentials {
        Some(credentials) => info!(username = ?credentials.username(), "Admin routes enabled"),
        None => warn!("No admin password configured; admin routes will reject every request"),
    }
    let state = web::Data::new(state);

    let bind_address = config.bind_address();
    info!("Starting server on http://{}", bind_address);

    let mut server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(handlers::configure)
    });
    if let Some(workers) = config.workers {
        server = server.workers(workers);
    }

    let server = server
        .bind(&bind_address)
        .with_context(|| format!("Failed to bind to {}", bind_address))?;

    info!("Server bound successfully to http://{}", bind_address);

    // Runs until a shutdown signal arrives
    server.run().await.context("Server terminated with an error")
}
