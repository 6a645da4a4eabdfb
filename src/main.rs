use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use linklet::config::Config;
use linklet::service::ResolutionService;
use linklet::storage::{MemoryStorage, Storage};
use linklet::telemetry::{HttpTelemetry, Level, Package, Telemetry};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!("Loaded configuration");

    let telemetry = if config.telemetry.enabled {
        let sink = HttpTelemetry::spawn(&config.telemetry)?;
        info!(
            "📡 Telemetry enabled (endpoint: {})",
            config.telemetry.endpoint.as_deref().unwrap_or_default()
        );
        Telemetry::new(Arc::new(sink))
    } else {
        info!("📡 Telemetry disabled, logging locally only");
        Telemetry::disabled()
    };

    let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
    let service = Arc::new(ResolutionService::from_config(
        storage,
        telemetry.clone(),
        &config,
    ));

    let app = linklet::create_app(service, &config);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("🚀 URL shortener listening on http://{}", addr);
    info!("   - POST {}/shorturls - Create short URL", config.base_url);
    info!("   - GET  {}/shorturls/:shortcode - Get statistics", config.base_url);
    info!("   - GET  {}/:shortcode - Redirect to original URL", config.base_url);
    telemetry.info(
        Package::Service,
        format!("URL shortener started on {addr}"),
    );

    if let Err(e) = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    {
        telemetry.log(Level::Fatal, Package::Service, format!("Server error: {e}"));
        return Err(e.into());
    }

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
