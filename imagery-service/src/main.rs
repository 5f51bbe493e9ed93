use imagery_service::config::ImageryConfig;
use imagery_service::services::init_metrics;
use imagery_service::startup::Application;
use service_core::observability::init_tracing;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize metrics recorder (must be before any metrics are recorded)
    init_metrics();

    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let otlp_endpoint = std::env::var("OTLP_ENDPOINT").ok();
    init_tracing("imagery-service", &log_level, otlp_endpoint.as_deref());

    let config = ImageryConfig::load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        std::io::Error::other(format!("Configuration error: {}", e))
    })?;

    tracing::info!(
        data_dir = %config.storage.data_dir.display(),
        port = config.common.port,
        "Starting imagery service"
    );

    let application = Application::build(config).await.map_err(|e| {
        tracing::error!("Failed to build application: {}", e);
        std::io::Error::other(format!("Startup error: {}", e))
    })?;

    application.run_until_stopped().await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}
