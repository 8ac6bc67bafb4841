use anyhow::Context;
use mailroom_server::{router, telemetry, AppState, ScanPipeline, ServiceConfig};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServiceConfig::from_env().context("invalid configuration")?;
    telemetry::init("mailroom-server", config.log_format)?;

    let pipeline = ScanPipeline::from_config(&config)?;
    info!(
        vision = pipeline.vision_configured(),
        directory = pipeline.directory_configured(),
        model = %config.vision.model,
        "scan pipeline ready"
    );

    let app = router(AppState::new(pipeline), config.body_limit);
    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("binding {}", config.bind))?;
    info!(addr = %config.bind, "mailroom server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("mailroom server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
