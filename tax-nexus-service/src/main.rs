use nexus_core::observability::init_tracing;
use tax_nexus_service::config::ServiceConfig;
use tax_nexus_service::services::metrics::init_metrics;
use tax_nexus_service::startup::Application;
use tokio::signal;

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
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

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_metrics().map_err(|e| std::io::Error::other(e.to_string()))?;

    let config = ServiceConfig::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::io::Error::other(format!("Configuration error: {}", e))
    })?;

    init_tracing(
        "tax-nexus-service",
        &config.common.log_level,
        config.common.otlp_endpoint.as_deref(),
    );

    let app = Application::build(config)
        .await
        .map_err(|e| std::io::Error::other(format!("Startup error: {}", e)))?;
    let shutdown = app.shutdown_token();

    tokio::select! {
        result = app.run_until_stopped() => {
            if let Err(e) = &result {
                tracing::error!("Server error: {}", e);
            }
            result
        }
        _ = shutdown_signal() => {
            shutdown.cancel();
            tracing::info!("Bulk jobs cancelled, shutting down");
            Ok(())
        }
    }
}
