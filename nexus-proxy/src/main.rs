use nexus_core::observability::init_tracing;
use nexus_proxy::config::ProxyConfig;
use nexus_proxy::metrics::init_metrics;
use nexus_proxy::startup::Application;
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
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_metrics().map_err(|e| std::io::Error::other(e.to_string()))?;

    let config = ProxyConfig::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::io::Error::other(format!("Configuration error: {}", e))
    })?;

    init_tracing(
        "nexus-proxy",
        &config.common.log_level,
        config.common.otlp_endpoint.as_deref(),
    );

    let app = Application::build(config)
        .await
        .map_err(|e| std::io::Error::other(format!("Startup error: {}", e)))?;

    tokio::select! {
        result = app.run_until_stopped() => result,
        _ = shutdown_signal() => {
            tracing::info!("Shutdown signal received");
            Ok(())
        }
    }
}
