//! Metrics collection and Prometheus export.

use metrics::counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use nexus_core::error::AppError;
use std::sync::OnceLock;

/// Global handle to the Prometheus recorder.
pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder. Must run before anything is recorded;
/// a second call is a no-op.
pub fn init_metrics() -> Result<(), AppError> {
    if METRICS_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder().map_err(|e| {
        AppError::ConfigError(anyhow::anyhow!("failed to install Prometheus recorder: {}", e))
    })?;
    let _ = METRICS_HANDLE.set(handle);
    Ok(())
}

/// Current metrics in Prometheus text format.
pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized".to_string())
}

pub fn record_invoice_created(source: &'static str) {
    counter!("invoices_created_total", "source" => source).increment(1);
}

pub fn record_pdf_render(outcome: &'static str) {
    counter!("pdf_renders_total", "outcome" => outcome).increment(1);
}

pub fn record_csv_export(kind: &'static str) {
    counter!("csv_exports_total", "type" => kind).increment(1);
}
