use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Anything that stops a request from being relayed. Every variant is
/// reported to the caller as the same JSON 500.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("Failed to read request body: {0}")]
    RequestBody(#[from] axum::Error),

    #[error("Failed to build response: {0}")]
    Response(#[from] axum::http::Error),
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "Proxy error");

        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "success": false,
                "error": "Proxy error",
                "message": self.to_string(),
            })),
        )
            .into_response()
    }
}
