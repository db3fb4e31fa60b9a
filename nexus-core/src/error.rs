use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable, machine-readable error codes carried in every error body.
///
/// Clients branch on these instead of on message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationFailed,
    BadRequest,
    NotFound,
    Unauthorized,
    Forbidden,
    SellerContextMissing,
    SellerSettingsMissing,
    Conflict,
    RenderFailed,
    DatabaseError,
    InternalError,
    BadGateway,
    ServiceUnavailable,
    ConfigError,
    #[serde(other)]
    Unknown,
}

/// Error envelope shared by the service (serialising) and the client (parsing).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub success: bool,
    pub code: ErrorCode,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub details: Option<String>,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Bad request: {0}")]
    BadRequest(anyhow::Error),

    #[error("Not found: {0}")]
    NotFound(anyhow::Error),

    #[error("Unauthorized: {0}")]
    Unauthorized(anyhow::Error),

    #[error("Forbidden: {0}")]
    Forbidden(anyhow::Error),

    #[error("Missing seller context")]
    SellerContextMissing,

    #[error("Seller settings not found for seller {0}")]
    SellerSettingsMissing(String),

    #[error("Conflict: {0}")]
    Conflict(anyhow::Error),

    #[error("Failed to generate PDF")]
    RenderError(anyhow::Error),

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),

    #[error("Bad Gateway: {0}")]
    BadGateway(String),

    #[error("Service Unavailable")]
    ServiceUnavailable,

    #[error("Database error: {0}")]
    DatabaseError(anyhow::Error),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),
}

impl AppError {
    pub fn not_found(what: &str) -> Self {
        AppError::NotFound(anyhow::anyhow!("{} not found", what))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_)
            | AppError::SellerContextMissing
            | AppError::SellerSettingsMissing(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            AppError::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            AppError::RenderError(_)
            | AppError::InternalError(_)
            | AppError::DatabaseError(_)
            | AppError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::ValidationError(_) => ErrorCode::ValidationFailed,
            AppError::BadRequest(_) => ErrorCode::BadRequest,
            AppError::NotFound(_) => ErrorCode::NotFound,
            AppError::Unauthorized(_) => ErrorCode::Unauthorized,
            AppError::Forbidden(_) => ErrorCode::Forbidden,
            AppError::SellerContextMissing => ErrorCode::SellerContextMissing,
            AppError::SellerSettingsMissing(_) => ErrorCode::SellerSettingsMissing,
            AppError::Conflict(_) => ErrorCode::Conflict,
            AppError::RenderError(_) => ErrorCode::RenderFailed,
            AppError::InternalError(_) => ErrorCode::InternalError,
            AppError::BadGateway(_) => ErrorCode::BadGateway,
            AppError::ServiceUnavailable => ErrorCode::ServiceUnavailable,
            AppError::DatabaseError(_) => ErrorCode::DatabaseError,
            AppError::ConfigError(_) => ErrorCode::ConfigError,
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

impl From<mongodb::error::Error> for AppError {
    fn from(err: mongodb::error::Error) -> Self {
        AppError::DatabaseError(anyhow::Error::new(err))
    }
}

impl From<mongodb::bson::ser::Error> for AppError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        AppError::DatabaseError(anyhow::Error::new(err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        // Internal causes are logged here and never sent to the caller.
        let (error_message, details) = match &self {
            AppError::ValidationError(err) => {
                ("Validation error".to_string(), Some(err.to_string()))
            }
            AppError::BadRequest(err)
            | AppError::NotFound(err)
            | AppError::Unauthorized(err)
            | AppError::Forbidden(err)
            | AppError::Conflict(err) => (err.to_string(), None),
            AppError::SellerContextMissing | AppError::SellerSettingsMissing(_) => {
                (self.to_string(), None)
            }
            AppError::RenderError(err) => {
                tracing::error!(error = %err, "Document rendering failed");
                ("Failed to generate PDF".to_string(), None)
            }
            AppError::InternalError(err) => {
                tracing::error!(error = ?err, "Internal server error");
                ("Internal server error".to_string(), None)
            }
            AppError::DatabaseError(err) => {
                tracing::error!(error = %err, "Database error");
                ("Database error".to_string(), None)
            }
            AppError::ConfigError(err) => {
                tracing::error!(error = %err, "Configuration error");
                ("Configuration error".to_string(), None)
            }
            AppError::BadGateway(msg) => (format!("Bad Gateway: {}", msg), None),
            AppError::ServiceUnavailable => ("Service unavailable".to_string(), None),
        };

        if status.is_client_error() {
            tracing::warn!(status = %status, code = ?code, error = %error_message, "Request rejected");
        }

        (
            status,
            Json(ErrorBody {
                success: false,
                code,
                error: error_message,
                details,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seller_errors_are_forbidden_with_distinct_codes() {
        assert_eq!(AppError::SellerContextMissing.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::SellerContextMissing.code(),
            ErrorCode::SellerContextMissing
        );
        let missing = AppError::SellerSettingsMissing("s-1".into());
        assert_eq!(missing.status(), StatusCode::FORBIDDEN);
        assert_eq!(missing.code(), ErrorCode::SellerSettingsMissing);
    }

    #[test]
    fn error_codes_serialize_screaming_snake_case() {
        let json = serde_json::to_string(&ErrorCode::SellerContextMissing).unwrap();
        assert_eq!(json, "\"SELLER_CONTEXT_MISSING\"");
        let parsed: ErrorCode = serde_json::from_str("\"SOMETHING_NEW\"").unwrap();
        assert_eq!(parsed, ErrorCode::Unknown);
    }

    #[tokio::test]
    async fn internal_errors_do_not_leak_details() {
        let response =
            AppError::InternalError(anyhow::anyhow!("connection string mongodb://secret")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        assert!(!body.success);
        assert_eq!(body.code, ErrorCode::InternalError);
        assert_eq!(body.error, "Internal server error");
        assert!(body.details.is_none());
    }
}
