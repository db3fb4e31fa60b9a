use nexus_core::error::ErrorCode;
use reqwest::StatusCode;
use thiserror::Error;

/// Where the UI should send the user after a failed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redirect {
    Login,
    SellerSetup,
}

const AUTH_PREFIX: &str = "/api/auth/";

pub fn is_auth_endpoint(path: &str) -> bool {
    path.starts_with(AUTH_PREFIX)
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Request to {path} timed out")]
    Timeout { path: String },

    #[error("HTTP error calling {path}: {source}")]
    Http {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{path} returned {status}: {message}")]
    Api {
        path: String,
        status: StatusCode,
        code: ErrorCode,
        message: String,
    },

    #[error("Failed to decode response from {path}: {message}")]
    Decode { path: String, message: String },

    #[error("Bulk job {job_id} did not finish after {attempts} polls")]
    JobTimedOut { job_id: String, attempts: u32 },

    #[error("Cancelled")]
    Cancelled,

    #[error("Client configuration error: {0}")]
    Config(String),
}

impl ClientError {
    pub(crate) fn from_reqwest(path: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout {
                path: path.to_string(),
            }
        } else {
            ClientError::Http {
                path: path.to_string(),
                source: err,
            }
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ClientError::Timeout { .. })
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            ClientError::Api { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// 401 redirects to login only for auth endpoints; 403 is decided by the
    /// error code.
    pub fn redirect(&self) -> Option<Redirect> {
        let ClientError::Api {
            path, status, code, ..
        } = self
        else {
            return None;
        };

        match *status {
            StatusCode::UNAUTHORIZED if is_auth_endpoint(path) => Some(Redirect::Login),
            StatusCode::FORBIDDEN => match code {
                ErrorCode::SellerContextMissing | ErrorCode::SellerSettingsMissing => {
                    Some(Redirect::SellerSetup)
                }
                ErrorCode::Unauthorized => Some(Redirect::Login),
                _ => None,
            },
            _ => None,
        }
    }

    /// Whether the endpoint itself looks unavailable, as opposed to the
    /// request being refused.
    pub fn endpoint_unavailable(&self) -> bool {
        match self {
            ClientError::Timeout { .. } | ClientError::Http { .. } => true,
            ClientError::Api { status, .. } => {
                *status == StatusCode::NOT_FOUND || status.is_server_error()
            }
            _ => false,
        }
    }
}
