use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FbrStatus {
    #[default]
    Pending,
    Submitted,
    Accepted,
    Rejected,
}

impl FbrStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FbrStatus::Pending => "pending",
            FbrStatus::Submitted => "submitted",
            FbrStatus::Accepted => "accepted",
            FbrStatus::Rejected => "rejected",
        }
    }
}

/// Tracks one invoice through e-invoicing. IRN/UUID/QR come from the tax
/// authority and are recorded as received.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FbrSubmission {
    #[serde(rename = "_id")]
    pub id: String,
    pub seller_id: String,
    pub invoice_id: String,
    pub invoice_number: Option<String>,
    pub status: FbrStatus,
    pub irn: Option<String>,
    pub uuid: Option<String>,
    pub qr_payload: Option<String>,
    pub error_message: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FbrEnvironment {
    #[default]
    Sandbox,
    Production,
}

/// Stored FBR API credentials. Never serialised into a response as-is; the
/// service reports only whether each token is present.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FbrApiSettings {
    #[serde(rename = "_id")]
    pub id: String,
    pub environment: FbrEnvironment,
    pub sandbox_token: Option<String>,
    pub production_token: Option<String>,
    pub api_base_url: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl FbrApiSettings {
    /// Whether a token is configured for the active environment.
    pub fn active_token_configured(&self) -> bool {
        let token = match self.environment {
            FbrEnvironment::Sandbox => &self.sandbox_token,
            FbrEnvironment::Production => &self.production_token,
        };
        token.as_deref().is_some_and(|t| !t.trim().is_empty())
    }
}

impl std::fmt::Debug for FbrApiSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FbrApiSettings")
            .field("id", &self.id)
            .field("environment", &self.environment)
            .field("sandbox_token", &self.sandbox_token.as_ref().map(|_| "[REDACTED]"))
            .field("production_token", &self.production_token.as_ref().map(|_| "[REDACTED]"))
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_token_follows_environment() {
        let mut settings = FbrApiSettings {
            sandbox_token: Some("sbx".into()),
            ..Default::default()
        };
        assert!(settings.active_token_configured());
        settings.environment = FbrEnvironment::Production;
        assert!(!settings.active_token_configured());
        settings.production_token = Some("   ".into());
        assert!(!settings.active_token_configured());
    }

    #[test]
    fn debug_output_redacts_tokens() {
        let settings = FbrApiSettings {
            production_token: Some("super-secret".into()),
            ..Default::default()
        };
        assert!(!format!("{:?}", settings).contains("super-secret"));
    }

    #[test]
    fn submission_status_is_lowercase() {
        let submission = FbrSubmission {
            status: FbrStatus::Accepted,
            ..Default::default()
        };
        let value = serde_json::to_value(&submission).unwrap();
        assert_eq!(value["status"], "accepted");
        assert!(value["irn"].is_null());
    }
}
