use super::clean;
use chrono::{DateTime, Utc};
use nexus_core::models::{FbrApiSettings, FbrEnvironment, FbrStatus, SellerSettings};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

fn validate_tax_rate(rate: &Decimal) -> Result<(), ValidationError> {
    if *rate < Decimal::ZERO || *rate > Decimal::ONE_HUNDRED {
        let mut err = ValidationError::new("range");
        err.message = Some("Sales tax rate must be between 0 and 100".into());
        return Err(err);
    }
    Ok(())
}

/// Seller profile, used both for registration and for updates.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SellerSettingsRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "Company name is required"))]
    pub company_name: String,
    #[serde(rename = "sellerNTN")]
    #[validate(length(max = 20))]
    pub seller_ntn: Option<String>,
    #[serde(rename = "sellerSTRN")]
    #[validate(length(max = 20))]
    pub seller_strn: Option<String>,
    #[validate(length(max = 500))]
    pub address: Option<String>,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub province: Option<String>,
    #[validate(custom(function = "validate_tax_rate"))]
    pub sales_tax_rate: Option<Decimal>,
    #[validate(length(max = 10))]
    pub invoice_prefix: Option<String>,
}

impl SellerSettingsRequest {
    /// Overwrite the profile fields; an absent tax rate keeps the current one.
    pub fn apply_to(self, settings: &mut SellerSettings, now: DateTime<Utc>) {
        settings.company_name = self.company_name.trim().to_string();
        settings.seller_ntn = clean(self.seller_ntn);
        settings.seller_strn = clean(self.seller_strn);
        settings.address = clean(self.address);
        settings.phone = clean(self.phone);
        settings.email = clean(self.email);
        settings.province = clean(self.province);
        if let Some(rate) = self.sales_tax_rate {
            settings.sales_tax_rate = rate;
        }
        settings.invoice_prefix = clean(self.invoice_prefix);
        settings.updated_at = now;
    }
}

/// FBR credentials as submitted. An omitted token keeps the stored one; an
/// empty token clears it.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FbrSettingsRequest {
    pub environment: Option<FbrEnvironment>,
    pub sandbox_token: Option<Secret<String>>,
    pub production_token: Option<Secret<String>>,
    #[validate(url)]
    pub api_base_url: Option<String>,
}

fn merge_token(current: &mut Option<String>, submitted: Option<Secret<String>>) {
    if let Some(token) = submitted {
        *current = clean(Some(token.expose_secret().clone()));
    }
}

impl FbrSettingsRequest {
    pub fn apply_to(self, settings: &mut FbrApiSettings, now: DateTime<Utc>) {
        if let Some(environment) = self.environment {
            settings.environment = environment;
        }
        merge_token(&mut settings.sandbox_token, self.sandbox_token);
        merge_token(&mut settings.production_token, self.production_token);
        if self.api_base_url.is_some() {
            settings.api_base_url = clean(self.api_base_url);
        }
        settings.updated_at = now;
    }
}

/// What callers may see of the stored FBR settings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FbrSettingsView {
    pub environment: FbrEnvironment,
    pub sandbox_token_set: bool,
    pub production_token_set: bool,
    pub api_base_url: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<Option<&FbrApiSettings>> for FbrSettingsView {
    fn from(settings: Option<&FbrApiSettings>) -> Self {
        let is_set = |t: &Option<String>| t.as_deref().is_some_and(|t| !t.is_empty());
        match settings {
            Some(s) => Self {
                environment: s.environment,
                sandbox_token_set: is_set(&s.sandbox_token),
                production_token_set: is_set(&s.production_token),
                api_base_url: s.api_base_url.clone(),
                updated_at: Some(s.updated_at),
            },
            None => Self {
                environment: FbrEnvironment::default(),
                sandbox_token_set: false,
                production_token_set: false,
                api_base_url: None,
                updated_at: None,
            },
        }
    }
}

/// A result obtained from FBR outside this system.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FbrSubmissionUpdate {
    pub status: FbrStatus,
    #[validate(length(max = 128))]
    pub irn: Option<String>,
    #[validate(length(max = 128))]
    pub uuid: Option<String>,
    pub qr_payload: Option<String>,
    #[validate(length(max = 2000))]
    pub error_message: Option<String>,
}
