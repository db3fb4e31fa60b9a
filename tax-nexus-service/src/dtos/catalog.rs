use super::{clean, validate_non_negative};
use nexus_core::models::validate_hs_code;
use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ServiceItemRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "Service name is required"))]
    pub name: String,
    pub description: Option<String>,
    #[validate(custom(function = "validate_hs_code"))]
    pub hs_code: Option<String>,
    pub uom: Option<String>,
    #[serde(default)]
    #[validate(custom(function = "validate_non_negative"))]
    pub unit_price: Decimal,
    #[validate(custom(function = "validate_non_negative"))]
    pub sales_tax_rate: Option<Decimal>,
}

impl ServiceItemRequest {
    pub fn description(&self) -> Option<String> {
        clean(self.description.clone())
    }

    pub fn uom(&self) -> Option<String> {
        clean(self.uom.clone())
    }
}
