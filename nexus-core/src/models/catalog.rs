use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A billable service in the seller's catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceItem {
    #[serde(rename = "_id")]
    pub id: String,
    pub seller_id: String,
    pub name: String,
    pub description: Option<String>,
    pub hs_code: Option<String>,
    pub uom: Option<String>,
    pub unit_price: Decimal,
    pub sales_tax_rate: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}
