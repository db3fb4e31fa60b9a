use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Sales tax rate applied when neither the line nor the seller sets one.
pub const DEFAULT_SALES_TAX_RATE: Decimal = Decimal::from_parts(18, 0, 0, false, 0);

fn default_sales_tax_rate() -> Decimal {
    DEFAULT_SALES_TAX_RATE
}

/// A buyer. NTN/STRN keep their upper-case spelling on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Client {
    #[serde(rename = "_id")]
    pub id: String,
    pub seller_id: String,
    pub company_name: String,
    #[serde(rename = "buyerNTN")]
    pub buyer_ntn: Option<String>,
    #[serde(rename = "buyerSTRN")]
    pub buyer_strn: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub province: Option<String>,
    pub registration_type: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The seller's own profile; one per seller, keyed by the seller id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SellerSettings {
    #[serde(rename = "_id")]
    pub id: String,
    pub company_name: String,
    #[serde(rename = "sellerNTN")]
    pub seller_ntn: Option<String>,
    #[serde(rename = "sellerSTRN")]
    pub seller_strn: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub province: Option<String>,
    #[serde(default = "default_sales_tax_rate")]
    pub sales_tax_rate: Decimal,
    pub invoice_prefix: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for SellerSettings {
    fn default() -> Self {
        Self {
            id: String::new(),
            company_name: String::new(),
            seller_ntn: None,
            seller_strn: None,
            address: None,
            phone: None,
            email: None,
            province: None,
            sales_tax_rate: DEFAULT_SALES_TAX_RATE,
            invoice_prefix: None,
            created_at: DateTime::<Utc>::default(),
            updated_at: DateTime::<Utc>::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tax_ids_keep_upper_case_keys() {
        let client = Client {
            id: "c1".into(),
            company_name: "Acme Co".into(),
            buyer_ntn: Some("123".into()),
            buyer_strn: Some("456".into()),
            ..Default::default()
        };
        let value = serde_json::to_value(&client).unwrap();
        assert_eq!(value["buyerNTN"], "123");
        assert_eq!(value["buyerSTRN"], "456");
        assert_eq!(value["companyName"], "Acme Co");
    }

    #[test]
    fn seller_rate_defaults_to_eighteen() {
        let seller: SellerSettings =
            serde_json::from_value(json!({"_id": "s1", "companyName": "HS Softworks"})).unwrap();
        assert_eq!(seller.sales_tax_rate, Decimal::new(18, 0));
        assert_eq!(SellerSettings::default().sales_tax_rate, DEFAULT_SALES_TAX_RATE);
    }
}
