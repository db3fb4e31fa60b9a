use super::clean;
use chrono::{DateTime, Utc};
use nexus_core::models::Client;
use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ClientRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "Company name is required"))]
    pub company_name: String,
    #[serde(rename = "buyerNTN")]
    #[validate(length(max = 20))]
    pub buyer_ntn: Option<String>,
    #[serde(rename = "buyerSTRN")]
    #[validate(length(max = 20))]
    pub buyer_strn: Option<String>,
    #[validate(length(max = 500))]
    pub address: Option<String>,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub province: Option<String>,
    pub registration_type: Option<String>,
}

impl ClientRequest {
    pub fn into_client(self, id: String, seller_id: &str, now: DateTime<Utc>) -> Client {
        let mut client = Client {
            id,
            seller_id: seller_id.to_string(),
            created_at: now,
            ..Default::default()
        };
        self.apply_to(&mut client, now);
        client
    }

    pub fn apply_to(self, client: &mut Client, now: DateTime<Utc>) {
        client.company_name = self.company_name.trim().to_string();
        client.buyer_ntn = clean(self.buyer_ntn);
        client.buyer_strn = clean(self.buyer_strn);
        client.address = clean(self.address);
        client.phone = clean(self.phone);
        client.email = clean(self.email);
        client.province = clean(self.province);
        client.registration_type = clean(self.registration_type);
        client.updated_at = now;
    }
}
