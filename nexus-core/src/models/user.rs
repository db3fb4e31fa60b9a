use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A member of a seller's team. Holds no credentials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub seller_id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub permissions: Vec<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for User {
    fn default() -> Self {
        Self {
            id: String::new(),
            seller_id: String::new(),
            name: String::new(),
            email: String::new(),
            role: "viewer".to_string(),
            permissions: Vec::new(),
            active: true,
            created_at: DateTime::<Utc>::default(),
            updated_at: DateTime::<Utc>::default(),
        }
    }
}
