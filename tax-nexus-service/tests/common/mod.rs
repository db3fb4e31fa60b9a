#![allow(dead_code)]

use nexus_core::config::Config as CoreConfig;
use reqwest::{Client, RequestBuilder, Response};
use secrecy::Secret;
use serde_json::{json, Value};
use tax_nexus_service::config::{MongoConfig, ServiceConfig, StorageBackend};
use tax_nexus_service::middleware::SELLER_ID_HEADER;
use tax_nexus_service::startup::Application;
use uuid::Uuid;

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub seller_id: String,
    pub client: Client,
}

pub fn test_config() -> ServiceConfig {
    ServiceConfig {
        common: CoreConfig {
            port: 0, // Random port for testing
            log_level: "info".to_string(),
            otlp_endpoint: None,
            environment: "test".to_string(),
        },
        mongodb: MongoConfig {
            uri: Secret::new("mongodb://localhost:27017".to_string()),
            database: "tax_nexus_test".to_string(),
        },
        storage: StorageBackend::Memory,
    }
}

impl TestApp {
    /// Spawn the service on a random port with in-memory storage. Each app
    /// gets a fresh seller id.
    pub async fn spawn() -> Self {
        let app = Application::build(test_config())
            .await
            .expect("Failed to build test application");
        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        let client = Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            seller_id: format!("seller-{}", Uuid::new_v4()),
            client,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    fn scoped(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header(SELLER_ID_HEADER, &self.seller_id)
    }

    pub async fn get(&self, path: &str) -> Response {
        self.scoped(self.client.get(self.url(path)))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn post(&self, path: &str, body: &Value) -> Response {
        self.scoped(self.client.post(self.url(path)))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn put(&self, path: &str, body: &Value) -> Response {
        self.scoped(self.client.put(self.url(path)))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn patch(&self, path: &str, body: &Value) -> Response {
        self.scoped(self.client.patch(self.url(path)))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn delete(&self, path: &str) -> Response {
        self.scoped(self.client.delete(self.url(path)))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Store the HS Softworks seller profile for this app's seller.
    pub async fn seed_seller(&self) {
        let response = self
            .put(
                "/api/seller-settings",
                &json!({
                    "companyName": "HS Softworks",
                    "address": "12 Mall Road, Lahore",
                    "phone": "042-1234567",
                    "sellerNTN": "7654321-0",
                    "sellerSTRN": "32-77-8761-234-56",
                    "salesTaxRate": "18",
                }),
            )
            .await;
        assert!(response.status().is_success(), "seeding seller failed");
    }

    /// Create the Acme Co buyer and return its id.
    pub async fn seed_client(&self) -> String {
        let response = self
            .post(
                "/api/clients",
                &json!({
                    "companyName": "Acme Co",
                    "buyerNTN": "1234567-8",
                    "buyerSTRN": "17-00-1234-567-89",
                    "address": "Plot 4, I-9 Industrial Area, Islamabad",
                }),
            )
            .await;
        assert_eq!(response.status().as_u16(), 201);
        let body: Value = response.json().await.expect("Failed to parse JSON");
        body["client"]["_id"]
            .as_str()
            .expect("client id")
            .to_string()
    }

    /// Create INV-001 for Acme Co and return the invoice body.
    pub async fn seed_invoice(&self, client_id: &str) -> Value {
        let response = self
            .post(
                "/api/invoices",
                &json!({
                    "invoiceNumber": "INV-001",
                    "invoiceDate": "2024-03-05",
                    "clientId": client_id,
                    "items": [{
                        "description": "Tax Filing",
                        "hsCode": "9983.11.00",
                        "quantity": 1,
                        "unitPrice": 5000,
                    }],
                }),
            )
            .await;
        assert_eq!(response.status().as_u16(), 201);
        let body: Value = response.json().await.expect("Failed to parse JSON");
        body["invoice"].clone()
    }
}
