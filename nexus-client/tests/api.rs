use nexus_client::{ApiClient, ClientConfig, ClientError, Redirect, SessionStore};
use nexus_core::error::ErrorCode;
use nexus_core::models::BulkJobStatus;
use nexus_documents::ExportKind;
use serde_json::json;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn client_for(server: &MockServer) -> (ApiClient, SessionStore) {
    let config = ClientConfig {
        api_url: server.uri(),
        timeout: Duration::from_millis(200),
        retry_delay: Duration::from_millis(10),
        poll_interval: Duration::from_millis(10),
        max_poll_attempts: 5,
        ..Default::default()
    };
    let session = SessionStore::new();
    session.init("test-token", Some("seller-1".to_string())).await;
    let client = ApiClient::new(config, session.clone()).expect("client builds");
    (client, session)
}

fn error_body(code: &str, message: &str) -> serde_json::Value {
    json!({ "success": false, "code": code, "error": message })
}

fn job(status: &str) -> serde_json::Value {
    json!({
        "success": true,
        "job": { "_id": "job-1", "sellerId": "seller-1", "status": status, "total": 2, "succeeded": 2 }
    })
}

#[tokio::test]
async fn requests_carry_token_and_seller() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/clients"))
        .and(header("authorization", "Bearer test-token"))
        .and(header("seller-id", "seller-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "clients": [{ "_id": "c1", "companyName": "Acme Co", "buyerNTN": "1234567-8" }],
            "count": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client_for(&server).await;
    let clients = client.list_clients().await.unwrap();

    assert_eq!(clients.len(), 1);
    assert_eq!(clients[0].company_name, "Acme Co");
    assert_eq!(clients[0].buyer_ntn.as_deref(), Some("1234567-8"));
}

#[tokio::test]
async fn unauthorized_data_call_keeps_the_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/invoices"))
        .respond_with(ResponseTemplate::new(401).set_body_json(error_body("UNAUTHORIZED", "Expired")))
        .mount(&server)
        .await;

    let (client, session) = client_for(&server).await;
    let err = client.list_invoices().await.unwrap_err();

    assert_eq!(err.status().map(|s| s.as_u16()), Some(401));
    assert_eq!(err.redirect(), None);
    assert!(session.is_active().await);
}

#[tokio::test]
async fn unauthorized_auth_call_clears_the_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(ResponseTemplate::new(401).set_body_json(error_body("UNAUTHORIZED", "Expired")))
        .mount(&server)
        .await;

    let (client, session) = client_for(&server).await;
    let err = client.get_json("/api/auth/me").await.unwrap_err();

    assert_eq!(err.redirect(), Some(Redirect::Login));
    assert!(!session.is_active().await);
}

#[tokio::test]
async fn missing_seller_settings_redirects_to_setup() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/invoices"))
        .respond_with(
            ResponseTemplate::new(403)
                .set_body_json(error_body("SELLER_SETTINGS_MISSING", "Seller settings not found")),
        )
        .mount(&server)
        .await;

    let (client, session) = client_for(&server).await;
    let err = client
        .create_invoice(&json!({ "product": "Tax Filing", "units": 1, "unitPrice": 5000 }))
        .await
        .unwrap_err();

    assert_eq!(err.code(), Some(ErrorCode::SellerSettingsMissing));
    assert_eq!(err.redirect(), Some(Redirect::SellerSetup));
    assert!(session.is_active().await);
}

#[tokio::test]
async fn timeout_is_retried_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/dashboard/stats"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "success": true, "stats": { "clients": 0 } }))
                .set_delay(Duration::from_millis(500)),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/dashboard/stats"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "success": true, "stats": { "clients": 3 } })),
        )
        .mount(&server)
        .await;

    let (client, _) = client_for(&server).await;
    let stats = client.dashboard_stats().await.unwrap();

    assert_eq!(stats["clients"], 3);
}

#[tokio::test]
async fn second_timeout_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/dashboard/stats"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let (client, _) = client_for(&server).await;
    let err = client.dashboard_stats().await.unwrap_err();

    assert!(err.is_timeout(), "expected timeout, got {err}");
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/invoices/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(error_body("NOT_FOUND", "Invoice not found")))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client_for(&server).await;
    let err = client.get_invoice("missing").await.unwrap_err();

    assert!(matches!(err, ClientError::Api { .. }));
    assert_eq!(err.code(), Some(ErrorCode::NotFound));
}

#[tokio::test]
async fn polling_stops_when_job_finishes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/invoices/bulk/job-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(job("running")))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/invoices/bulk/job-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(job("completed")))
        .mount(&server)
        .await;

    let (client, _) = client_for(&server).await;
    let job = client
        .wait_for_job("job-1", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(job.status, BulkJobStatus::Completed);
    assert_eq!(job.succeeded, 2);
}

#[tokio::test]
async fn polling_gives_up_after_max_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/invoices/bulk/job-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(job("queued")))
        .expect(5)
        .mount(&server)
        .await;

    let (client, _) = client_for(&server).await;
    let err = client
        .wait_for_job("job-1", &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::JobTimedOut { attempts: 5, .. }));
}

#[tokio::test]
async fn polling_stops_on_cancel() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/invoices/bulk/job-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(job("running")))
        .mount(&server)
        .await;

    let (client, _) = client_for(&server).await;
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = client.wait_for_job("job-1", &cancel).await.unwrap_err();
    assert!(matches!(err, ClientError::Cancelled));
}

#[tokio::test]
async fn pdf_download_uses_server_filename() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/invoices/inv-1/pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/pdf")
                .insert_header(
                    "content-disposition",
                    "attachment; filename=\"Invoice_INV-001_Acme Co.pdf\"",
                )
                .set_body_bytes(b"%PDF-1.3 test".to_vec()),
        )
        .mount(&server)
        .await;

    let (client, _) = client_for(&server).await;
    let file = client.download_invoice_pdf("inv-1").await.unwrap();

    assert_eq!(file.filename, "Invoice_INV-001_Acme Co.pdf");
    assert!(file.bytes.starts_with(b"%PDF"));
}

#[tokio::test]
async fn pdf_download_decodes_utf8_filename() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/invoices/inv-9/pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/pdf")
                .insert_header(
                    "content-disposition",
                    "attachment; filename=\"Invoice_INV-9_____.pdf\"; \
                     filename*=UTF-8''Invoice_INV-9_%D8%AA%D8%A7%D8%AC%D8%B1.pdf",
                )
                .set_body_bytes(b"%PDF-1.3 test".to_vec()),
        )
        .mount(&server)
        .await;

    let (client, _) = client_for(&server).await;
    let file = client.download_invoice_pdf("inv-9").await.unwrap();

    assert_eq!(file.filename, "Invoice_INV-9_تاجر.pdf");
}

#[tokio::test]
async fn export_uses_server_csv_when_available() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/export/excel"))
        .and(query_param("type", "clients"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-disposition", "attachment; filename=\"clients_export_2024-01-31.csv\"")
                .set_body_string("\u{feff}\"Company Name\""),
        )
        .mount(&server)
        .await;

    let (client, _) = client_for(&server).await;
    let file = client.export_csv(ExportKind::Clients).await.unwrap();

    assert_eq!(file.filename, "clients_export_2024-01-31.csv");
}

#[tokio::test]
async fn export_falls_back_to_local_csv() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/export/excel"))
        .respond_with(ResponseTemplate::new(500).set_body_json(error_body("INTERNAL_ERROR", "boom")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/clients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "clients": [{ "_id": "c1", "companyName": "Acme \"Co\"", "buyerNTN": "1234567-8" }],
            "count": 1
        })))
        .mount(&server)
        .await;

    let (client, _) = client_for(&server).await;
    let file = client.export_csv(ExportKind::Clients).await.unwrap();
    let csv = String::from_utf8(file.bytes).unwrap();

    assert!(file.filename.starts_with("clients_export_"));
    assert!(csv.starts_with('\u{feff}'));
    let lines: Vec<&str> = csv.trim_start_matches('\u{feff}').split("\r\n").collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("\"Company Name\",\"Buyer NTN\""));
    assert!(lines[1].starts_with("\"Acme \"\"Co\"\"\",\"1234567-8\""));
}

#[tokio::test]
async fn export_does_not_mask_auth_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/export/excel"))
        .respond_with(
            ResponseTemplate::new(403).set_body_json(error_body("SELLER_CONTEXT_MISSING", "No seller selected")),
        )
        .mount(&server)
        .await;

    let (client, _) = client_for(&server).await;
    let err = client.export_csv(ExportKind::Invoices).await.unwrap_err();

    assert_eq!(err.redirect(), Some(Redirect::SellerSetup));
}
