mod common;

use common::TestApp;

const BOM: &str = "\u{feff}";

#[tokio::test]
async fn empty_invoice_export_is_bom_and_header() {
    let app = TestApp::spawn().await;
    let response = app.get("/api/export/excel").await;

    assert!(response.status().is_success());
    assert_eq!(response.headers()["content-type"], "text/csv; charset=utf-8");
    let disposition = response.headers()["content-disposition"].to_str().unwrap().to_string();
    assert!(disposition.starts_with("attachment; filename=\"invoices_export_"));

    let body = response.text().await.unwrap();
    assert!(body.starts_with(BOM));
    assert!(!body.contains("\r\n"));
    assert!(body.contains("\"Invoice Number\""));
}

#[tokio::test]
async fn invoice_export_joins_client_and_fbr_status() {
    let app = TestApp::spawn().await;
    app.seed_seller().await;
    let client_id = app.seed_client().await;
    app.seed_invoice(&client_id).await;

    let body = app.get("/api/export/excel?type=invoices").await.text().await.unwrap();
    let lines: Vec<&str> = body.split("\r\n").collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[1].contains("\"INV-001\""));
    assert!(lines[1].contains("\"Acme Co\""));
    assert!(lines[1].contains("\"5900.00\""));
    assert!(lines[1].contains("\"pending\""));
}

#[tokio::test]
async fn client_export_uses_its_own_columns() {
    let app = TestApp::spawn().await;
    app.seed_client().await;

    let response = app.get("/api/export/excel?type=clients").await;
    let disposition = response.headers()["content-disposition"].to_str().unwrap().to_string();
    assert!(disposition.contains("clients_export_"));

    let body = response.text().await.unwrap();
    assert!(body.trim_start_matches(BOM).starts_with("\"Company Name\""));
    assert_eq!(body.split("\r\n").count(), 2);
}
