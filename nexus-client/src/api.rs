//! Typed calls against the Tax Nexus REST API.

use crate::config::ClientConfig;
use crate::error::{ClientError, Redirect};
use crate::session::SessionStore;
use chrono::Utc;
use nexus_core::error::{ErrorBody, ErrorCode};
use nexus_core::models::{
    BulkJob, Client, FbrSubmission, Invoice, InvoiceStatus, SellerSettings,
};
use nexus_core::observability::inject_trace_context;
use nexus_core::retry::{retry_with, RetryConfig};
use nexus_documents::csv::{client_columns, fbr_columns, invoice_columns};
use nexus_documents::{build_csv, ExportKind, InvoiceExportRow};
use reqwest::header::{HeaderMap, CONTENT_DISPOSITION};
use reqwest::{Method, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;

pub const SELLER_ID_HEADER: &str = "seller-id";

/// A file returned by a download endpoint or built locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: ClientConfig,
    session: SessionStore,
    retry: RetryConfig,
}

/// The download name from a Content-Disposition header. An RFC 6266
/// `filename*` wins over the plain `filename`.
fn attachment_filename(headers: &HeaderMap) -> Option<String> {
    let raw = std::str::from_utf8(headers.get(CONTENT_DISPOSITION)?.as_bytes()).ok()?;

    let mut plain = None;
    for (name, value) in disposition_params(raw) {
        if name.eq_ignore_ascii_case("filename*") {
            if let Some(decoded) = decode_ext_value(value) {
                return Some(decoded);
            }
        } else if name.eq_ignore_ascii_case("filename") && !value.is_empty() {
            plain = Some(value.to_string());
        }
    }
    plain
}

/// `name=value` pairs after the disposition type, quotes stripped.
fn disposition_params(raw: &str) -> Vec<(&str, &str)> {
    let mut parts = Vec::new();
    let mut quoted = false;
    let mut start = 0;
    for (i, c) in raw.char_indices() {
        match c {
            '"' => quoted = !quoted,
            ';' if !quoted => {
                parts.push(&raw[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&raw[start..]);

    parts
        .into_iter()
        .filter_map(|part| {
            let (name, value) = part.split_once('=')?;
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value);
            Some((name.trim(), value))
        })
        .collect()
}

/// `charset'language'pct-encoded`; only UTF-8 is accepted.
fn decode_ext_value(value: &str) -> Option<String> {
    let mut pieces = value.splitn(3, '\'');
    let charset = pieces.next()?;
    let _language = pieces.next()?;
    let encoded = pieces.next()?;
    if !charset.eq_ignore_ascii_case("utf-8") {
        return None;
    }
    urlencoding::decode(encoded)
        .ok()
        .map(|name| name.into_owned())
        .filter(|name| !name.is_empty())
}

fn field<T: DeserializeOwned>(path: &str, mut body: Value, key: &str) -> Result<T, ClientError> {
    let value = body.get_mut(key).map(Value::take).ok_or_else(|| ClientError::Decode {
        path: path.to_string(),
        message: format!("missing `{}`", key),
    })?;
    serde_json::from_value(value).map_err(|e| ClientError::Decode {
        path: path.to_string(),
        message: e.to_string(),
    })
}

impl ApiClient {
    pub fn new(config: ClientConfig, session: SessionStore) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClientError::Config(e.to_string()))?;
        let retry = RetryConfig::once_after(config.retry_delay);

        Ok(Self {
            http,
            config,
            session,
            retry,
        })
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    async fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        inject_trace_context(&mut headers);
        if let Some(seller_id) = self.session.seller_id().await {
            if let Ok(value) = seller_id.parse() {
                headers.insert(SELLER_ID_HEADER, value);
            }
        }
        headers
    }

    async fn send_once(
        &self,
        method: &Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Response, ClientError> {
        let url = format!("{}{}", self.config.base_url(), path);
        let mut request = self
            .http
            .request(method.clone(), &url)
            .headers(self.headers().await);
        if let Some(token) = self.session.token().await {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        request
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(path, e))
    }

    /// Send, retrying once on timeout, and turn error statuses into
    /// [`ClientError::Api`]. A login redirect clears the session.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Response, ClientError> {
        let response = retry_with(&self.retry, path, ClientError::is_timeout, || {
            self.send_once(&method, path, body)
        })
        .await?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let (code, message) = match serde_json::from_str::<ErrorBody>(&text) {
            Ok(body) => (body.code, body.error),
            Err(_) => (ErrorCode::Unknown, text),
        };
        let err = ClientError::Api {
            path: path.to_string(),
            status,
            code,
            message,
        };

        tracing::warn!(path, status = status.as_u16(), code = ?code, "API call failed");

        if err.redirect() == Some(Redirect::Login) {
            self.session.clear().await;
        }
        Err(err)
    }

    pub async fn request_json(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, ClientError> {
        self.send(method, path, body)
            .await?
            .json()
            .await
            .map_err(|e| ClientError::Decode {
                path: path.to_string(),
                message: e.to_string(),
            })
    }

    pub async fn get_json(&self, path: &str) -> Result<Value, ClientError> {
        self.request_json(Method::GET, path, None).await
    }

    async fn get_field<T: DeserializeOwned>(&self, path: &str, key: &str) -> Result<T, ClientError> {
        let body = self.get_json(path).await?;
        field(path, body, key)
    }

    async fn post_field<B, T>(&self, path: &str, body: &B, key: &str) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body).map_err(|e| ClientError::Decode {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        let response = self.request_json(Method::POST, path, Some(&body)).await?;
        field(path, response, key)
    }

    pub async fn seller_settings(&self) -> Result<SellerSettings, ClientError> {
        self.get_field("/api/seller-settings", "settings").await
    }

    pub async fn list_clients(&self) -> Result<Vec<Client>, ClientError> {
        self.get_field("/api/clients", "clients").await
    }

    pub async fn create_client<B: Serialize + ?Sized>(&self, body: &B) -> Result<Client, ClientError> {
        self.post_field("/api/clients", body, "client").await
    }

    pub async fn list_invoices(&self) -> Result<Vec<Invoice>, ClientError> {
        self.get_field("/api/invoices", "invoices").await
    }

    pub async fn get_invoice(&self, id: &str) -> Result<Invoice, ClientError> {
        self.get_field(&format!("/api/invoices/{}", id), "invoice").await
    }

    pub async fn create_invoice<B: Serialize + ?Sized>(&self, body: &B) -> Result<Invoice, ClientError> {
        self.post_field("/api/invoices", body, "invoice").await
    }

    pub async fn update_invoice_status(
        &self,
        id: &str,
        status: InvoiceStatus,
    ) -> Result<Invoice, ClientError> {
        let path = format!("/api/invoices/{}/status", id);
        let body = json!({ "status": status });
        let response = self.request_json(Method::PATCH, &path, Some(&body)).await?;
        field(&path, response, "invoice")
    }

    pub async fn list_fbr_submissions(&self) -> Result<Vec<FbrSubmission>, ClientError> {
        self.get_field("/api/fbrinvoices/submissions", "submissions").await
    }

    pub async fn dashboard_stats(&self) -> Result<Value, ClientError> {
        self.get_field("/api/dashboard/stats", "stats").await
    }

    pub async fn download_invoice_pdf(&self, id: &str) -> Result<DownloadedFile, ClientError> {
        let path = format!("/api/invoices/{}/pdf", id);
        self.download(&path, format!("Invoice_{}.pdf", id)).await
    }

    async fn download(&self, path: &str, fallback_name: String) -> Result<DownloadedFile, ClientError> {
        let response = self.send(Method::GET, path, None).await?;
        let filename = attachment_filename(response.headers()).unwrap_or(fallback_name);
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ClientError::from_reqwest(path, e))?;
        Ok(DownloadedFile {
            filename,
            bytes: bytes.to_vec(),
        })
    }

    pub async fn submit_bulk<B: Serialize>(&self, invoices: &[B]) -> Result<BulkJob, ClientError> {
        self.post_field("/api/invoices/bulk", &json!({ "invoices": invoices }), "job")
            .await
    }

    pub async fn bulk_job(&self, job_id: &str) -> Result<BulkJob, ClientError> {
        self.get_field(&format!("/api/invoices/bulk/{}", job_id), "job")
            .await
    }

    /// Poll a bulk job every `poll_interval` until it finishes, the attempt
    /// budget runs out, or `cancel` fires.
    pub async fn wait_for_job(
        &self,
        job_id: &str,
        cancel: &CancellationToken,
    ) -> Result<BulkJob, ClientError> {
        for attempt in 1..=self.config.max_poll_attempts {
            let job = self.bulk_job(job_id).await?;
            if job.status.is_terminal() {
                tracing::info!(job_id, attempt, status = ?job.status, "Bulk job finished");
                return Ok(job);
            }

            tokio::select! {
                _ = cancel.cancelled() => return Err(ClientError::Cancelled),
                _ = tokio::time::sleep(self.config.poll_interval) => {}
            }
        }

        Err(ClientError::JobTimedOut {
            job_id: job_id.to_string(),
            attempts: self.config.max_poll_attempts,
        })
    }

    /// Download a CSV export, building it locally from the list endpoints
    /// when the export endpoint is unavailable.
    pub async fn export_csv(&self, kind: ExportKind) -> Result<DownloadedFile, ClientError> {
        let path = format!("/api/export/excel?type={}", kind.as_str());
        let filename = kind.filename(Utc::now().date_naive());

        match self.download(&path, filename.clone()).await {
            Ok(file) => Ok(file),
            Err(e) if e.endpoint_unavailable() => {
                tracing::warn!(kind = kind.as_str(), error = %e, "Export endpoint unavailable, building CSV locally");
                let csv = self.build_local_csv(kind).await?;
                Ok(DownloadedFile {
                    filename,
                    bytes: csv.into_bytes(),
                })
            }
            Err(e) => Err(e),
        }
    }

    async fn build_local_csv(&self, kind: ExportKind) -> Result<String, ClientError> {
        Ok(match kind {
            ExportKind::Invoices => {
                let invoices = self.list_invoices().await?;
                let clients = self.list_clients().await?;
                let submissions = self.list_fbr_submissions().await?;

                let clients_by_id: HashMap<&str, &Client> =
                    clients.iter().map(|c| (c.id.as_str(), c)).collect();
                let fbr_by_invoice: HashMap<&str, &FbrSubmission> = submissions
                    .iter()
                    .map(|s| (s.invoice_id.as_str(), s))
                    .collect();

                let rows: Vec<InvoiceExportRow<'_>> = invoices
                    .iter()
                    .map(|invoice| InvoiceExportRow {
                        invoice,
                        client: invoice
                            .client_id
                            .as_deref()
                            .and_then(|id| clients_by_id.get(id).copied()),
                        fbr: fbr_by_invoice.get(invoice.id.as_str()).copied(),
                    })
                    .collect();
                build_csv(&rows, &invoice_columns())
            }
            ExportKind::Clients => build_csv(&self.list_clients().await?, &client_columns()),
            ExportKind::Fbr => build_csv(&self.list_fbr_submissions().await?, &fbr_columns()),
        })
    }
}
