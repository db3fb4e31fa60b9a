use super::attachment;
use crate::dtos::invoices::{BulkInvoiceRequest, CreateInvoiceRequest, InvoiceListParams, StatusUpdate};
use crate::middleware::SellerContext;
use crate::services::create_invoice;
use crate::services::metrics::record_pdf_render;
use crate::services::Store;
use crate::startup::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use nexus_core::error::AppError;
use nexus_core::extract::ValidatedJson;
use nexus_core::models::{Client, Invoice, SellerSettings};
use nexus_documents::{render_invoice, QrPayload};
use serde_json::json;

pub async fn list_invoices(
    State(state): State<AppState>,
    seller: SellerContext,
    Query(params): Query<InvoiceListParams>,
) -> Result<impl IntoResponse, AppError> {
    let invoices: Vec<Invoice> = state
        .store
        .invoices
        .list(&seller.seller_id)
        .await?
        .into_iter()
        .filter(|i| params.status.map_or(true, |s| i.status == s))
        .filter(|i| {
            params
                .client_id
                .as_deref()
                .map_or(true, |c| i.client_id.as_deref() == Some(c))
        })
        .collect();

    Ok(Json(json!({
        "success": true,
        "count": invoices.len(),
        "invoices": invoices,
    })))
}

pub async fn create(
    State(state): State<AppState>,
    seller: SellerContext,
    ValidatedJson(request): ValidatedJson<CreateInvoiceRequest>,
) -> Result<impl IntoResponse, AppError> {
    let invoice = create_invoice(&state.store, &seller.seller_id, request, "api").await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "invoice": invoice })),
    ))
}

async fn find_invoice(store: &Store, seller_id: &str, id: &str) -> Result<Invoice, AppError> {
    store
        .invoices
        .get(seller_id, id)
        .await?
        .ok_or_else(|| AppError::not_found("Invoice"))
}

/// The invoice's buyer and the seller profile, when they exist.
async fn parties(
    store: &Store,
    seller_id: &str,
    invoice: &Invoice,
) -> Result<(Option<Client>, Option<SellerSettings>), AppError> {
    let buyer = match invoice.client_id.as_deref() {
        Some(client_id) => store.clients.get(seller_id, client_id).await?,
        None => None,
    };
    let seller = store.sellers.get(seller_id, seller_id).await?;
    Ok((buyer, seller))
}

pub async fn get_invoice(
    State(state): State<AppState>,
    seller: SellerContext,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let invoice = find_invoice(&state.store, &seller.seller_id, &id).await?;
    let buyer = match invoice.client_id.as_deref() {
        Some(client_id) => state.store.clients.get(&seller.seller_id, client_id).await?,
        None => None,
    };
    Ok(Json(json!({
        "success": true,
        "invoice": invoice,
        "client": buyer,
    })))
}

pub async fn update_status(
    State(state): State<AppState>,
    seller: SellerContext,
    Path(id): Path<String>,
    ValidatedJson(update): ValidatedJson<StatusUpdate>,
) -> Result<impl IntoResponse, AppError> {
    let mut invoice = find_invoice(&state.store, &seller.seller_id, &id).await?;
    invoice.status = update.status;
    invoice.recompute_totals();
    invoice.updated_at = Utc::now();
    state.store.invoices.replace(&invoice).await?;

    tracing::info!(invoice_id = %invoice.id, status = invoice.status.as_str(), "Invoice status updated");

    Ok(Json(json!({ "success": true, "invoice": invoice })))
}

/// Render on the blocking pool and wrap the bytes as a download.
pub(crate) async fn pdf_response(
    invoice: Invoice,
    buyer: Option<Client>,
    seller: Option<SellerSettings>,
) -> Result<Response, AppError> {
    let rendered = tokio::task::spawn_blocking(move || {
        render_invoice(&invoice, buyer.as_ref(), seller.as_ref())
    })
    .await
    .map_err(|e| AppError::RenderError(anyhow::Error::new(e)))?;

    match rendered {
        Ok(rendered) => {
            record_pdf_render("ok");
            Ok(attachment("application/pdf", &rendered.filename, rendered.bytes))
        }
        Err(e) => {
            record_pdf_render("error");
            Err(AppError::RenderError(anyhow::Error::new(e)))
        }
    }
}

pub async fn invoice_pdf(
    State(state): State<AppState>,
    seller: SellerContext,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let invoice = find_invoice(&state.store, &seller.seller_id, &id).await?;
    let (buyer, seller_settings) = parties(&state.store, &seller.seller_id, &invoice).await?;
    pdf_response(invoice, buyer, seller_settings).await
}

pub async fn invoice_qr(
    State(state): State<AppState>,
    seller: SellerContext,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let invoice = find_invoice(&state.store, &seller.seller_id, &id).await?;
    let (buyer, seller_settings) = parties(&state.store, &seller.seller_id, &invoice).await?;

    let payload = QrPayload::new(&invoice, buyer.as_ref(), seller_settings.as_ref());
    let png = payload
        .png_base64()
        .map_err(|e| AppError::InternalError(anyhow::Error::new(e)))?;

    Ok(Json(json!({
        "success": true,
        "payload": payload,
        "image": format!("data:image/png;base64,{}", png),
    })))
}

/// Accept an upload and process it in the background. Poll
/// `GET /api/invoices/bulk/:job_id` for progress.
pub async fn create_bulk(
    State(state): State<AppState>,
    seller: SellerContext,
    ValidatedJson(request): ValidatedJson<BulkInvoiceRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.store.seller_settings(&seller.seller_id).await?;

    let job = state
        .jobs
        .submit(state.store.clone(), &seller.seller_id, request.invoices);

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "success": true,
            "job": job,
            "message": "Bulk upload accepted",
        })),
    ))
}

pub async fn get_bulk_job(
    State(state): State<AppState>,
    seller: SellerContext,
    Path(job_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let job = state
        .jobs
        .get(&seller.seller_id, &job_id)
        .ok_or_else(|| AppError::not_found("Bulk job"))?;
    Ok(Json(json!({ "success": true, "job": job })))
}
