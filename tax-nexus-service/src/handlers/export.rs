use super::attachment;
use crate::dtos::invoices::ExportParams;
use crate::middleware::SellerContext;
use crate::services::metrics::record_csv_export;
use crate::startup::AppState;
use axum::{
    extract::{Query, State},
    response::Response,
};
use chrono::Utc;
use nexus_core::error::AppError;
use nexus_documents::csv::{client_columns, fbr_columns, invoice_columns};
use nexus_documents::{build_csv, ExportKind, InvoiceExportRow};
use std::collections::HashMap;

const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

/// `GET /api/export/excel?type=invoices|clients|fbr`, default invoices.
pub async fn export_csv(
    State(state): State<AppState>,
    seller: SellerContext,
    Query(params): Query<ExportParams>,
) -> Result<Response, AppError> {
    let kind = params.kind.unwrap_or(ExportKind::Invoices);
    let seller_id = seller.seller_id.as_str();

    let body = match kind {
        ExportKind::Invoices => {
            let invoices = state.store.invoices.list(seller_id).await?;
            let clients = state.store.clients.list(seller_id).await?;
            let submissions = state.store.fbr_invoices.list(seller_id).await?;

            let clients_by_id: HashMap<&str, _> =
                clients.iter().map(|c| (c.id.as_str(), c)).collect();
            let fbr_by_invoice: HashMap<&str, _> = submissions
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
        ExportKind::Clients => {
            let clients = state.store.clients.list(seller_id).await?;
            build_csv(&clients, &client_columns())
        }
        ExportKind::Fbr => {
            let submissions = state.store.fbr_invoices.list(seller_id).await?;
            build_csv(&submissions, &fbr_columns())
        }
    };

    record_csv_export(kind.as_str());
    tracing::info!(kind = kind.as_str(), bytes = body.len(), "CSV export generated");

    Ok(attachment(
        CSV_CONTENT_TYPE,
        &kind.filename(Utc::now().date_naive()),
        body.into_bytes(),
    ))
}
