use crate::middleware::SellerContext;
use crate::startup::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use nexus_core::error::AppError;
use nexus_core::models::{FbrStatus, InvoiceStatus, TaskStatus};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;

const RECENT_INVOICES: usize = 5;

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct InvoiceStats {
    total: usize,
    pending: usize,
    paid: usize,
    overdue: usize,
    cancelled: usize,
    total_value: Decimal,
    sales_tax: Decimal,
    final_value: Decimal,
    outstanding: Decimal,
}

pub async fn dashboard_stats(
    State(state): State<AppState>,
    seller: SellerContext,
) -> Result<impl IntoResponse, AppError> {
    let seller_id = seller.seller_id.as_str();
    let invoices = state.store.invoices.list(seller_id).await?;
    let clients = state.store.clients.list(seller_id).await?;
    let submissions = state.store.fbr_invoices.list(seller_id).await?;
    let tasks = state.store.tasks.list(seller_id).await?;

    let mut stats = InvoiceStats {
        total: invoices.len(),
        ..Default::default()
    };
    for invoice in invoices.iter().filter(|i| i.status != InvoiceStatus::Cancelled) {
        stats.total_value += invoice.totals.total_value;
        stats.sales_tax += invoice.totals.sales_tax;
        stats.final_value += invoice.totals.final_value;
    }
    for invoice in &invoices {
        match invoice.status {
            InvoiceStatus::Pending => {
                stats.pending += 1;
                stats.outstanding += invoice.totals.final_value;
            }
            InvoiceStatus::Overdue => {
                stats.overdue += 1;
                stats.outstanding += invoice.totals.final_value;
            }
            InvoiceStatus::Paid => stats.paid += 1,
            InvoiceStatus::Cancelled => stats.cancelled += 1,
        }
    }

    let fbr_count = |status: FbrStatus| submissions.iter().filter(|s| s.status == status).count();
    let open_tasks = tasks.iter().filter(|t| t.status != TaskStatus::Done).count();
    let recent: Vec<_> = invoices.iter().take(RECENT_INVOICES).collect();

    Ok(Json(json!({
        "success": true,
        "stats": {
            "invoices": stats,
            "clients": clients.len(),
            "fbr": {
                "pending": fbr_count(FbrStatus::Pending),
                "submitted": fbr_count(FbrStatus::Submitted),
                "accepted": fbr_count(FbrStatus::Accepted),
                "rejected": fbr_count(FbrStatus::Rejected),
            },
            "openTasks": open_tasks,
            "recentInvoices": recent,
        },
    })))
}
