use super::invoices::pdf_response;
use crate::dtos::invoices::RenderInvoiceRequest;
use crate::middleware::SellerContext;
use crate::startup::AppState;
use axum::{extract::State, response::Response};
use nexus_core::error::AppError;
use nexus_core::extract::ValidatedJson;

/// Render a posted invoice without storing it. A missing seller block falls
/// back to the caller's stored profile.
pub async fn render_posted_invoice(
    State(state): State<AppState>,
    seller: SellerContext,
    ValidatedJson(request): ValidatedJson<RenderInvoiceRequest>,
) -> Result<Response, AppError> {
    let seller_settings = match request.seller {
        Some(settings) => Some(settings),
        None => {
            state
                .store
                .sellers
                .get(&seller.seller_id, &seller.seller_id)
                .await?
        }
    };

    let mut invoice = request.invoice;
    invoice.recompute_totals();

    pdf_response(invoice, request.buyer, seller_settings).await
}
