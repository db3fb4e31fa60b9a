use crate::dtos::catalog::ServiceItemRequest;
use crate::middleware::SellerContext;
use crate::startup::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use nexus_core::error::AppError;
use nexus_core::extract::ValidatedJson;
use nexus_core::models::ServiceItem;
use serde_json::json;
use uuid::Uuid;

pub async fn list_services(
    State(state): State<AppState>,
    seller: SellerContext,
) -> Result<impl IntoResponse, AppError> {
    let services = state.store.services.list(&seller.seller_id).await?;
    Ok(Json(json!({
        "success": true,
        "count": services.len(),
        "services": services,
    })))
}

pub async fn create_service(
    State(state): State<AppState>,
    seller: SellerContext,
    ValidatedJson(request): ValidatedJson<ServiceItemRequest>,
) -> Result<impl IntoResponse, AppError> {
    let service = ServiceItem {
        id: Uuid::new_v4().to_string(),
        seller_id: seller.seller_id,
        name: request.name.trim().to_string(),
        description: request.description(),
        hs_code: request.hs_code.clone(),
        uom: request.uom(),
        unit_price: request.unit_price,
        sales_tax_rate: request.sales_tax_rate,
        created_at: Utc::now(),
    };
    state.store.services.insert(&service).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "service": service })),
    ))
}

pub async fn get_service(
    State(state): State<AppState>,
    seller: SellerContext,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let service = state
        .store
        .services
        .get(&seller.seller_id, &id)
        .await?
        .ok_or_else(|| AppError::not_found("Service"))?;
    Ok(Json(json!({ "success": true, "service": service })))
}

pub async fn delete_service(
    State(state): State<AppState>,
    seller: SellerContext,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if !state.store.services.delete(&seller.seller_id, &id).await? {
        return Err(AppError::not_found("Service"));
    }
    Ok(Json(json!({ "success": true, "message": "Service deleted" })))
}
