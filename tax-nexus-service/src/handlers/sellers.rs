use crate::dtos::settings::SellerSettingsRequest;
use crate::middleware::SellerContext;
use crate::startup::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use nexus_core::error::AppError;
use nexus_core::extract::ValidatedJson;
use nexus_core::models::SellerSettings;
use serde_json::json;
use uuid::Uuid;

/// Every registered seller. Not seller-scoped; used by the seller picker.
pub async fn list_sellers(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let sellers = state.store.sellers.list_all().await?;
    Ok(Json(json!({
        "success": true,
        "count": sellers.len(),
        "sellers": sellers,
    })))
}

pub async fn register_seller(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<SellerSettingsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let now = Utc::now();
    let mut seller = SellerSettings {
        id: Uuid::new_v4().to_string(),
        created_at: now,
        ..Default::default()
    };
    request.apply_to(&mut seller, now);
    state.store.sellers.insert(&seller).await?;

    tracing::info!(seller_id = %seller.id, "Seller registered");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "seller": seller })),
    ))
}

pub async fn get_seller_settings(
    State(state): State<AppState>,
    seller: SellerContext,
) -> Result<impl IntoResponse, AppError> {
    let settings = state.store.seller_settings(&seller.seller_id).await?;
    Ok(Json(json!({ "success": true, "settings": settings })))
}

/// Create or overwrite the calling seller's profile.
pub async fn put_seller_settings(
    State(state): State<AppState>,
    seller: SellerContext,
    ValidatedJson(request): ValidatedJson<SellerSettingsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let now = Utc::now();
    let existing = state
        .store
        .sellers
        .get(&seller.seller_id, &seller.seller_id)
        .await?;
    let is_new = existing.is_none();

    let mut settings = existing.unwrap_or_else(|| SellerSettings {
        id: seller.seller_id.clone(),
        created_at: now,
        ..Default::default()
    });
    request.apply_to(&mut settings, now);

    if is_new {
        state.store.sellers.insert(&settings).await?;
    } else {
        state.store.sellers.replace(&settings).await?;
    }

    let status = if is_new {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(json!({ "success": true, "settings": settings }))))
}
