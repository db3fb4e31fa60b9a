use crate::dtos::clients::ClientRequest;
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
use serde_json::json;
use uuid::Uuid;

pub async fn list_clients(
    State(state): State<AppState>,
    seller: SellerContext,
) -> Result<impl IntoResponse, AppError> {
    let clients = state.store.clients.list(&seller.seller_id).await?;
    Ok(Json(json!({
        "success": true,
        "count": clients.len(),
        "clients": clients,
    })))
}

pub async fn create_client(
    State(state): State<AppState>,
    seller: SellerContext,
    ValidatedJson(request): ValidatedJson<ClientRequest>,
) -> Result<impl IntoResponse, AppError> {
    let client = request.into_client(Uuid::new_v4().to_string(), &seller.seller_id, Utc::now());
    state.store.clients.insert(&client).await?;

    tracing::info!(client_id = %client.id, "Client created");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "client": client })),
    ))
}

pub async fn get_client(
    State(state): State<AppState>,
    seller: SellerContext,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let client = state
        .store
        .clients
        .get(&seller.seller_id, &id)
        .await?
        .ok_or_else(|| AppError::not_found("Client"))?;
    Ok(Json(json!({ "success": true, "client": client })))
}

pub async fn update_client(
    State(state): State<AppState>,
    seller: SellerContext,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<ClientRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut client = state
        .store
        .clients
        .get(&seller.seller_id, &id)
        .await?
        .ok_or_else(|| AppError::not_found("Client"))?;

    request.apply_to(&mut client, Utc::now());
    if !state.store.clients.replace(&client).await? {
        return Err(AppError::not_found("Client"));
    }

    Ok(Json(json!({ "success": true, "client": client })))
}

pub async fn delete_client(
    State(state): State<AppState>,
    seller: SellerContext,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if !state.store.clients.delete(&seller.seller_id, &id).await? {
        return Err(AppError::not_found("Client"));
    }

    tracing::info!(client_id = %id, "Client deleted");
    Ok(Json(json!({ "success": true, "message": "Client deleted" })))
}
