//! FBR credentials and submission records.
//!
//! Nothing here talks to FBR; results obtained elsewhere are recorded
//! through `update_submission`.

use crate::dtos::settings::{FbrSettingsRequest, FbrSettingsView, FbrSubmissionUpdate};
use crate::middleware::SellerContext;
use crate::startup::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use nexus_core::error::AppError;
use nexus_core::extract::ValidatedJson;
use nexus_core::models::{FbrApiSettings, FbrStatus};
use serde_json::json;

pub async fn get_fbr_settings(
    State(state): State<AppState>,
    seller: SellerContext,
) -> Result<impl IntoResponse, AppError> {
    let stored = state
        .store
        .fbr_settings
        .get(&seller.seller_id, &seller.seller_id)
        .await?;
    Ok(Json(json!({
        "success": true,
        "settings": FbrSettingsView::from(stored.as_ref()),
    })))
}

pub async fn put_fbr_settings(
    State(state): State<AppState>,
    seller: SellerContext,
    ValidatedJson(request): ValidatedJson<FbrSettingsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let existing = state
        .store
        .fbr_settings
        .get(&seller.seller_id, &seller.seller_id)
        .await?;
    let is_new = existing.is_none();

    let mut settings = existing.unwrap_or_else(|| FbrApiSettings {
        id: seller.seller_id.clone(),
        ..Default::default()
    });
    request.apply_to(&mut settings, Utc::now());

    if is_new {
        state.store.fbr_settings.insert(&settings).await?;
    } else {
        state.store.fbr_settings.replace(&settings).await?;
    }

    tracing::info!(environment = ?settings.environment, "FBR API settings updated");

    Ok(Json(json!({
        "success": true,
        "settings": FbrSettingsView::from(Some(&settings)),
    })))
}

/// Whether the active environment has a token. No call to FBR is made.
pub async fn fbr_auth_status(
    State(state): State<AppState>,
    seller: SellerContext,
) -> Result<impl IntoResponse, AppError> {
    let stored = state
        .store
        .fbr_settings
        .get(&seller.seller_id, &seller.seller_id)
        .await?;
    let environment = stored.as_ref().map(|s| s.environment).unwrap_or_default();
    let configured = stored.as_ref().is_some_and(|s| s.active_token_configured());
    let message = if configured {
        "FBR token configured"
    } else {
        "No FBR token configured for the active environment"
    };

    Ok(Json(json!({
        "success": true,
        "environment": environment,
        "configured": configured,
        "message": message,
    })))
}

pub async fn list_pending(
    State(state): State<AppState>,
    seller: SellerContext,
) -> Result<impl IntoResponse, AppError> {
    let pending: Vec<_> = state
        .store
        .fbr_invoices
        .list(&seller.seller_id)
        .await?
        .into_iter()
        .filter(|s| s.status == FbrStatus::Pending)
        .collect();

    Ok(Json(json!({
        "success": true,
        "count": pending.len(),
        "invoices": pending,
    })))
}

pub async fn list_submissions(
    State(state): State<AppState>,
    seller: SellerContext,
) -> Result<impl IntoResponse, AppError> {
    let submissions = state.store.fbr_invoices.list(&seller.seller_id).await?;
    Ok(Json(json!({
        "success": true,
        "count": submissions.len(),
        "submissions": submissions,
    })))
}

pub async fn update_submission(
    State(state): State<AppState>,
    seller: SellerContext,
    Path(id): Path<String>,
    ValidatedJson(update): ValidatedJson<FbrSubmissionUpdate>,
) -> Result<impl IntoResponse, AppError> {
    let mut submission = state
        .store
        .fbr_invoices
        .get(&seller.seller_id, &id)
        .await?
        .ok_or_else(|| AppError::not_found("FBR submission"))?;

    let now = Utc::now();
    if update.status != FbrStatus::Pending && submission.submitted_at.is_none() {
        submission.submitted_at = Some(now);
    }
    submission.status = update.status;
    submission.irn = update.irn.or(submission.irn);
    submission.uuid = update.uuid.or(submission.uuid);
    submission.qr_payload = update.qr_payload.or(submission.qr_payload);
    submission.error_message = update.error_message;
    submission.updated_at = now;

    state.store.fbr_invoices.replace(&submission).await?;

    tracing::info!(
        submission_id = %submission.id,
        status = submission.status.as_str(),
        "FBR submission recorded"
    );

    Ok(Json(json!({ "success": true, "submission": submission })))
}
