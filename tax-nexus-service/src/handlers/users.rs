use crate::dtos::users::{role_template, CreateUserRequest, UpdateUserRequest, ROLE_TEMPLATES};
use crate::middleware::SellerContext;
use crate::services::Store;
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
use nexus_core::models::User;
use serde_json::json;
use uuid::Uuid;

fn template_permissions(role: &str) -> Vec<String> {
    role_template(role)
        .map(|t| t.permissions.iter().map(|p| p.to_string()).collect())
        .unwrap_or_default()
}

/// Emails are unique across every seller.
async fn ensure_email_free(store: &Store, email: &str, except_id: Option<&str>) -> Result<(), AppError> {
    match store.users.find_one(None, "email", email).await? {
        Some(existing) if Some(existing.id.as_str()) != except_id => Err(AppError::Conflict(
            anyhow::anyhow!("A user with email {} already exists", email),
        )),
        _ => Ok(()),
    }
}

pub async fn list_users(
    State(state): State<AppState>,
    seller: SellerContext,
) -> Result<impl IntoResponse, AppError> {
    let users = state.store.users.list(&seller.seller_id).await?;
    Ok(Json(json!({
        "success": true,
        "count": users.len(),
        "users": users,
    })))
}

pub async fn role_templates() -> impl IntoResponse {
    Json(json!({ "success": true, "templates": ROLE_TEMPLATES }))
}

pub async fn create_user(
    State(state): State<AppState>,
    seller: SellerContext,
    ValidatedJson(request): ValidatedJson<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let email = request.email.trim().to_lowercase();
    ensure_email_free(&state.store, &email, None).await?;

    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4().to_string(),
        seller_id: seller.seller_id,
        name: request.name.trim().to_string(),
        email,
        permissions: request
            .permissions
            .unwrap_or_else(|| template_permissions(&request.role)),
        role: request.role,
        active: request.active.unwrap_or(true),
        created_at: now,
        updated_at: now,
    };
    state.store.users.insert(&user).await?;

    tracing::info!(user_id = %user.id, role = %user.role, "User created");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "user": user })),
    ))
}

pub async fn get_user(
    State(state): State<AppState>,
    seller: SellerContext,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .store
        .users
        .get(&seller.seller_id, &id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;
    Ok(Json(json!({ "success": true, "user": user })))
}

pub async fn update_user(
    State(state): State<AppState>,
    seller: SellerContext,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut user = state
        .store
        .users
        .get(&seller.seller_id, &id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    if let Some(email) = request.email {
        let email = email.trim().to_lowercase();
        ensure_email_free(&state.store, &email, Some(&user.id)).await?;
        user.email = email;
    }
    if let Some(name) = request.name {
        user.name = name.trim().to_string();
    }
    match (request.role, request.permissions) {
        (Some(role), None) => {
            user.permissions = template_permissions(&role);
            user.role = role;
        }
        (role, Some(permissions)) => {
            if let Some(role) = role {
                user.role = role;
            }
            user.permissions = permissions;
        }
        (None, None) => {}
    }
    if let Some(active) = request.active {
        user.active = active;
    }
    user.updated_at = Utc::now();

    state.store.users.replace(&user).await?;
    Ok(Json(json!({ "success": true, "user": user })))
}

pub async fn delete_user(
    State(state): State<AppState>,
    seller: SellerContext,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if !state.store.users.delete(&seller.seller_id, &id).await? {
        return Err(AppError::not_found("User"));
    }
    Ok(Json(json!({ "success": true, "message": "User deleted" })))
}
