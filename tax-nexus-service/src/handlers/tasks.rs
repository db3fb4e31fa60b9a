use crate::dtos::tasks::{CreateTaskRequest, TaskListParams, UpdateTaskRequest};
use crate::middleware::SellerContext;
use crate::startup::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use nexus_core::error::AppError;
use nexus_core::extract::ValidatedJson;
use nexus_core::models::Task;
use serde_json::json;
use uuid::Uuid;

pub async fn list_tasks(
    State(state): State<AppState>,
    seller: SellerContext,
    Query(params): Query<TaskListParams>,
) -> Result<impl IntoResponse, AppError> {
    let tasks: Vec<Task> = state
        .store
        .tasks
        .list(&seller.seller_id)
        .await?
        .into_iter()
        .filter(|t| params.status.map_or(true, |s| t.status == s))
        .collect();

    Ok(Json(json!({
        "success": true,
        "count": tasks.len(),
        "tasks": tasks,
    })))
}

pub async fn create_task(
    State(state): State<AppState>,
    seller: SellerContext,
    ValidatedJson(request): ValidatedJson<CreateTaskRequest>,
) -> Result<impl IntoResponse, AppError> {
    let now = Utc::now();
    let task = Task {
        id: Uuid::new_v4().to_string(),
        seller_id: seller.seller_id,
        title: request.title.trim().to_string(),
        description: request.description,
        status: request.status.unwrap_or_default(),
        priority: request.priority.unwrap_or_default(),
        due_date: request.due_date,
        assigned_to: request.assigned_to,
        client_id: request.client_id,
        created_at: now,
        updated_at: now,
    };
    state.store.tasks.insert(&task).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "task": task })),
    ))
}

pub async fn update_task(
    State(state): State<AppState>,
    seller: SellerContext,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdateTaskRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut task = state
        .store
        .tasks
        .get(&seller.seller_id, &id)
        .await?
        .ok_or_else(|| AppError::not_found("Task"))?;

    if let Some(title) = request.title {
        task.title = title.trim().to_string();
    }
    if request.description.is_some() {
        task.description = request.description;
    }
    if let Some(status) = request.status {
        task.status = status;
    }
    if let Some(priority) = request.priority {
        task.priority = priority;
    }
    if request.due_date.is_some() {
        task.due_date = request.due_date;
    }
    if request.assigned_to.is_some() {
        task.assigned_to = request.assigned_to;
    }
    if request.client_id.is_some() {
        task.client_id = request.client_id;
    }
    task.updated_at = Utc::now();

    state.store.tasks.replace(&task).await?;
    Ok(Json(json!({ "success": true, "task": task })))
}

pub async fn delete_task(
    State(state): State<AppState>,
    seller: SellerContext,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if !state.store.tasks.delete(&seller.seller_id, &id).await? {
        return Err(AppError::not_found("Task"));
    }
    Ok(Json(json!({ "success": true, "message": "Task deleted" })))
}
