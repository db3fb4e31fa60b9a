use chrono::NaiveDate;
use nexus_core::models::{TaskPriority, TaskStatus};
use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "Task title is required"))]
    pub title: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<NaiveDate>,
    pub assigned_to: Option<String>,
    pub client_id: Option<String>,
}

/// Partial update; absent fields are left alone.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<NaiveDate>,
    pub assigned_to: Option<String>,
    pub client_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskListParams {
    pub status: Option<TaskStatus>,
}
