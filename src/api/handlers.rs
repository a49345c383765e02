use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::db::Database;
use crate::error::Error;
use crate::models::*;

// ============================================================
// Error Handling
// ============================================================

/// Map a command error onto an HTTP response. Validation, not-found and
/// conflict messages are safe to expose; storage errors are logged
/// server-side and sanitized for the client.
fn error_response(e: Error) -> (StatusCode, String) {
    match e {
        Error::Validation(_) => (StatusCode::BAD_REQUEST, e.to_string()),
        Error::NotFound(_) => (StatusCode::NOT_FOUND, e.to_string()),
        Error::Conflict(_) => (StatusCode::CONFLICT, e.to_string()),
        Error::Corrupt(msg) => {
            tracing::error!("Corrupt stored data: {}", msg);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        }
        Error::Database(err) => {
            tracing::error!("Database error: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        }
    }
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Tasks
// ============================================================

pub async fn list_tasks(
    State(db): State<Database>,
    Query(filter): Query<TaskFilter>,
) -> Result<Json<Vec<TaskView>>, (StatusCode, String)> {
    let tasks = db.list_tasks(filter).map_err(error_response)?;
    let today = today();
    Ok(Json(
        tasks.into_iter().map(|t| TaskView::new(t, today)).collect(),
    ))
}

pub async fn get_task(
    State(db): State<Database>,
    Path(id): Path<i64>,
) -> Result<Json<TaskView>, (StatusCode, String)> {
    db.get_task(id)
        .map_err(error_response)?
        .map(|t| Json(TaskView::new(t, today())))
        .ok_or((StatusCode::NOT_FOUND, format!("task {} not found", id)))
}

pub async fn create_task(
    State(db): State<Database>,
    Json(input): Json<TaskInput>,
) -> Result<(StatusCode, Json<Task>), (StatusCode, String)> {
    db.create_task(input)
        .map(|t| (StatusCode::CREATED, Json(t)))
        .map_err(error_response)
}

pub async fn update_task(
    State(db): State<Database>,
    Path(id): Path<i64>,
    Json(input): Json<TaskInput>,
) -> Result<Json<Task>, (StatusCode, String)> {
    db.update_task(id, input).map(Json).map_err(error_response)
}

/// Always 204: the delete confirmation happens in the UI, and re-deleting an
/// already-deleted task must not surface an error there.
pub async fn delete_task(
    State(db): State<Database>,
    Path(id): Path<i64>,
) -> Result<StatusCode, (StatusCode, String)> {
    db.delete_task(id).map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn change_status(
    State(db): State<Database>,
    Path(id): Path<i64>,
    Json(input): Json<ChangeStatusInput>,
) -> Result<Json<Task>, (StatusCode, String)> {
    db.change_status(id, input.status)
        .map(Json)
        .map_err(error_response)
}

pub async fn toggle_sprint(
    State(db): State<Database>,
    Path(id): Path<i64>,
) -> Result<Json<Task>, (StatusCode, String)> {
    db.toggle_sprint(id).map(Json).map_err(error_response)
}

// ============================================================
// Sprint
// ============================================================

pub async fn sprint_status(
    State(db): State<Database>,
) -> Result<Json<SprintStatus>, (StatusCode, String)> {
    let window = db.sprint_window().map_err(error_response)?;
    let workload = db.workload_summary().map_err(error_response)?;
    Ok(Json(SprintStatus { window, workload }))
}

pub async fn start_sprint(
    State(db): State<Database>,
    Json(input): Json<StartSprintInput>,
) -> Result<(StatusCode, Json<SprintWindow>), (StatusCode, String)> {
    db.start_sprint(input)
        .map(|w| (StatusCode::CREATED, Json(w)))
        .map_err(error_response)
}

pub async fn close_sprint(
    State(db): State<Database>,
) -> Result<StatusCode, (StatusCode, String)> {
    db.close_sprint().map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================
// Search
// ============================================================

/// Query parameters for searching tasks.
#[derive(Debug, Deserialize)]
pub struct SearchTasksQuery {
    /// Whitespace-separated tokens; every token must match as a phrase.
    #[serde(default)]
    pub q: String,
}

pub async fn search_tasks(
    State(db): State<Database>,
    Query(query): Query<SearchTasksQuery>,
) -> Result<Json<Vec<TaskView>>, (StatusCode, String)> {
    let tasks = db.search_tasks(&query.q).map_err(error_response)?;
    let today = today();
    Ok(Json(
        tasks.into_iter().map(|t| TaskView::new(t, today)).collect(),
    ))
}
