//! Label endpoints. Attaching or detaching a label on a task also spawns a
//! best-effort push to the linked forge issue; the HTTP response never
//! waits on the forge.

use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::Json as ResponseJson,
    routing::{get, put},
};
use db::models::label::{CreateLabel, Label};
use db::models::task::Task;
use serde::Deserialize;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

const FORGE_PUSH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Deserialize)]
pub struct LabelQueryParams {
    /// When set, returns global plus project-specific labels; otherwise
    /// only global labels.
    #[serde(default)]
    pub project_id: Option<Uuid>,
}

/// GET /api/labels
pub async fn get_labels(
    State(state): State<AppState>,
    Query(params): Query<LabelQueryParams>,
) -> Result<ResponseJson<ApiResponse<Vec<Label>>>, ApiError> {
    let labels = Label::find_for_project(&state.db.pool, params.project_id).await?;
    Ok(ResponseJson(ApiResponse::success(labels)))
}

/// POST /api/labels
pub async fn create_label(
    State(state): State<AppState>,
    Json(payload): Json<CreateLabel>,
) -> Result<ResponseJson<ApiResponse<Label>>, ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::BadRequest("label name is required".to_string()));
    }
    let label = Label::create(&state.db.pool, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(label)))
}

/// GET /api/tasks/{task_id}/labels
pub async fn get_task_labels(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Vec<Label>>>, ApiError> {
    Task::find_by_id(&state.db.pool, task_id)
        .await?
        .ok_or(ApiError::NotFound("task"))?;
    let labels = Label::find_by_task_id(&state.db.pool, task_id).await?;
    Ok(ResponseJson(ApiResponse::success(labels)))
}

/// PUT /api/tasks/{task_id}/labels/{label_id}
pub async fn attach_label(
    State(state): State<AppState>,
    Path((task_id, label_id)): Path<(Uuid, Uuid)>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    Task::find_by_id(&state.db.pool, task_id)
        .await?
        .ok_or(ApiError::NotFound("task"))?;
    let label = Label::find_by_id(&state.db.pool, label_id)
        .await?
        .ok_or(ApiError::NotFound("label"))?;

    Label::attach_to_task(&state.db.pool, task_id, label_id).await?;

    let label_sync = state.label_sync.clone();
    tokio::spawn(async move {
        let push = label_sync.push_label(task_id, &label.name, &label.color);
        if tokio::time::timeout(FORGE_PUSH_TIMEOUT, push).await.is_err() {
            tracing::warn!(%task_id, label = %label.name, "forge label push timed out");
        }
    });

    Ok(ResponseJson(ApiResponse::success(())))
}

/// DELETE /api/tasks/{task_id}/labels/{label_id}
pub async fn detach_label(
    State(state): State<AppState>,
    Path((task_id, label_id)): Path<(Uuid, Uuid)>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let label = Label::find_by_id(&state.db.pool, label_id)
        .await?
        .ok_or(ApiError::NotFound("label"))?;

    if Label::detach_from_task(&state.db.pool, task_id, label_id).await? == 0 {
        return Err(ApiError::NotFound("task label"));
    }

    let label_sync = state.label_sync.clone();
    tokio::spawn(async move {
        let removal = label_sync.remove_label(task_id, &label.name);
        if tokio::time::timeout(FORGE_PUSH_TIMEOUT, removal).await.is_err() {
            tracing::warn!(%task_id, label = %label.name, "forge label removal timed out");
        }
    });

    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/labels", get(get_labels).post(create_label))
        .route("/tasks/{task_id}/labels", get(get_task_labels))
        .route(
            "/tasks/{task_id}/labels/{label_id}",
            put(attach_label).delete(detach_label),
        )
}
