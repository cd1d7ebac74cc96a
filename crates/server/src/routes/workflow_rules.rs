use axum::{
    Json, Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{delete, get},
};
use db::models::project::Project;
use db::models::workflow_rule::WorkflowRule;
use services::services::workflow_rules::{self, UpsertWorkflowRule};
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

/// PUT /api/projects/{project_id}/workflow-rules
pub async fn upsert_rule(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    Json(payload): Json<UpsertWorkflowRule>,
) -> Result<ResponseJson<ApiResponse<WorkflowRule>>, ApiError> {
    Project::find_by_id(&state.db.pool, project_id)
        .await?
        .ok_or(ApiError::NotFound("project"))?;
    let rule = workflow_rules::upsert_rule(&state.db.pool, project_id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(rule)))
}

/// GET /api/projects/{project_id}/workflow-rules
pub async fn list_rules(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Vec<WorkflowRule>>>, ApiError> {
    Project::find_by_id(&state.db.pool, project_id)
        .await?
        .ok_or(ApiError::NotFound("project"))?;
    let rules = WorkflowRule::find_by_project(&state.db.pool, project_id).await?;
    Ok(ResponseJson(ApiResponse::success(rules)))
}

/// DELETE /api/workflow-rules/{id}
pub async fn delete_rule(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    workflow_rules::delete_rule(&state.db.pool, id).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/projects/{project_id}/workflow-rules",
            get(list_rules).put(upsert_rule),
        )
        .route("/workflow-rules/{id}", delete(delete_rule))
}
