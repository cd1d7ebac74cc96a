use axum::{
    Json, Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::integration::{CreateIntegration, Integration};
use db::models::project::Project;
use serde::Deserialize;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

/// POST /api/projects/{project_id}/integrations
pub async fn create_integration(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    Json(payload): Json<CreateIntegration>,
) -> Result<ResponseJson<ApiResponse<Integration>>, ApiError> {
    Project::find_by_id(&state.db.pool, project_id)
        .await?
        .ok_or(ApiError::NotFound("project"))?;

    if payload.repo_owner.trim().is_empty() || payload.repo_name.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "repo_owner and repo_name are required".to_string(),
        ));
    }

    let integration = Integration::create(&state.db.pool, project_id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(integration)))
}

/// GET /api/projects/{project_id}/integrations
pub async fn list_integrations(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Vec<Integration>>>, ApiError> {
    Project::find_by_id(&state.db.pool, project_id)
        .await?
        .ok_or(ApiError::NotFound("project"))?;
    let integrations = Integration::find_by_project(&state.db.pool, project_id).await?;
    Ok(ResponseJson(ApiResponse::success(integrations)))
}

/// POST /api/integrations/{id}/deactivate
pub async fn deactivate_integration(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    if Integration::deactivate(&state.db.pool, id).await? == 0 {
        return Err(ApiError::NotFound("integration"));
    }
    Ok(ResponseJson(ApiResponse::success(())))
}

#[derive(Deserialize)]
pub struct RotateSecretRequest {
    pub webhook_secret: String,
}

/// POST /api/integrations/{id}/rotate-secret
pub async fn rotate_secret(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RotateSecretRequest>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    if payload.webhook_secret.is_empty() {
        return Err(ApiError::BadRequest(
            "webhook_secret must not be empty".to_string(),
        ));
    }
    if Integration::rotate_secret(&state.db.pool, id, &payload.webhook_secret).await? == 0 {
        return Err(ApiError::NotFound("integration"));
    }
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/projects/{project_id}/integrations",
            get(list_integrations).post(create_integration),
        )
        .route("/integrations/{id}/deactivate", post(deactivate_integration))
        .route("/integrations/{id}/rotate-secret", post(rotate_secret))
}
