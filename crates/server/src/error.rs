use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use services::services::webhook::SyncError;
use services::services::workflow_rules::WorkflowRuleError;
use thiserror::Error;
use utils::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Sync(#[from] SyncError),
    #[error(transparent)]
    WorkflowRule(#[from] WorkflowRuleError),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0} not found")]
    NotFound(&'static str),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Database(sqlx::Error::RowNotFound) => StatusCode::NOT_FOUND,
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Sync(SyncError::Authentication(_)) => StatusCode::UNAUTHORIZED,
            ApiError::Sync(SyncError::Validation(_)) => StatusCode::BAD_REQUEST,
            ApiError::Sync(SyncError::Database(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::WorkflowRule(WorkflowRuleError::NotFound) => StatusCode::NOT_FOUND,
            ApiError::WorkflowRule(WorkflowRuleError::ColumnNotFound) => StatusCode::NOT_FOUND,
            ApiError::WorkflowRule(WorkflowRuleError::CrossProjectColumn) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::WorkflowRule(WorkflowRuleError::Database(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ApiResponse::<()>::error(self.to_string());
        (status, Json(body)).into_response()
    }
}
