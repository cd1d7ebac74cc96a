use axum::{Router, routing::get};

use crate::AppState;

pub mod health;
pub mod integrations;
pub mod labels;
pub mod webhooks;
pub mod workflow_rules;

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health::health_check))
        .merge(webhooks::router())
        .merge(integrations::router())
        .merge(workflow_rules::router())
        .merge(labels::router())
        .with_state(state);

    Router::new().nest("/api", api_routes)
}
