//! Inbound webhook ingest endpoint.
//!
//! The raw body is taken as bytes because the HMAC signature is computed
//! over the exact bytes on the wire; deserializing first would break
//! verification.

use std::str::FromStr;

use axum::{
    Router,
    body::Bytes,
    extract::{Path, State},
    http::HeaderMap,
    response::Json as ResponseJson,
    routing::post,
};
use db::models::integration::ForgeProvider;
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError};

const EVENT_HEADERS: [&str; 2] = ["x-github-event", "x-gitea-event"];
const SIGNATURE_HEADERS: [&str; 2] = ["x-hub-signature-256", "x-gitea-signature"];

fn first_header<'a>(headers: &'a HeaderMap, names: &[&str]) -> Option<&'a str> {
    names
        .iter()
        .find_map(|name| headers.get(*name))
        .and_then(|v| v.to_str().ok())
}

/// POST /api/webhooks/{provider}
pub async fn receive_webhook(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let provider = ForgeProvider::from_str(&provider)
        .map_err(|_| ApiError::BadRequest(format!("unknown provider: {provider}")))?;

    let event = first_header(&headers, &EVENT_HEADERS);
    let signature = first_header(&headers, &SIGNATURE_HEADERS);

    let outcome = state
        .webhooks
        .process(provider, event, signature, &body)
        .await?;

    Ok(ResponseJson(ApiResponse::message(outcome.message())))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/webhooks/{provider}", post(receive_webhook))
}
