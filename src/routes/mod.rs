//! Router assembly.

mod common;
mod entity;
pub use common::common_routes;
pub use entity::entity_routes;

use crate::error::AppError;
use crate::state::AppState;
use axum::{
    body::to_bytes,
    http::header,
    middleware,
    response::{IntoResponse, Response},
    Router,
};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

/// Largest framework error body read back into the envelope message.
const MAX_ERROR_TEXT: usize = 4 * 1024;

/// Full application: common routes, entity routes, body limit, error envelope and request tracing.
pub fn app(state: AppState) -> Router {
    let body_limit = state.settings.body_limit;
    Router::new()
        .merge(common_routes(state.clone()))
        .merge(entity_routes(state))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(middleware::map_response(error_envelope))
        .layer(TraceLayer::new_for_http())
}

/// Rewrite non-JSON error responses (unmatched routes, 405, body limit, extractor
/// rejections) into the `{"error":{"code","message"}}` body.
async fn error_envelope(response: Response) -> Response {
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) || is_json(&response) {
        return response;
    }
    let (parts, body) = response.into_parts();
    let message = match to_bytes(body, MAX_ERROR_TEXT).await {
        Ok(bytes) => String::from_utf8_lossy(&bytes).trim().to_string(),
        Err(_) => String::new(),
    };
    let mut rewritten = AppError::http(status, message).into_response();
    if let Some(allow) = parts.headers.get(header::ALLOW) {
        rewritten.headers_mut().insert(header::ALLOW, allow.clone());
    }
    rewritten
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"))
}
