//! Response helpers for entity routes.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{Map, Value};

/// JSON array plus `Content-Range`.
pub fn collection(rows: Vec<Map<String, Value>>, content_range: &str) -> Response {
    let mut resp = (StatusCode::OK, Json(rows)).into_response();
    if let Ok(v) = HeaderValue::from_str(content_range) {
        resp.headers_mut().insert(header::CONTENT_RANGE, v);
    }
    resp
}

/// One JSON object, no `Content-Range`.
pub fn object(row: Map<String, Value>) -> Response {
    (StatusCode::OK, Json(row)).into_response()
}

/// 200 with an empty body.
pub fn empty() -> Response {
    StatusCode::OK.into_response()
}
