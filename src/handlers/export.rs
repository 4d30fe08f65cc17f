//! Schema export handler. The patch file is re-read on every request.

use crate::error::AppError;
use crate::export::{load_patch, schema_document};
use crate::state::AppState;
use axum::{extract::State, Json};
use serde_json::Value;

pub async fn export(State(state): State<AppState>) -> Result<Json<Vec<Value>>, AppError> {
    let patch = load_patch(&state.settings.schema_patch).await?;
    Ok(Json(schema_document(&state.registry, &patch)?))
}
