//! Entity handlers: GET (query), POST (create), PATCH (update one), DELETE (delete one).
//!
//! Each request runs in one transaction. Returning early with an error drops it, which rolls back.

use crate::config::Entity;
use crate::error::AppError;
use crate::extractors::Preferences;
use crate::projection::select_columns;
use crate::query::RequestQuery;
use crate::response;
use crate::service::{BodyValidator, CrudService};
use crate::sql::FilterQuery;
use crate::state::AppState;
use crate::window::{self, Shape};
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, Path, Query, State},
    response::Response,
};

fn entity_for<'s>(state: &'s AppState, table: &str) -> Result<&'s Entity, AppError> {
    state
        .registry
        .get(table)
        .ok_or_else(|| AppError::NotFound(format!("no entity at /{}", table)))
}

pub async fn list(
    State(state): State<AppState>,
    Path(table): Path<String>,
    prefs: Preferences,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    let entity = entity_for(&state, &table)?;
    let query = RequestQuery::from_pairs(pairs);
    let filter = FilterQuery::compile(entity, &query)?;
    let (shape, window) = window::resolve(
        &prefs,
        &query,
        state.settings.default_window,
        state.settings.max_window,
    )?;
    let columns = select_columns(entity, query.select.as_deref(), shape)?;

    let mut tx = state.pool.begin().await?;
    let count = if prefs.count_exact && shape == Shape::Collection {
        Some(CrudService::count(&mut *tx, entity, &filter).await?)
    } else {
        None
    };
    let rows = CrudService::fetch_window(&mut *tx, entity, &filter, &columns, &window).await?;
    tx.commit().await?;

    match shape {
        Shape::Single => {
            let row = rows
                .into_iter()
                .next()
                .ok_or_else(|| AppError::NotFound(format!("no matching {} row", entity.table_name)))?;
            Ok(response::object(row))
        }
        Shape::Collection => Ok(response::collection(rows, &window.content_range(count))),
    }
}

pub async fn create(
    State(state): State<AppState>,
    Path(table): Path<String>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, AppError> {
    let entity = entity_for(&state, &table)?;
    let body = BodyValidator::parse_object(&body?)?;
    let values = BodyValidator::for_insert(entity, &body)?;

    let mut tx = state.pool.begin().await?;
    let row = CrudService::insert(&mut *tx, entity, &values).await?;
    tx.commit().await?;
    tracing::debug!(entity = %entity.name, "row created");
    Ok(response::object(row))
}

pub async fn update(
    State(state): State<AppState>,
    Path(table): Path<String>,
    Query(pairs): Query<Vec<(String, String)>>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, AppError> {
    let entity = entity_for(&state, &table)?;
    let body = BodyValidator::parse_object(&body?)?;
    if body.is_empty() {
        return Ok(response::empty());
    }
    let values = BodyValidator::for_update(entity, &body)?;
    let filter = FilterQuery::compile(entity, &RequestQuery::from_pairs(pairs))?;

    let mut tx = state.pool.begin().await?;
    let key = CrudService::resolve_one(&mut *tx, entity, &filter).await?;
    let row = CrudService::update(&mut *tx, entity, &key, &values).await?;
    tx.commit().await?;
    tracing::debug!(entity = %entity.name, key = ?key, "row updated");
    Ok(response::object(row))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(table): Path<String>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    let entity = entity_for(&state, &table)?;
    let filter = FilterQuery::compile(entity, &RequestQuery::from_pairs(pairs))?;

    let mut tx = state.pool.begin().await?;
    let key = CrudService::resolve_one(&mut *tx, entity, &filter).await?;
    CrudService::delete(&mut *tx, entity, &key).await?;
    tx.commit().await?;
    tracing::debug!(entity = %entity.name, key = ?key, "row deleted");
    Ok(response::empty())
}
