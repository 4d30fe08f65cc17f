//! Entity reads and writes on one SQLite connection (the request's transaction).

use crate::config::{Column, Entity, ValueType};
use crate::error::AppError;
use crate::projection::row_to_json;
use crate::sql::{self, bind_params, FilterQuery, QueryBuf, SqlValue};
use crate::window::Window;
use serde_json::{Map, Value};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

pub struct CrudService;

impl CrudService {
    /// Matching rows within the window, projected to `columns`.
    pub async fn fetch_window(
        conn: &mut SqliteConnection,
        entity: &Entity,
        filter: &FilterQuery,
        columns: &[&Column],
        window: &Window,
    ) -> Result<Vec<Map<String, Value>>, AppError> {
        if window.is_empty() {
            return Ok(Vec::new());
        }
        let q = sql::select_window(entity, filter, columns, window);
        let rows = Self::fetch_all(conn, &q).await?;
        rows.iter().map(|r| row_to_json(r, columns)).collect()
    }

    /// Total matching rows, ignoring any window.
    pub async fn count(conn: &mut SqliteConnection, entity: &Entity, filter: &FilterQuery) -> Result<u64, AppError> {
        let q = sql::count(entity, filter);
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let row = bind_params(sqlx::query(&q.sql), &q.params).fetch_one(&mut *conn).await?;
        let n: i64 = row.try_get(0)?;
        Ok(n.max(0) as u64)
    }

    /// Insert one row and return it with every column.
    pub async fn insert(
        conn: &mut SqliteConnection,
        entity: &Entity,
        values: &[(&Column, SqlValue)],
    ) -> Result<Map<String, Value>, AppError> {
        let q = sql::insert(entity, values);
        let row = Self::fetch_optional(conn, &q)
            .await?
            .ok_or(AppError::Db(sqlx::Error::RowNotFound))?;
        row_to_json(&row, &all_columns(entity))
    }

    /// Primary key of the single row matching `filter`. Zero or several matches fail.
    pub async fn resolve_one(
        conn: &mut SqliteConnection,
        entity: &Entity,
        filter: &FilterQuery,
    ) -> Result<SqlValue, AppError> {
        let q = sql::select_keys(entity, filter, 2);
        let rows = Self::fetch_all(conn, &q).await?;
        match rows.as_slice() {
            [row] => key_value(row, entity.key_column()),
            _ => Err(AppError::AmbiguousMatch(rows.len() as u64)),
        }
    }

    /// Update the row with `key` and return it with every column.
    pub async fn update(
        conn: &mut SqliteConnection,
        entity: &Entity,
        key: &SqlValue,
        values: &[(&Column, SqlValue)],
    ) -> Result<Map<String, Value>, AppError> {
        let q = sql::update_by_key(entity, key, values);
        let row = Self::fetch_optional(conn, &q)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{} row", entity.table_name)))?;
        row_to_json(&row, &all_columns(entity))
    }

    pub async fn delete(conn: &mut SqliteConnection, entity: &Entity, key: &SqlValue) -> Result<u64, AppError> {
        let q = sql::delete_by_key(entity, key);
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let done = bind_params(sqlx::query(&q.sql), &q.params).execute(&mut *conn).await?;
        Ok(done.rows_affected())
    }

    async fn fetch_all(conn: &mut SqliteConnection, q: &QueryBuf) -> Result<Vec<SqliteRow>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        Ok(bind_params(sqlx::query(&q.sql), &q.params).fetch_all(&mut *conn).await?)
    }

    async fn fetch_optional(conn: &mut SqliteConnection, q: &QueryBuf) -> Result<Option<SqliteRow>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        Ok(bind_params(sqlx::query(&q.sql), &q.params).fetch_optional(&mut *conn).await?)
    }
}

fn all_columns(entity: &Entity) -> Vec<&Column> {
    entity.columns.iter().collect()
}

/// Key as stored, so it compares equal when bound back into `WHERE key = ?`.
fn key_value(row: &SqliteRow, key: &Column) -> Result<SqlValue, AppError> {
    Ok(match key.value_type {
        ValueType::Integer | ValueType::Boolean => SqlValue::Integer(row.try_get(0)?),
        ValueType::Float => SqlValue::Float(row.try_get(0)?),
        _ => SqlValue::Text(row.try_get(0)?),
    })
}
