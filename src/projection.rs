//! Field projection (`select=`) and row serialization to JSON.

use crate::config::{Column, Entity, ValueType};
use crate::error::AppError;
use crate::sql::decode_timestamp;
use crate::window::Shape;
use chrono::{DateTime, Local, Timelike, Utc};
use serde_json::{Map, Value};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

/// Columns to fetch, in output order.
///
/// `select=a,b` keeps exactly those fields, `select=*` keeps all of them. Without a
/// selection lazy columns are left out of collections but included for single objects.
pub fn select_columns<'e>(entity: &'e Entity, select: Option<&str>, shape: Shape) -> Result<Vec<&'e Column>, AppError> {
    let Some(select) = select.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(entity
            .columns
            .iter()
            .filter(|c| shape == Shape::Single || !c.lazy)
            .collect());
    };
    if select == "*" {
        return Ok(entity.columns.iter().collect());
    }
    let mut columns: Vec<&Column> = Vec::new();
    for name in select.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let column = entity
            .column(name)
            .ok_or_else(|| AppError::BadField(name.to_string()))?;
        if !columns.iter().any(|c| c.name == column.name) {
            columns.push(column);
        }
    }
    if columns.is_empty() {
        return Err(AppError::BadField(select.to_string()));
    }
    Ok(columns)
}

/// Render a timestamp in the server's local offset; the fraction is omitted when zero.
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    let local = dt.with_timezone(&Local);
    if local.nanosecond() == 0 {
        local.format("%Y-%m-%dT%H:%M:%S%:z").to_string()
    } else {
        local.format("%Y-%m-%dT%H:%M:%S%.6f%:z").to_string()
    }
}

/// Decode one row fetched with exactly `columns`, in order.
pub fn row_to_json(row: &SqliteRow, columns: &[&Column]) -> Result<Map<String, Value>, AppError> {
    let mut obj = Map::with_capacity(columns.len());
    for (i, c) in columns.iter().enumerate() {
        obj.insert(c.name.clone(), decode_column(row, i, c.value_type)?);
    }
    Ok(obj)
}

fn decode_column(row: &SqliteRow, i: usize, ty: ValueType) -> Result<Value, AppError> {
    // SQLite is dynamically typed; values of another storage class fall back to text.
    let value = match ty {
        ValueType::Integer => match row.try_get::<Option<i64>, _>(i) {
            Ok(v) => v.map(Value::from),
            Err(_) => text(row, i)?.map(Value::String),
        },
        ValueType::Float => match row.try_get::<Option<f64>, _>(i) {
            Ok(v) => v.map(Value::from),
            Err(_) => match row.try_get::<Option<i64>, _>(i) {
                Ok(v) => v.map(|n| Value::from(n as f64)),
                Err(_) => text(row, i)?.map(Value::String),
            },
        },
        ValueType::Boolean => match row.try_get::<Option<bool>, _>(i) {
            Ok(v) => v.map(Value::Bool),
            Err(_) => text(row, i)?.map(Value::String),
        },
        ValueType::Text | ValueType::Date => text(row, i)?.map(Value::String),
        ValueType::Timestamp => text(row, i)?.map(|s| match decode_timestamp(&s) {
            Some(dt) => Value::String(format_timestamp(&dt)),
            None => Value::String(s),
        }),
        ValueType::Json => text(row, i)?.map(|s| serde_json::from_str(&s).unwrap_or(Value::String(s))),
    };
    Ok(value.unwrap_or(Value::Null))
}

fn text(row: &SqliteRow, i: usize) -> Result<Option<String>, AppError> {
    Ok(row.try_get::<Option<String>, _>(i)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ColumnDescriptor, ColumnType, EntityDescriptor, EntityRegistry};
    use chrono::TimeZone;

    fn registry() -> EntityRegistry {
        EntityRegistry::builder()
            .register(
                EntityDescriptor::new("T")
                    .column(ColumnDescriptor::new("s", ColumnType::Text))
                    .column(ColumnDescriptor::new("notes", ColumnType::Text).lazy()),
            )
            .build()
            .unwrap()
    }

    fn names(cols: &[&Column]) -> Vec<String> {
        cols.iter().map(|c| c.name.clone()).collect()
    }

    #[test]
    fn lazy_columns_depend_on_shape() {
        let reg = registry();
        let t = reg.get("t").unwrap();
        assert_eq!(names(&select_columns(t, None, Shape::Collection).unwrap()), ["id", "s"]);
        assert_eq!(names(&select_columns(t, None, Shape::Single).unwrap()), ["id", "s", "notes"]);
        assert_eq!(names(&select_columns(t, Some("*"), Shape::Collection).unwrap()), ["id", "s", "notes"]);
    }

    #[test]
    fn explicit_selection_keeps_request_order() {
        let reg = registry();
        let t = reg.get("t").unwrap();
        let cols = select_columns(t, Some("s, id,s"), Shape::Collection).unwrap();
        assert_eq!(names(&cols), ["s", "id"]);
        let cols = select_columns(t, Some("notes"), Shape::Collection).unwrap();
        assert_eq!(names(&cols), ["notes"]);
    }

    #[test]
    fn unknown_selected_field_is_rejected() {
        let reg = registry();
        let t = reg.get("t").unwrap();
        assert!(matches!(
            select_columns(t, Some("id,nope"), Shape::Collection),
            Err(AppError::BadField(f)) if f == "nope"
        ));
    }

    #[test]
    fn timestamps_render_with_offset() {
        let dt = Utc.with_ymd_and_hms(2011, 11, 11, 3, 11, 11).unwrap();
        let s = format_timestamp(&dt);
        assert_eq!(DateTime::parse_from_rfc3339(&s).unwrap(), dt);
        assert!(!s.contains('.'));

        let with_micros = dt + chrono::Duration::microseconds(250_000);
        let s = format_timestamp(&with_micros);
        assert!(s.contains(".250000"));
        assert_eq!(DateTime::parse_from_rfc3339(&s).unwrap(), with_micros);
    }
}
