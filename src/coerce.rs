//! Type coercion: raw query-string values and JSON body values to native column values.
//!
//! Each entity gets a [`CoercionRegistry`] when the entity registry is built. The
//! timestamp parser is injected there; nothing here holds global state.

use crate::config::ValueType;
use crate::error::AppError;
use crate::sql::{SqlValue, DATE_FORMAT};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Parses a timestamp string into an absolute instant.
pub type TimestampParser = Arc<dyn Fn(&str) -> Result<DateTime<Utc>, String> + Send + Sync>;

pub fn default_timestamp_parser() -> TimestampParser {
    Arc::new(parse_timestamp)
}

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Accepts `YYYY-MM-DD[ T]HH:MM[:SS[.f]]` with an optional `Z` or numeric offset, or a bare
/// date. Inputs without an offset are read as server local time.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    let s = raw.trim();
    let with_offset = match s.strip_suffix('Z').or_else(|| s.strip_suffix('z')) {
        Some(stripped) => format!("{}+00:00", stripped),
        None => s.to_string(),
    };
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(&with_offset, fmt) {
            return Ok(dt.with_timezone(&Utc));
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return local_to_utc(&naive, raw);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, DATE_FORMAT) {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return local_to_utc(&naive, raw);
        }
    }
    Err(format!("unrecognized timestamp '{}'", raw))
}

fn local_to_utc(naive: &NaiveDateTime, raw: &str) -> Result<DateTime<Utc>, String> {
    Local
        .from_local_datetime(naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| format!("'{}' does not exist in the local time zone", raw))
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|_| format!("unrecognized date '{}'", raw))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Coercion {
    Identity,
    Timestamp,
    Date,
    Json(ValueType),
}

impl Coercion {
    fn for_type(ty: ValueType) -> Self {
        match ty {
            ValueType::Text => Coercion::Identity,
            ValueType::Timestamp => Coercion::Timestamp,
            ValueType::Date => Coercion::Date,
            other => Coercion::Json(other),
        }
    }
}

/// Per-column coercion functions for one entity.
#[derive(Clone)]
pub struct CoercionRegistry {
    by_column: HashMap<String, (Coercion, ValueType)>,
    parser: TimestampParser,
}

impl fmt::Debug for CoercionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoercionRegistry")
            .field("columns", &self.by_column.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl CoercionRegistry {
    pub fn new(parser: TimestampParser) -> Self {
        CoercionRegistry {
            by_column: HashMap::new(),
            parser,
        }
    }

    /// Register a column by its effective type (references use the referenced key's type).
    pub fn insert(&mut self, column: &str, ty: ValueType) {
        self.by_column.insert(column.to_string(), (Coercion::for_type(ty), ty));
    }

    /// Coerce a raw query-string value. Fails with `BadValue`.
    pub fn coerce(&self, column: &str, raw: &str) -> Result<SqlValue, AppError> {
        let (coercion, _) = self
            .by_column
            .get(column)
            .ok_or_else(|| AppError::BadField(column.to_string()))?;
        match coercion {
            Coercion::Identity => Ok(SqlValue::Text(raw.to_string())),
            Coercion::Timestamp => (self.parser)(raw)
                .map(SqlValue::Timestamp)
                .map_err(|e| AppError::bad_value(column, e)),
            Coercion::Date => parse_date(raw)
                .map(SqlValue::Date)
                .map_err(|e| AppError::bad_value(column, e)),
            Coercion::Json(ty) => {
                let value: Value = serde_json::from_str(raw)
                    .map_err(|e| AppError::bad_value(column, format!("invalid JSON '{}': {}", raw, e)))?;
                json_to_sql(value, *ty, &self.parser).map_err(|e| AppError::bad_value(column, e))
            }
        }
    }

    /// Coerce a value from a JSON request body. Fails with `BadRequest`.
    pub fn coerce_json(&self, column: &str, value: &Value) -> Result<SqlValue, AppError> {
        let (_, ty) = self
            .by_column
            .get(column)
            .ok_or_else(|| AppError::BadRequest(format!("unknown field: {}", column)))?;
        json_to_sql(value.clone(), *ty, &self.parser)
            .map_err(|e| AppError::BadRequest(format!("{}: {}", column, e)))
    }
}

pub(crate) fn json_to_sql(value: Value, ty: ValueType, parser: &TimestampParser) -> Result<SqlValue, String> {
    if value.is_null() {
        return Ok(SqlValue::Null);
    }
    match ty {
        ValueType::Json => Ok(SqlValue::Json(value)),
        ValueType::Text => match value {
            Value::String(s) => Ok(SqlValue::Text(s)),
            other => Err(format!("expected a string, got {}", other)),
        },
        ValueType::Integer => value
            .as_i64()
            .map(SqlValue::Integer)
            .ok_or_else(|| format!("expected an integer, got {}", value)),
        ValueType::Float => value
            .as_f64()
            .map(SqlValue::Float)
            .ok_or_else(|| format!("expected a number, got {}", value)),
        ValueType::Boolean => value
            .as_bool()
            .map(SqlValue::Bool)
            .ok_or_else(|| format!("expected a boolean, got {}", value)),
        ValueType::Timestamp => match value {
            Value::String(s) => parser(&s).map(SqlValue::Timestamp),
            other => Err(format!("expected a timestamp string, got {}", other)),
        },
        ValueType::Date => match value {
            Value::String(s) => parse_date(&s).map(SqlValue::Date),
            other => Err(format!("expected a date string, got {}", other)),
        },
    }
}
