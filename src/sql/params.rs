//! Native column values and how they are bound to SQLite statements.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments};

/// Storage format for timestamps: UTC, fixed width, so text comparison follows time order.
const TIMESTAMP_STORAGE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";
pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

/// A coerced value ready to be bound as a statement parameter.
#[derive(Clone, Debug, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
    Date(NaiveDate),
    Json(serde_json::Value),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Literal for `DEFAULT` clauses. Only ever called on declared defaults.
    pub(crate) fn to_sql_literal(&self) -> String {
        match self {
            SqlValue::Null => "NULL".into(),
            SqlValue::Bool(b) => if *b { "1" } else { "0" }.into(),
            SqlValue::Integer(n) => n.to_string(),
            SqlValue::Float(f) => f.to_string(),
            SqlValue::Text(s) => quote_literal(s),
            SqlValue::Timestamp(dt) => quote_literal(&encode_timestamp(dt)),
            SqlValue::Date(d) => quote_literal(&d.format(DATE_FORMAT).to_string()),
            SqlValue::Json(v) => quote_literal(&v.to_string()),
        }
    }
}

fn quote_literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

pub fn encode_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format(TIMESTAMP_STORAGE_FORMAT).to_string()
}

/// Read back a stored timestamp. Values written by other tools fall back to the flexible parser.
pub fn decode_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    crate::coerce::parse_timestamp(s).ok()
}

pub type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

/// Bind every parameter in order. Placeholders are numbered `?1..?N` in the same order.
pub fn bind_params<'q>(mut query: SqliteQuery<'q>, params: &[SqlValue]) -> SqliteQuery<'q> {
    for p in params {
        query = match p {
            SqlValue::Null => query.bind(None::<String>),
            SqlValue::Bool(b) => query.bind(*b),
            SqlValue::Integer(n) => query.bind(*n),
            SqlValue::Float(f) => query.bind(*f),
            SqlValue::Text(s) => query.bind(s.clone()),
            SqlValue::Timestamp(dt) => query.bind(encode_timestamp(dt)),
            SqlValue::Date(d) => query.bind(d.format(DATE_FORMAT).to_string()),
            SqlValue::Json(v) => query.bind(v.to_string()),
        };
    }
    query
}
