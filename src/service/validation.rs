//! Request body checks for writes: known fields, coerced types, required-ness.

use crate::config::{Column, Entity};
use crate::error::AppError;
use crate::sql::SqlValue;
use serde_json::{Map, Value};

pub struct BodyValidator;

impl BodyValidator {
    /// Parse a request body as a JSON object. Empty bytes yield an empty object.
    pub fn parse_object(body: &[u8]) -> Result<Map<String, Value>, AppError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Map::new());
        }
        match serde_json::from_slice(body) {
            Ok(Value::Object(m)) => Ok(m),
            Ok(_) => Err(AppError::BadRequest("body must be a JSON object".into())),
            Err(e) => Err(AppError::BadRequest(format!("invalid JSON body: {}", e))),
        }
    }

    /// Values for an INSERT, in declaration order. Every required column must be present and non-null.
    pub fn for_insert<'e>(entity: &'e Entity, body: &Map<String, Value>) -> Result<Vec<(&'e Column, SqlValue)>, AppError> {
        let mut values = Self::coerce_fields(entity, body)?;
        for c in entity.columns.iter().filter(|c| c.required_on_insert()) {
            match values.iter().find(|(col, _)| col.name == c.name) {
                Some((_, v)) if !v.is_null() => {}
                _ => return Err(AppError::BadRequest(format!("{} is required", c.name))),
            }
        }
        // Explicit nulls on columns with a storage default would override it.
        values.retain(|(c, v)| !(v.is_null() && (c.default.is_some() || c.auto_increment)));
        Ok(values)
    }

    /// Values for an UPDATE. The primary key cannot change; required columns cannot become null.
    pub fn for_update<'e>(entity: &'e Entity, body: &Map<String, Value>) -> Result<Vec<(&'e Column, SqlValue)>, AppError> {
        let values = Self::coerce_fields(entity, body)?;
        for (c, v) in &values {
            if c.primary_key {
                return Err(AppError::BadRequest(format!("primary key {} cannot be changed", c.name)));
            }
            if c.required && v.is_null() {
                return Err(AppError::BadRequest(format!("{} is required", c.name)));
            }
        }
        Ok(values)
    }

    fn coerce_fields<'e>(entity: &'e Entity, body: &Map<String, Value>) -> Result<Vec<(&'e Column, SqlValue)>, AppError> {
        if let Some(unknown) = body.keys().find(|k| entity.column(k).is_none()) {
            return Err(AppError::BadRequest(format!("unknown field: {}", unknown)));
        }
        entity
            .columns
            .iter()
            .filter_map(|c| body.get(&c.name).map(|v| (c, v)))
            .map(|(c, v)| Ok((c, entity.coercions.coerce_json(&c.name, v)?)))
            .collect()
    }
}
