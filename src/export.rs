//! Schema export for UI clients, with an optional YAML patch overlay.
//!
//! Document shape, per entity in registration order:
//! `{"tableName", "primaryKey", "fs": [{"columnName", "type", "hide"?, "foreignKey"?}]}`.
//! The patch maps table name to an object whose keys are either column names (merged
//! into that field) or anything else (merged into the table object). Patch values win.

use crate::config::{Column, Entity, EntityRegistry, ValueType};
use crate::error::ConfigError;
use serde_json::{json, Map, Value};
use std::io::ErrorKind;
use std::path::Path;

pub type SchemaPatch = Map<String, Value>;

fn export_type(c: &Column) -> &'static str {
    match c.value_type {
        ValueType::Text if c.max_len.is_some() => "string",
        ValueType::Text => "text",
        ValueType::Integer => "number",
        ValueType::Float => "float",
        ValueType::Boolean => "boolean",
        ValueType::Timestamp => "datetime",
        ValueType::Date => "date",
        ValueType::Json => "json",
    }
}

fn field(c: &Column) -> Map<String, Value> {
    let mut f = Map::new();
    f.insert("columnName".into(), Value::String(c.name.clone()));
    match &c.foreign_key {
        Some(fk) => {
            f.insert(
                "foreignKey".into(),
                json!({ "tableName": fk.table_name, "columnName": fk.column_name }),
            );
        }
        None => {
            f.insert("type".into(), Value::String(export_type(c).into()));
        }
    }
    if c.lazy {
        f.insert("hide".into(), Value::Bool(true));
    }
    f
}

fn table(entity: &Entity, patch: Option<&Map<String, Value>>) -> Result<Value, ConfigError> {
    let mut overlay = patch.cloned().unwrap_or_default();
    let mut fs = Vec::with_capacity(entity.columns.len());
    for c in &entity.columns {
        let mut f = field(c);
        match overlay.remove(&c.name) {
            Some(Value::Object(extra)) => f.extend(extra),
            Some(_) => {
                return Err(ConfigError::Patch(format!(
                    "entry for column '{}.{}' must be a mapping",
                    entity.table_name, c.name
                )))
            }
            None => {}
        }
        fs.push(Value::Object(f));
    }
    let mut t = Map::new();
    t.insert("tableName".into(), Value::String(entity.table_name.clone()));
    t.insert("primaryKey".into(), Value::String(entity.primary_key.clone()));
    t.insert("fs".into(), Value::Array(fs));
    t.extend(overlay);
    Ok(Value::Object(t))
}

/// Build the export document for every registered entity. A patch entry keyed by a
/// column name must be a mapping.
pub fn schema_document(registry: &EntityRegistry, patch: &SchemaPatch) -> Result<Vec<Value>, ConfigError> {
    registry
        .entities()
        .iter()
        .map(|e| table(e, patch.get(&e.table_name).and_then(Value::as_object)))
        .collect()
}

/// Parse a patch document (YAML or JSON). An empty document is an empty patch.
pub fn parse_patch(source: &str) -> Result<SchemaPatch, ConfigError> {
    if source.trim().is_empty() {
        return Ok(Map::new());
    }
    let value: Value = serde_yaml::from_str(source).map_err(|e| ConfigError::Patch(e.to_string()))?;
    match value {
        Value::Null => Ok(Map::new()),
        Value::Object(m) => {
            if let Some((name, _)) = m.iter().find(|(_, v)| !v.is_object()) {
                return Err(ConfigError::Patch(format!("entry for '{}' must be a mapping", name)));
            }
            Ok(m)
        }
        _ => Err(ConfigError::Patch("patch must be a mapping of table names".into())),
    }
}

/// Read the patch file. A missing file is an empty patch.
pub async fn load_patch(path: &Path) -> Result<SchemaPatch, ConfigError> {
    match tokio::fs::read_to_string(path).await {
        Ok(source) => parse_patch(&source),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Map::new()),
        Err(e) => Err(ConfigError::Patch(format!("{}: {}", path.display(), e))),
    }
}
