//! Entity declarations: the static description of each table exposed over REST.

use serde::{Deserialize, Serialize};

/// Scalar storage type of a column once references are resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueType {
    Text,
    Integer,
    Float,
    Boolean,
    Timestamp,
    Date,
    Json,
}

impl ValueType {
    /// SQLite column type used in `CREATE TABLE`.
    pub fn sql_type(self) -> &'static str {
        match self {
            ValueType::Text | ValueType::Timestamp | ValueType::Date | ValueType::Json => "TEXT",
            ValueType::Integer => "INTEGER",
            ValueType::Float => "REAL",
            ValueType::Boolean => "BOOLEAN",
        }
    }
}

/// Declared column type. `reference` points at another entity by name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Text,
    Integer,
    Float,
    Boolean,
    Timestamp,
    Date,
    Json,
    Reference(String),
}

impl ColumnType {
    pub fn value_type(&self) -> Option<ValueType> {
        Some(match self {
            ColumnType::Text => ValueType::Text,
            ColumnType::Integer => ValueType::Integer,
            ColumnType::Float => ValueType::Float,
            ColumnType::Boolean => ValueType::Boolean,
            ColumnType::Timestamp => ValueType::Timestamp,
            ColumnType::Date => ValueType::Date,
            ColumnType::Json => ValueType::Json,
            ColumnType::Reference(_) => return None,
        })
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub type_: ColumnType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub primary_key: bool,
    /// Hidden from collection responses unless selected explicitly.
    #[serde(default)]
    pub lazy: bool,
    /// Formatting constraint for text columns (exported as `string` instead of `text`).
    #[serde(default)]
    pub max_len: Option<u32>,
    /// Literal default applied by the storage layer.
    #[serde(default)]
    pub default: Option<serde_json::Value>,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, type_: ColumnType) -> Self {
        ColumnDescriptor {
            name: name.into(),
            type_,
            required: false,
            primary_key: false,
            lazy: false,
            max_len: None,
            default: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.required = true;
        self
    }

    pub fn lazy(mut self) -> Self {
        self.lazy = true;
        self
    }

    pub fn max_len(mut self, n: u32) -> Self {
        self.max_len = Some(n);
        self
    }

    pub fn default_value(mut self, value: serde_json::Value) -> Self {
        self.default = Some(value);
        self
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EntityDescriptor {
    pub name: String,
    #[serde(default)]
    pub columns: Vec<ColumnDescriptor>,
}

impl EntityDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        EntityDescriptor {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    pub fn column(mut self, column: ColumnDescriptor) -> Self {
        self.columns.push(column);
        self
    }
}
