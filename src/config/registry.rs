//! Resolved entity model: declarations validated and flattened for runtime use.

use crate::coerce::{default_timestamp_parser, json_to_sql, CoercionRegistry, TimestampParser};
use crate::config::{ColumnDescriptor, ColumnType, EntityDescriptor, ValueType};
use crate::error::ConfigError;
use crate::sql::SqlValue;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

/// Query parameters with a fixed meaning; columns cannot use these names.
pub const RESERVED_PARAMS: &[&str] = &["order", "select", "limit", "offset"];

/// Table names taken by the common routes.
const RESERVED_TABLES: &[&str] = &["health", "ready", "version"];

fn identifier_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("static regex"))
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ForeignKey {
    pub table_name: String,
    pub column_name: String,
}

#[derive(Clone, Debug)]
pub struct Column {
    pub name: String,
    /// Effective storage type; for references, the referenced key's type.
    pub value_type: ValueType,
    pub required: bool,
    pub primary_key: bool,
    /// Key assigned by the storage layer.
    pub auto_increment: bool,
    pub lazy: bool,
    pub max_len: Option<u32>,
    pub default: Option<SqlValue>,
    pub foreign_key: Option<ForeignKey>,
}

impl Column {
    /// Must be supplied (non-null) on insert.
    pub fn required_on_insert(&self) -> bool {
        self.required && !self.auto_increment && self.default.is_none()
    }
}

#[derive(Clone, Debug)]
pub struct Entity {
    pub name: String,
    pub table_name: String,
    pub primary_key: String,
    pub columns: Vec<Column>,
    pub coercions: CoercionRegistry,
}

impl Entity {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn key_column(&self) -> &Column {
        // build() guarantees exactly one primary key
        self.columns
            .iter()
            .find(|c| c.primary_key)
            .unwrap_or(&self.columns[0])
    }
}

/// All registered entities, keyed by table name. Immutable once built.
#[derive(Clone, Debug, Default)]
pub struct EntityRegistry {
    entities: Vec<Entity>,
    by_table: HashMap<String, usize>,
}

impl EntityRegistry {
    pub fn builder() -> EntityRegistryBuilder {
        EntityRegistryBuilder::default()
    }

    pub fn get(&self, table_name: &str) -> Option<&Entity> {
        self.by_table.get(table_name).map(|&i| &self.entities[i])
    }

    /// Entities in registration order.
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }
}

/// Collects declarations; `build` validates them and resolves references.
#[derive(Clone, Debug, Default)]
pub struct EntityRegistryBuilder {
    descriptors: Vec<EntityDescriptor>,
}

impl EntityRegistryBuilder {
    pub fn register(mut self, entity: EntityDescriptor) -> Self {
        self.descriptors.push(entity);
        self
    }

    pub fn register_all(mut self, entities: impl IntoIterator<Item = EntityDescriptor>) -> Self {
        self.descriptors.extend(entities);
        self
    }

    pub fn build(self) -> Result<EntityRegistry, ConfigError> {
        self.build_with_parser(default_timestamp_parser())
    }

    pub fn build_with_parser(self, parser: TimestampParser) -> Result<EntityRegistry, ConfigError> {
        let mut names = HashSet::new();
        let mut keys: HashMap<String, (String, String, ValueType)> = HashMap::new();
        let mut normalized = Vec::with_capacity(self.descriptors.len());

        // First pass: names and key types, so references can point forward.
        for desc in self.descriptors {
            let desc = with_implicit_key(desc)?;
            let table_name = desc.name.to_lowercase();
            if RESERVED_TABLES.contains(&table_name.as_str()) {
                return Err(ConfigError::ReservedName(desc.name));
            }
            if !names.insert(table_name.clone()) {
                return Err(ConfigError::DuplicateEntity(desc.name));
            }
            let key = desc
                .columns
                .iter()
                .find(|c| c.primary_key)
                .ok_or_else(|| ConfigError::InvalidPrimaryKey {
                    entity: desc.name.clone(),
                    reason: "no primary key".into(),
                })?;
            let key_type = key.type_.value_type().ok_or_else(|| ConfigError::InvalidPrimaryKey {
                entity: desc.name.clone(),
                reason: "primary key cannot be a reference".into(),
            })?;
            keys.insert(table_name.clone(), (table_name.clone(), key.name.clone(), key_type));
            normalized.push((table_name, desc));
        }

        let mut entities = Vec::with_capacity(normalized.len());
        let mut by_table = HashMap::new();
        for (table_name, desc) in normalized {
            let mut coercions = CoercionRegistry::new(parser.clone());
            let mut columns = Vec::with_capacity(desc.columns.len());
            let mut primary_key = String::new();
            for c in &desc.columns {
                let (value_type, foreign_key) = match &c.type_ {
                    ColumnType::Reference(target) => {
                        let (ref_table, ref_column, ref_type) =
                            keys.get(&target.to_lowercase()).ok_or_else(|| ConfigError::MissingReference {
                                entity: desc.name.clone(),
                                column: c.name.clone(),
                                target: target.clone(),
                            })?;
                        let fk = ForeignKey {
                            table_name: ref_table.clone(),
                            column_name: ref_column.clone(),
                        };
                        (*ref_type, Some(fk))
                    }
                    other => (other.value_type().unwrap_or(ValueType::Text), None),
                };
                let default = match &c.default {
                    Some(v) => Some(json_to_sql(v.clone(), value_type, &parser).map_err(|reason| {
                        ConfigError::InvalidDefault {
                            entity: desc.name.clone(),
                            column: c.name.clone(),
                            reason,
                        }
                    })?),
                    None => None,
                };
                if c.primary_key {
                    primary_key = c.name.clone();
                }
                coercions.insert(&c.name, value_type);
                columns.push(Column {
                    name: c.name.clone(),
                    value_type,
                    required: c.required || c.primary_key,
                    primary_key: c.primary_key,
                    auto_increment: c.primary_key && value_type == ValueType::Integer && default.is_none(),
                    lazy: c.lazy,
                    max_len: c.max_len,
                    default,
                    foreign_key,
                });
            }
            tracing::debug!(entity = %desc.name, table = %table_name, columns = columns.len(), "entity registered");
            by_table.insert(table_name.clone(), entities.len());
            entities.push(Entity {
                name: desc.name,
                table_name,
                primary_key,
                columns,
                coercions,
            });
        }

        Ok(EntityRegistry { entities, by_table })
    }
}

/// Validate identifiers and column uniqueness; prepend an `id` key when none is declared.
fn with_implicit_key(mut desc: EntityDescriptor) -> Result<EntityDescriptor, ConfigError> {
    if !identifier_re().is_match(&desc.name) {
        return Err(ConfigError::InvalidIdentifier(desc.name));
    }
    let mut seen = HashSet::new();
    for c in &desc.columns {
        if !identifier_re().is_match(&c.name) {
            return Err(ConfigError::InvalidIdentifier(format!("{}.{}", desc.name, c.name)));
        }
        if RESERVED_PARAMS.contains(&c.name.as_str()) {
            return Err(ConfigError::ReservedName(format!("{}.{}", desc.name, c.name)));
        }
        if !seen.insert(c.name.as_str()) {
            return Err(ConfigError::DuplicateColumn {
                entity: desc.name.clone(),
                column: c.name.clone(),
            });
        }
    }
    match desc.columns.iter().filter(|c| c.primary_key).count() {
        0 => {
            if seen.contains("id") {
                return Err(ConfigError::InvalidPrimaryKey {
                    entity: desc.name,
                    reason: "column 'id' exists but is not the primary key".into(),
                });
            }
            desc.columns
                .insert(0, ColumnDescriptor::new("id", ColumnType::Integer).primary_key());
        }
        1 => {}
        _ => {
            return Err(ConfigError::InvalidPrimaryKey {
                entity: desc.name,
                reason: "more than one primary key".into(),
            })
        }
    }
    Ok(desc)
}
