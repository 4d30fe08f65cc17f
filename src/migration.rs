//! Create missing tables for registered entities: one `CREATE TABLE IF NOT EXISTS` each.
//! Existing tables are left alone; schema changes are out of scope.

use crate::config::{Entity, EntityRegistry, ValueType};
use crate::error::AppError;
use crate::sql::quoted;
use sqlx::SqlitePool;

/// DDL for one entity. Declared order is kept; the key is declared inline.
pub fn table_ddl(entity: &Entity) -> String {
    let mut col_defs: Vec<String> = Vec::with_capacity(entity.columns.len());
    for c in &entity.columns {
        let typ = match (c.value_type, c.max_len) {
            (ValueType::Text, Some(n)) => format!("VARCHAR({})", n),
            (ty, _) => ty.sql_type().to_string(),
        };
        let mut def = format!("{} {}", quoted(&c.name), typ);
        if c.primary_key {
            def.push_str(" PRIMARY KEY");
            if c.auto_increment {
                def.push_str(" AUTOINCREMENT");
            }
        } else if c.required {
            def.push_str(" NOT NULL");
        }
        if let Some(ref d) = c.default {
            def.push_str(" DEFAULT ");
            def.push_str(&d.to_sql_literal());
        }
        if let Some(ref fk) = c.foreign_key {
            def.push_str(&format!(
                " REFERENCES {} ({})",
                quoted(&fk.table_name),
                quoted(&fk.column_name)
            ));
        }
        col_defs.push(def);
    }
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n  {}\n)",
        quoted(&entity.table_name),
        col_defs.join(",\n  ")
    )
}

/// Create every registered entity's table if it does not exist yet.
pub async fn ensure_tables(pool: &SqlitePool, registry: &EntityRegistry) -> Result<(), AppError> {
    for entity in registry.entities() {
        let sql = table_ddl(entity);
        tracing::debug!(sql = %sql, "ddl");
        sqlx::query(&sql).execute(pool).await?;
    }
    tracing::info!(tables = registry.entities().len(), "tables ensured");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ColumnDescriptor, ColumnType, EntityDescriptor};
    use serde_json::json;

    fn registry() -> EntityRegistry {
        EntityRegistry::builder()
            .register(
                EntityDescriptor::new("Person")
                    .column(ColumnDescriptor::new("name", ColumnType::Text).required().max_len(40))
                    .column(ColumnDescriptor::new("score", ColumnType::Float).default_value(json!(0.5))),
            )
            .register(
                EntityDescriptor::new("Car")
                    .column(ColumnDescriptor::new("vin", ColumnType::Text).primary_key())
                    .column(ColumnDescriptor::new("owner", ColumnType::Reference("Person".into())).required()),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn ddl_declares_keys_defaults_and_references() {
        let reg = registry();
        assert_eq!(
            table_ddl(reg.get("person").unwrap()),
            "CREATE TABLE IF NOT EXISTS \"person\" (\n  \"id\" INTEGER PRIMARY KEY AUTOINCREMENT,\n  \"name\" VARCHAR(40) NOT NULL,\n  \"score\" REAL DEFAULT 0.5\n)"
        );
        assert_eq!(
            table_ddl(reg.get("car").unwrap()),
            "CREATE TABLE IF NOT EXISTS \"car\" (\n  \"vin\" TEXT PRIMARY KEY,\n  \"owner\" INTEGER NOT NULL REFERENCES \"person\" (\"id\")\n)"
        );
    }

    #[tokio::test]
    async fn ensure_tables_is_idempotent() {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let reg = registry();
        ensure_tables(&pool, &reg).await.unwrap();
        ensure_tables(&pool, &reg).await.unwrap();
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('person', 'car')")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(n, 2);
    }
}
