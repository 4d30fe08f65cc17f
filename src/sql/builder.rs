//! Builds parameterized SELECT, COUNT, INSERT, UPDATE, DELETE for one entity.

use crate::config::{Column, Entity};
use crate::sql::{FilterQuery, SqlValue};
use crate::window::Window;

/// Quote identifier for SQLite (safe: only from entity declarations).
pub fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

#[derive(Debug, Default)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf::default()
    }

    /// Append a bound parameter and return its placeholder number.
    pub(crate) fn push_param(&mut self, v: SqlValue) -> usize {
        self.params.push(v);
        self.params.len()
    }
}

fn column_list(columns: &[&Column]) -> String {
    columns
        .iter()
        .map(|c| quoted(&c.name))
        .collect::<Vec<_>>()
        .join(", ")
}

fn all_columns(entity: &Entity) -> Vec<&Column> {
    entity.columns.iter().collect()
}

/// SELECT the given columns for rows matching the filter, ordered, within the window.
pub fn select_window(entity: &Entity, filter: &FilterQuery, columns: &[&Column], window: &Window) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!("SELECT {} FROM {}", column_list(columns), quoted(&entity.table_name));
    filter.write_where(&mut q);
    filter.write_order_by(&mut q, entity);
    let limit = q.push_param(SqlValue::Integer(i64::try_from(window.len()).unwrap_or(i64::MAX)));
    let offset = q.push_param(SqlValue::Integer(i64::try_from(window.start).unwrap_or(i64::MAX)));
    q.sql.push_str(&format!(" LIMIT ?{} OFFSET ?{}", limit, offset));
    q
}

/// SELECT COUNT(*) of rows matching the filter.
pub fn count(entity: &Entity, filter: &FilterQuery) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!("SELECT COUNT(*) FROM {}", quoted(&entity.table_name));
    filter.write_where(&mut q);
    q
}

/// SELECT primary keys of matching rows, at most `limit` of them.
pub fn select_keys(entity: &Entity, filter: &FilterQuery, limit: u64) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!(
        "SELECT {} FROM {}",
        quoted(&entity.primary_key),
        quoted(&entity.table_name)
    );
    filter.write_where(&mut q);
    let n = q.push_param(SqlValue::Integer(limit as i64));
    q.sql.push_str(&format!(" LIMIT ?{}", n));
    q
}

/// INSERT one row. Columns absent from `values` get their storage default.
pub fn insert(entity: &Entity, values: &[(&Column, SqlValue)]) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = quoted(&entity.table_name);
    let returning = column_list(&all_columns(entity));
    if values.is_empty() {
        q.sql = format!("INSERT INTO {} DEFAULT VALUES RETURNING {}", table, returning);
        return q;
    }
    let mut cols = Vec::with_capacity(values.len());
    let mut placeholders = Vec::with_capacity(values.len());
    for (c, v) in values {
        let n = q.push_param(v.clone());
        cols.push(quoted(&c.name));
        placeholders.push(format!("?{}", n));
    }
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
        table,
        cols.join(", "),
        placeholders.join(", "),
        returning
    );
    q
}

/// UPDATE one row by primary key: SET only the given columns.
pub fn update_by_key(entity: &Entity, key: &SqlValue, values: &[(&Column, SqlValue)]) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = quoted(&entity.table_name);
    let returning = column_list(&all_columns(entity));
    let sets: Vec<String> = values
        .iter()
        .map(|(c, v)| {
            let n = q.push_param(v.clone());
            format!("{} = ?{}", quoted(&c.name), n)
        })
        .collect();
    let key_param = q.push_param(key.clone());
    if sets.is_empty() {
        q.sql = format!(
            "SELECT {} FROM {} WHERE {} = ?{}",
            returning,
            table,
            quoted(&entity.primary_key),
            key_param
        );
        return q;
    }
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = ?{} RETURNING {}",
        table,
        sets.join(", "),
        quoted(&entity.primary_key),
        key_param,
        returning
    );
    q
}

/// DELETE one row by primary key.
pub fn delete_by_key(entity: &Entity, key: &SqlValue) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(key.clone());
    q.sql = format!(
        "DELETE FROM {} WHERE {} = ?{}",
        quoted(&entity.table_name),
        quoted(&entity.primary_key),
        n
    );
    q
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ColumnDescriptor, ColumnType, EntityDescriptor, EntityRegistry};
    use crate::query::RequestQuery;

    fn registry() -> EntityRegistry {
        EntityRegistry::builder()
            .register(
                EntityDescriptor::new("T")
                    .column(ColumnDescriptor::new("s", ColumnType::Text).required())
                    .column(ColumnDescriptor::new("i", ColumnType::Integer)),
            )
            .build()
            .unwrap()
    }

    fn pairs(items: &[(&str, &str)]) -> RequestQuery {
        RequestQuery::from_pairs(items.iter().map(|(k, v)| (k.to_string(), v.to_string())))
    }

    #[test]
    fn quoted_escapes_double_quotes() {
        assert_eq!(quoted("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn window_select_binds_filters_then_limit_and_offset() {
        let reg = registry();
        let t = reg.get("t").unwrap();
        let filter = FilterQuery::compile(t, &pairs(&[("s", "eq.x"), ("i", "gt.3")])).unwrap();
        let cols: Vec<&Column> = t.columns.iter().collect();
        let q = select_window(t, &filter, &cols, &Window { start: 10, stop: 30 });
        assert_eq!(
            q.sql,
            "SELECT \"id\", \"s\", \"i\" FROM \"t\" WHERE \"s\" = ?1 AND \"i\" > ?2 ORDER BY \"id\" ASC LIMIT ?3 OFFSET ?4"
        );
        assert_eq!(
            q.params,
            vec![
                SqlValue::Text("x".into()),
                SqlValue::Integer(3),
                SqlValue::Integer(20),
                SqlValue::Integer(10)
            ]
        );
    }

    #[test]
    fn count_ignores_order() {
        let reg = registry();
        let t = reg.get("t").unwrap();
        let filter = FilterQuery::compile(t, &pairs(&[("order", "i.desc"), ("s", "like.a%")])).unwrap();
        let q = count(t, &filter);
        assert_eq!(q.sql, "SELECT COUNT(*) FROM \"t\" WHERE \"s\" LIKE ?1");
    }

    #[test]
    fn insert_without_values_uses_defaults() {
        let reg = registry();
        let t = reg.get("t").unwrap();
        let q = insert(t, &[]);
        assert!(q.sql.starts_with("INSERT INTO \"t\" DEFAULT VALUES RETURNING"));
        assert!(q.params.is_empty());
    }

    #[test]
    fn update_sets_values_before_the_key() {
        let reg = registry();
        let t = reg.get("t").unwrap();
        let s = t.column("s").unwrap();
        let q = update_by_key(t, &SqlValue::Integer(7), &[(s, SqlValue::Text("y".into()))]);
        assert_eq!(
            q.sql,
            "UPDATE \"t\" SET \"s\" = ?1 WHERE \"id\" = ?2 RETURNING \"id\", \"s\", \"i\""
        );
        assert_eq!(q.params[1], SqlValue::Integer(7));
    }

    #[test]
    fn delete_binds_the_key() {
        let reg = registry();
        let t = reg.get("t").unwrap();
        let q = delete_by_key(t, &SqlValue::Integer(1));
        assert_eq!(q.sql, "DELETE FROM \"t\" WHERE \"id\" = ?1");
    }
}
