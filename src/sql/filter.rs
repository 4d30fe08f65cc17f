//! Compile `column=op.value` filters and `order=column.dir` into a parameterized predicate.
//!
//! Only identifiers taken from the entity declaration and operator symbols from a
//! closed set are written into SQL text. Every value is a bound parameter.

use crate::config::Entity;
use crate::error::AppError;
use crate::query::RequestQuery;
use crate::sql::{quoted, QueryBuf, SqlValue};
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
}

impl Operator {
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Like => "LIKE",
        }
    }
}

impl FromStr for Operator {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "eq" => Ok(Operator::Eq),
            "gt" => Ok(Operator::Gt),
            "gte" => Ok(Operator::Gte),
            "lt" => Ok(Operator::Lt),
            "lte" => Ok(Operator::Lte),
            "like" => Ok(Operator::Like),
            other => Err(AppError::BadOperator(other.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    fn sql(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

impl FromStr for Direction {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "asc" => Ok(Direction::Asc),
            "desc" => Ok(Direction::Desc),
            other => Err(AppError::BadOperator(format!("sort direction {}", other))),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FilterClause {
    pub column: String,
    pub operator: Operator,
    pub value: SqlValue,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortDirective {
    pub column: String,
    pub direction: Direction,
}

/// Conjunction of filter clauses plus optional ordering for one entity.
#[derive(Clone, Debug, Default)]
pub struct FilterQuery {
    pub clauses: Vec<FilterClause>,
    pub order: Option<SortDirective>,
}

impl FilterQuery {
    pub fn compile(entity: &Entity, query: &RequestQuery) -> Result<Self, AppError> {
        let mut clauses = Vec::new();
        for (key, raw) in &query.filters {
            let Some(column) = entity.column(key) else {
                tracing::debug!(entity = %entity.name, param = %key, "ignoring unknown filter parameter");
                continue;
            };
            let (op, value) = raw.split_once('.').unwrap_or((raw.as_str(), ""));
            if value.is_empty() {
                continue;
            }
            let operator: Operator = op.parse()?;
            let value = entity.coercions.coerce(&column.name, value)?;
            clauses.push(FilterClause {
                column: column.name.clone(),
                operator,
                value,
            });
        }

        let order = match query.order.as_deref() {
            Some(directive) if !directive.is_empty() => {
                let (field, dir) = directive.split_once('.').unwrap_or((directive, ""));
                let column = entity
                    .column(field)
                    .ok_or_else(|| AppError::BadField(field.to_string()))?;
                Some(SortDirective {
                    column: column.name.clone(),
                    direction: dir.parse()?,
                })
            }
            _ => None,
        };

        Ok(FilterQuery { clauses, order })
    }

    /// Append ` WHERE a AND b ...`, binding each value.
    pub fn write_where(&self, q: &mut QueryBuf) {
        if self.clauses.is_empty() {
            return;
        }
        let parts: Vec<String> = self
            .clauses
            .iter()
            .map(|c| {
                let n = q.push_param(c.value.clone());
                format!("{} {} ?{}", quoted(&c.column), c.operator.symbol(), n)
            })
            .collect();
        q.sql.push_str(" WHERE ");
        q.sql.push_str(&parts.join(" AND "));
    }

    /// Append ` ORDER BY`; the primary key breaks ties so windows are stable.
    pub fn write_order_by(&self, q: &mut QueryBuf, entity: &Entity) {
        let pk = quoted(&entity.primary_key);
        match &self.order {
            Some(sort) if sort.column != entity.primary_key => {
                q.sql.push_str(&format!(
                    " ORDER BY {} {}, {} ASC",
                    quoted(&sort.column),
                    sort.direction.sql(),
                    pk
                ));
            }
            Some(sort) => q.sql.push_str(&format!(" ORDER BY {} {}", pk, sort.direction.sql())),
            None => q.sql.push_str(&format!(" ORDER BY {} ASC", pk)),
        }
    }
}
