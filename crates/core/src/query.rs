//! Parameterized query builder.
//!
//! Queries are built from validated field names and bound parameter values.
//! Values never appear in the rendered query text, so identifier values coming
//! from callers cannot change the shape of the query.

use core::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DomainError, DomainResult};
use crate::id::{DocumentId, PartitionKey};
use crate::record::{ID_FIELD, Record};

/// Alias used for the container in rendered query text.
pub const DEFAULT_ALIAS: &str = "c";

/// Sort direction for `ORDER BY`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Single-field equality predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    pub order: SortOrder,
}

/// Structured query: conjunction of equality filters, optional ordering and limit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    filters: Vec<Filter>,
    order_by: Option<OrderBy>,
    top: Option<u32>,
}

/// Named parameter bound to a rendered query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryParameter {
    pub name: String,
    pub value: Value,
}

/// Query text plus its parameter bindings, ready for a database client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuerySpec {
    pub query: String,
    pub parameters: Vec<QueryParameter>,
}

impl Query {
    /// `SELECT *` over the whole container.
    pub fn select_all() -> Self {
        Self::default()
    }

    /// Select the document with the given id.
    pub fn by_id(id: &DocumentId) -> Self {
        Self {
            filters: vec![Filter {
                field: ID_FIELD.to_string(),
                value: Value::String(id.to_string()),
            }],
            ..Self::default()
        }
    }

    /// Select by an id property and a partition property, both named by the caller.
    pub fn by_id_and_partition(
        id_field: &str,
        id: &DocumentId,
        partition_field: &str,
        partition: &PartitionKey,
    ) -> DomainResult<Self> {
        Self::select_all()
            .where_eq(id_field, id.as_str())?
            .where_eq(partition_field, partition.as_str())
    }

    /// Add an equality predicate (joined to the others with `AND`).
    pub fn where_eq(mut self, field: &str, value: impl Into<Value>) -> DomainResult<Self> {
        validate_field(field)?;
        self.filters.push(Filter {
            field: field.to_string(),
            value: value.into(),
        });
        Ok(self)
    }

    pub fn order_by(mut self, field: &str, order: SortOrder) -> DomainResult<Self> {
        validate_field(field)?;
        self.order_by = Some(OrderBy {
            field: field.to_string(),
            order,
        });
        Ok(self)
    }

    pub fn top(mut self, n: u32) -> Self {
        self.top = Some(n);
        self
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn limit(&self) -> Option<u32> {
        self.top
    }

    /// Render to query text with `@pN` placeholders.
    pub fn render(&self, alias: &str) -> QuerySpec {
        let mut query = String::from("SELECT ");
        if let Some(n) = self.top {
            query.push_str(&format!("TOP {n} "));
        }
        query.push_str(&format!("* FROM {alias}"));

        let mut parameters = Vec::with_capacity(self.filters.len());
        for (idx, filter) in self.filters.iter().enumerate() {
            let name = format!("@p{idx}");
            query.push_str(if idx == 0 { " WHERE " } else { " AND " });
            query.push_str(&format!("{} = {name}", field_ref(alias, &filter.field)));
            parameters.push(QueryParameter {
                name,
                value: filter.value.clone(),
            });
        }

        if let Some(order) = &self.order_by {
            let dir = match order.order {
                SortOrder::Ascending => "ASC",
                SortOrder::Descending => "DESC",
            };
            query.push_str(&format!(" ORDER BY {} {dir}", field_ref(alias, &order.field)));
        }

        QuerySpec { query, parameters }
    }

    /// Whether a record satisfies every equality filter.
    pub fn matches(&self, record: &Record) -> bool {
        self.filters
            .iter()
            .all(|f| lookup(record, &f.field) == Some(&f.value))
    }

    /// Filter, order and limit an in-memory result set.
    pub fn apply(&self, records: impl IntoIterator<Item = Record>) -> Vec<Record> {
        let mut out: Vec<Record> = records.into_iter().filter(|r| self.matches(r)).collect();

        if let Some(order) = &self.order_by {
            out.sort_by(|a, b| {
                let ord = compare_values(lookup(a, &order.field), lookup(b, &order.field));
                match order.order {
                    SortOrder::Ascending => ord,
                    SortOrder::Descending => ord.reverse(),
                }
            });
        }

        if let Some(n) = self.top {
            out.truncate(n as usize);
        }
        out
    }
}

fn validate_field(field: &str) -> DomainResult<()> {
    let valid = !field.is_empty()
        && field.split('.').all(|segment| {
            let mut chars = segment.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        });
    if valid {
        Ok(())
    } else {
        Err(DomainError::validation(format!("invalid query field name: {field:?}")))
    }
}

// Bracket notation keeps reserved words (e.g. `value`) usable as field names.
fn field_ref(alias: &str, field: &str) -> String {
    let mut out = alias.to_string();
    for segment in field.split('.') {
        out.push_str(&format!("[\"{segment}\"]"));
    }
    out
}

fn lookup<'a>(record: &'a Record, field: &str) -> Option<&'a Value> {
    let mut segments = field.split('.');
    let mut current = record.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

// Missing < null < bool < number < string; other kinds compare equal.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            None => 0,
            Some(Value::Null) => 1,
            Some(Value::Bool(_)) => 2,
            Some(Value::Number(_)) => 3,
            Some(Value::String(_)) => 4,
            Some(_) => 5,
        }
    }

    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}
