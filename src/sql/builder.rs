//! Builds parameterized SELECT, INSERT, UPDATE, DELETE from a resource.
//! Identifiers only ever come from the resource's whitelist; values are always bound.

use crate::case::to_snake_case;
use crate::error::{status, AppError};
use crate::message;
use crate::resource::{Record, Resource};
use serde_json::Value;

/// Comparison operators a filter key may end with. Longest first so `>=` wins over `>`.
pub const OPERATORS: &[&str] = &[">=", "<=", "!=", ">", "<"];

const DEFAULT_OPERATOR: &str = "=";

/// Quote identifier (safe: only from the whitelist).
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// A statement and the values bound to its placeholders. Only the builder creates one, so
/// storage never sees a statement without its parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct QueryBuf {
    sql: String,
    params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    /// Record a value and return its placeholder (`$1`, `$2`, ...).
    fn push_param(&mut self, v: Value) -> String {
        self.params.push(v);
        format!("${}", self.params.len())
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    pub fn is_insert(&self) -> bool {
        self.sql.starts_with("INSERT")
    }
}

#[derive(Clone, Copy)]
enum Reference {
    Filter,
    Column,
}

fn ensure_column(resource: &Resource, column: &str, reference: Reference) -> Result<(), AppError> {
    if resource.has_column(column) {
        return Ok(());
    }
    Err(match reference {
        Reference::Filter => AppError::server_with_status(
            status::BAD_FILTER,
            message::bad_filter(column, resource.type_name()),
        ),
        Reference::Column => AppError::server_with_status(
            status::BAD_COLUMN,
            message::bad_column(column, resource.type_name()),
        ),
    })
}

/// Split a filter key into its snake-cased column and operator. `"endDate >"` -> `("end_date", ">")`.
pub fn parse_filter_key(key: &str) -> (String, &'static str) {
    let key = key.trim();
    for &op in OPERATORS {
        if let Some(column) = key.strip_suffix(op) {
            return (to_snake_case(column.trim()), op);
        }
    }
    (to_snake_case(key), DEFAULT_OPERATOR)
}

fn where_clause(
    q: &mut QueryBuf,
    resource: &Resource,
    filter: &[(String, Value)],
) -> Result<String, AppError> {
    if filter.is_empty() {
        return Ok(String::new());
    }
    let mut parts = Vec::with_capacity(filter.len());
    for (key, value) in filter {
        let (column, op) = parse_filter_key(key);
        ensure_column(resource, &column, Reference::Filter)?;
        let ph = q.push_param(value.clone());
        parts.push(format!("{} {} {}", quoted(&column), op, ph));
    }
    Ok(format!(" WHERE {}", parts.join(" AND ")))
}

fn column_list(resource: &Resource) -> String {
    resource
        .columns()
        .map(|c| quoted(&c))
        .collect::<Vec<_>>()
        .join(", ")
}

/// SELECT with AND-joined filters. `fields = None` selects every declared column.
pub fn select(
    resource: &Resource,
    filter: &[(String, Value)],
    fields: Option<&[String]>,
) -> Result<QueryBuf, AppError> {
    let mut q = QueryBuf::new();
    let cols = match fields {
        None => column_list(resource),
        Some(fields) if fields.is_empty() => column_list(resource),
        Some(fields) => {
            let mut cols = Vec::with_capacity(fields.len());
            for field in fields {
                let column = to_snake_case(field);
                ensure_column(resource, &column, Reference::Column)?;
                cols.push(quoted(&column));
            }
            cols.join(", ")
        }
    };
    let where_sql = where_clause(&mut q, resource, filter)?;
    q.sql = format!(
        "SELECT {} FROM {}{}",
        cols,
        quoted(resource.table()),
        where_sql
    );
    Ok(q)
}

/// INSERT of the record's keys in insertion order; `DEFAULT VALUES` when the record is empty.
pub fn insert(resource: &Resource, record: &Record) -> Result<QueryBuf, AppError> {
    let mut q = QueryBuf::new();
    let table = quoted(resource.table());
    let returning = column_list(resource);
    if record.is_empty() {
        q.sql = format!("INSERT INTO {} DEFAULT VALUES RETURNING {}", table, returning);
        return Ok(q);
    }
    let mut cols = Vec::with_capacity(record.len());
    let mut placeholders = Vec::with_capacity(record.len());
    for (key, value) in record {
        let column = to_snake_case(key);
        ensure_column(resource, &column, Reference::Column)?;
        cols.push(quoted(&column));
        placeholders.push(q.push_param(value.clone()));
    }
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
        table,
        cols.join(", "),
        placeholders.join(", "),
        returning
    );
    Ok(q)
}

/// UPDATE by identity: SET over the record's keys, identity excluded.
pub fn update(resource: &Resource, record: &Record, id: &Value) -> Result<QueryBuf, AppError> {
    let mut q = QueryBuf::new();
    let id_column = resource.id_column();
    let mut sets = Vec::with_capacity(record.len());
    for (key, value) in record {
        let column = to_snake_case(key);
        if column == id_column {
            continue;
        }
        ensure_column(resource, &column, Reference::Column)?;
        let ph = q.push_param(value.clone());
        sets.push(format!("{} = {}", quoted(&column), ph));
    }
    if sets.is_empty() {
        return Err(AppError::request(message::empty_update(resource.name())));
    }
    let id_ph = q.push_param(id.clone());
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = {} RETURNING {}",
        quoted(resource.table()),
        sets.join(", "),
        quoted(&id_column),
        id_ph,
        column_list(resource)
    );
    Ok(q)
}

/// DELETE with the same filter rules as [`select`]. An empty filter is refused rather than
/// wiping the table.
pub fn delete(resource: &Resource, filter: &[(String, Value)]) -> Result<QueryBuf, AppError> {
    if filter.is_empty() {
        return Err(AppError::server(format!(
            "{} {}",
            message::UNFILTERED_DELETE,
            resource.name()
        )));
    }
    let mut q = QueryBuf::new();
    let where_sql = where_clause(&mut q, resource, filter)?;
    q.sql = format!("DELETE FROM {}{}", quoted(resource.table()), where_sql);
    Ok(q)
}
