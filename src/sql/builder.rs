//! Builds parameterized SELECT, INSERT, UPDATE, DELETE from model metadata.

use crate::meta::{FieldType, ModelMeta};
use crate::namespace::FilterSpec;
use crate::storage::KeyMatch;
use serde_json::Value;

/// Quote identifier for PostgreSQL (safe: only from config).
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: Value) -> usize {
        self.params.push(v);
        self.params.len()
    }
}

/// SQL cast for a column, so string/json values bind correctly.
fn pg_cast(model: &ModelMeta, column: &str) -> Option<&'static str> {
    if let Some(s) = model.scalar(column) {
        return match s.type_ {
            FieldType::Date => Some("date"),
            FieldType::DateTime => Some("timestamptz"),
            FieldType::Uuid => Some("uuid"),
            FieldType::Json => Some("jsonb"),
            _ => None,
        };
    }
    // Many-to-many key columns store id arrays as jsonb.
    model
        .concrete_relations()
        .find(|r| r.local_key == column && !r.to_one)
        .map(|_| "jsonb")
}

fn placeholder(model: &ModelMeta, column: &str, n: usize) -> String {
    match pg_cast(model, column) {
        Some(cast) => format!("${}::{}", n, cast),
        None => format!("${}", n),
    }
}

fn column_list(model: &ModelMeta) -> String {
    model
        .columns()
        .iter()
        .map(|c| quoted(c))
        .collect::<Vec<_>>()
        .join(", ")
}

/// SELECT by primary key. Caller binds the id as sole param.
pub fn select_by_id(model: &ModelMeta) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} = $1",
        column_list(model),
        quoted(&model.table),
        quoted(&model.pk)
    );
    q
}

/// SELECT list with exact-match filters, ORDER BY pk. Filters naming unknown
/// columns or unsupported operators are skipped.
pub fn select_list(model: &ModelMeta, filters: &[FilterSpec]) -> QueryBuf {
    let mut q = QueryBuf::new();
    let columns = model.columns();
    let mut where_parts = Vec::new();
    for f in filters {
        if !columns.iter().any(|c| *c == f.field) {
            continue;
        }
        match f.operator.as_str() {
            "=" => {
                let n = q.push_param(f.value.clone());
                where_parts.push(format!("{} = {}", quoted(&f.field), placeholder(model, &f.field, n)));
            }
            "in" => {
                if let Value::Array(options) = &f.value {
                    if options.is_empty() {
                        where_parts.push("1 = 0".to_string());
                        continue;
                    }
                    let ph: Vec<String> = options
                        .iter()
                        .map(|v| {
                            let n = q.push_param(v.clone());
                            placeholder(model, &f.field, n)
                        })
                        .collect();
                    where_parts.push(format!("{} IN ({})", quoted(&f.field), ph.join(", ")));
                }
            }
            _ => {}
        }
    }
    let where_clause = if where_parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", where_parts.join(" AND "))
    };
    q.sql = format!(
        "SELECT {} FROM {}{} ORDER BY {}",
        column_list(model),
        quoted(&model.table),
        where_clause,
        quoted(&model.pk)
    );
    q
}

/// SELECT rows whose column matches the key set: `IN` for plain keys, jsonb
/// containment for id-array columns.
pub fn select_by_key_in(
    model: &ModelMeta,
    column: &str,
    keys: &[Value],
    mode: KeyMatch,
) -> QueryBuf {
    let mut q = QueryBuf::new();
    if keys.is_empty() {
        q.sql = format!(
            "SELECT {} FROM {} WHERE 1 = 0",
            column_list(model),
            quoted(&model.table)
        );
        return q;
    }
    let clause = match mode {
        KeyMatch::Eq => {
            let ph: Vec<String> = keys
                .iter()
                .map(|v| {
                    let n = q.push_param(v.clone());
                    placeholder(model, column, n)
                })
                .collect();
            format!("{} IN ({})", quoted(column), ph.join(", "))
        }
        KeyMatch::Contains => {
            let ph: Vec<String> = keys
                .iter()
                .map(|v| {
                    let n = q.push_param(Value::Array(vec![v.clone()]));
                    format!("{} @> ${}::jsonb", quoted(column), n)
                })
                .collect();
            format!("({})", ph.join(" OR "))
        }
    };
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} ORDER BY {}",
        column_list(model),
        quoted(&model.table),
        clause,
        quoted(&model.pk)
    );
    q
}

/// INSERT from body; only persisted columns are written, and the primary key
/// is omitted when absent so the database default applies.
pub fn insert(model: &ModelMeta, body: &Value) -> QueryBuf {
    let mut q = QueryBuf::new();
    let empty = serde_json::Map::new();
    let body = body.as_object().unwrap_or(&empty);
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for column in model.columns() {
        let value = body.get(column);
        if column == model.pk && value.map_or(true, Value::is_null) {
            continue;
        }
        let Some(value) = value else { continue };
        let n = q.push_param(value.clone());
        placeholders.push(placeholder(model, column, n));
        cols.push(quoted(column));
    }
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
        quoted(&model.table),
        cols.join(", "),
        placeholders.join(", "),
        column_list(model)
    );
    q
}

/// UPDATE by id: SET only persisted columns present in body, never the pk.
pub fn update(model: &ModelMeta, id: &Value, body: &Value) -> QueryBuf {
    let mut q = QueryBuf::new();
    let empty = serde_json::Map::new();
    let body = body.as_object().unwrap_or(&empty);
    let mut sets = Vec::new();
    for column in model.columns() {
        if column == model.pk {
            continue;
        }
        if let Some(value) = body.get(column) {
            let n = q.push_param(value.clone());
            sets.push(format!("{} = {}", quoted(column), placeholder(model, column, n)));
        }
    }
    if sets.is_empty() {
        q.sql = format!(
            "SELECT {} FROM {} WHERE {} = $1",
            column_list(model),
            quoted(&model.table),
            quoted(&model.pk)
        );
        q.params.push(id.clone());
        return q;
    }
    let id_param = q.push_param(id.clone());
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = ${} RETURNING {}",
        quoted(&model.table),
        sets.join(", "),
        quoted(&model.pk),
        id_param,
        column_list(model)
    );
    q
}

/// DELETE by id. Caller binds the id as sole param.
pub fn delete(model: &ModelMeta) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!(
        "DELETE FROM {} WHERE {} = $1 RETURNING {}",
        quoted(&model.table),
        quoted(&model.pk),
        quoted(&model.pk)
    );
    q
}
