//! Applies an output schema to storage rows.
//!
//! Rows are plain JSON objects; prefetched related rows sit under the
//! relation attach key (accessor name for virtual relations). Big-int scalars
//! are rendered as strings so precision survives JavaScript clients.

use crate::meta::FieldType;
use crate::projection::schema::{OutputKind, OutputSchema};
use serde_json::{Map, Value};

pub fn serialize_rows(schema: &OutputSchema, rows: &[Value]) -> Value {
    Value::Array(rows.iter().map(|r| serialize_row(schema, r)).collect())
}

pub fn serialize_row(schema: &OutputSchema, row: &Value) -> Value {
    let mut out = Map::new();
    for field in &schema.fields {
        let value = match &field.kind {
            OutputKind::Scalar(ty) => coerce_scalar(*ty, row.get(&field.name)),
            OutputKind::Computed(c) => (c.compute)(row),
            OutputKind::Reference {
                concrete,
                to_one,
                read_key,
                related_pk,
            } => {
                if *concrete {
                    row.get(read_key).cloned().unwrap_or(Value::Null)
                } else {
                    reference_from_attached(row.get(read_key), *to_one, related_pk)
                }
            }
            OutputKind::Nested {
                attach_key,
                to_one,
                schema,
            } => nested_from_attached(row.get(attach_key), *to_one, schema),
        };
        out.insert(field.name.clone(), value);
    }
    Value::Object(out)
}

fn coerce_scalar(ty: FieldType, value: Option<&Value>) -> Value {
    let Some(value) = value else {
        return Value::Null;
    };
    match (ty, value) {
        (FieldType::BigInt, Value::Number(n)) => Value::String(n.to_string()),
        _ => value.clone(),
    }
}

/// Virtual relation requested without a sub-selection: surface the primary
/// keys of whatever was prefetched.
fn reference_from_attached(attached: Option<&Value>, to_one: bool, related_pk: &str) -> Value {
    match attached {
        Some(Value::Object(obj)) => obj.get(related_pk).cloned().unwrap_or(Value::Null),
        Some(Value::Array(rows)) => Value::Array(
            rows.iter()
                .filter_map(|r| r.get(related_pk).cloned())
                .collect(),
        ),
        _ if to_one => Value::Null,
        _ => Value::Array(Vec::new()),
    }
}

fn nested_from_attached(attached: Option<&Value>, to_one: bool, schema: &OutputSchema) -> Value {
    match attached {
        Some(Value::Object(_)) if to_one => serialize_row(schema, attached.unwrap()),
        Some(Value::Array(rows)) if to_one => rows
            .first()
            .map(|r| serialize_row(schema, r))
            .unwrap_or(Value::Null),
        Some(Value::Array(rows)) => Value::Array(rows.iter().map(|r| serialize_row(schema, r)).collect()),
        Some(Value::Object(_)) => Value::Array(vec![serialize_row(schema, attached.unwrap())]),
        _ if to_one => Value::Null,
        _ => Value::Array(Vec::new()),
    }
}
