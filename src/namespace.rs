//! The reserved client namespace riding alongside the business payload.
//!
//! Request bodies may carry two top-level keys: the reserved `"prism"` block
//! (projection, filters, function name) and `"data"` (the business payload).
//! A missing or malformed namespace degrades to the empty namespace; it never
//! fails a request.

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Reserved body key for the request namespace.
pub const CLIENT_NAMESPACE: &str = "prism";
/// Body key for the business payload.
pub const CLIENT_DATA: &str = "data";

/// One selector in a projection: a plain field name, or a relation broken
/// down into a sub-selection per relation name.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FieldSelector {
    Field(String),
    Nested(BTreeMap<String, FieldSpec>),
}

/// Ordered, recursive field-selection tree supplied by the caller, e.g.
/// `["id", "name", {"school": ["name", {"teachers": ["name"]}]}]`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct FieldSpec(pub Vec<FieldSelector>);

impl FieldSpec {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn default_operator() -> String {
    "=".to_string()
}

/// One filter condition from the namespace. Operators the storage layer does
/// not understand are skipped, not rejected.
#[derive(Clone, Debug, Deserialize)]
pub struct FilterSpec {
    pub field: String,
    #[serde(default = "default_operator")]
    pub operator: String,
    pub value: Value,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RequestNamespace {
    #[serde(default)]
    pub fields: Option<FieldSpec>,
    #[serde(default)]
    pub filters: Vec<FilterSpec>,
    /// Function name for cloudfunc/batch actions.
    #[serde(default)]
    pub func: Option<String>,
}

impl RequestNamespace {
    /// Extract the namespace from a request body. Anything that does not
    /// deserialize cleanly degrades to the empty namespace.
    pub fn from_body(body: &Value) -> Self {
        let Some(raw) = body.get(CLIENT_NAMESPACE) else {
            return Self::default();
        };
        serde_json::from_value(raw.clone()).unwrap_or_default()
    }
}

/// Pull the business payload out of a request body. Absent key yields null.
pub fn payload_from_body(body: &Value) -> Value {
    body.get(CLIENT_DATA).cloned().unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_nested_field_spec() {
        let body = json!({
            "prism": {
                "fields": ["id", "name", {"school": ["name", {"teachers": ["name"]}]}],
                "filters": [{"field": "grade", "value": "3"}],
                "func": "promote"
            },
            "data": {"name": "allen"}
        });
        let ns = RequestNamespace::from_body(&body);
        let fields = ns.fields.expect("fields");
        assert_eq!(fields.0.len(), 3);
        match &fields.0[2] {
            FieldSelector::Nested(map) => {
                let school = map.get("school").expect("school sub-spec");
                assert_eq!(school.0.len(), 2);
            }
            other => panic!("expected nested selector, got {:?}", other),
        }
        assert_eq!(ns.filters.len(), 1);
        assert_eq!(ns.filters[0].operator, "=");
        assert_eq!(ns.func.as_deref(), Some("promote"));
        assert_eq!(payload_from_body(&body), json!({"name": "allen"}));
    }

    #[test]
    fn malformed_namespace_degrades_to_empty() {
        for body in [
            json!({"prism": "not an object"}),
            json!({"prism": 42}),
            json!({"prism": {"fields": {"bad": "shape"}}}),
            json!({"data": {}}),
            json!(null),
        ] {
            let ns = RequestNamespace::from_body(&body);
            assert!(ns.fields.is_none());
            assert!(ns.filters.is_empty());
            assert!(ns.func.is_none());
        }
    }
}
