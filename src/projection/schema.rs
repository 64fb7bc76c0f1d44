//! Nested output-schema construction.
//!
//! Mirrors the requested field tree into a schema over the model graph. Any
//! unknown field name anywhere aborts with NotFound; no partial schema is
//! ever produced.

use crate::error::AppError;
use crate::meta::{ComputedField, FieldType, ModelMeta, ModelRef, Registry};
use crate::namespace::{FieldSelector, FieldSpec};

#[derive(Clone, Debug)]
pub enum OutputKind {
    Scalar(FieldType),
    Computed(ComputedField),
    /// Relation bound without a sub-selection: serialized as its raw key(s).
    Reference {
        concrete: bool,
        to_one: bool,
        read_key: String,
        related_pk: String,
    },
    /// Relation with a sub-selection: a nested schema over the related model.
    Nested {
        attach_key: String,
        to_one: bool,
        schema: Box<OutputSchema>,
    },
}

#[derive(Clone, Debug)]
pub struct OutputField {
    pub name: String,
    pub kind: OutputKind,
}

#[derive(Clone, Debug)]
pub struct OutputSchema {
    pub model: ModelRef,
    pub fields: Vec<OutputField>,
}

/// Build the output schema for `model` restricted to `spec`. An absent or
/// empty spec binds every persisted field (scalars plus concrete relation
/// references) and nothing else: no virtual relations, no computed fields.
pub fn build_schema(
    registry: &Registry,
    model: &ModelMeta,
    spec: Option<&FieldSpec>,
) -> Result<OutputSchema, AppError> {
    let mut fields = Vec::new();

    match spec.filter(|s| !s.is_empty()) {
        None => {
            for s in &model.scalars {
                fields.push(OutputField {
                    name: s.name.clone(),
                    kind: OutputKind::Scalar(s.type_),
                });
            }
            for r in model.concrete_relations() {
                fields.push(OutputField {
                    name: r.name.clone(),
                    kind: OutputKind::Reference {
                        concrete: true,
                        to_one: r.to_one,
                        read_key: r.local_key.clone(),
                        related_pk: r.remote_key.clone(),
                    },
                });
            }
        }
        Some(spec) => {
            for item in &spec.0 {
                match item {
                    FieldSelector::Field(name) => {
                        fields.push(bind_leaf(registry, model, name)?);
                    }
                    FieldSelector::Nested(map) => {
                        for (name, sub) in map {
                            fields.push(bind_nested(registry, model, name, sub)?);
                        }
                    }
                }
            }
        }
    }

    Ok(OutputSchema {
        model: model.model_ref(),
        fields,
    })
}

fn unknown_field(model: &ModelMeta, name: &str) -> AppError {
    AppError::ObjectNotFound(format!(
        "unknown field '{}' on {}.{}",
        name, model.app, model.slug
    ))
}

fn bind_leaf(registry: &Registry, model: &ModelMeta, name: &str) -> Result<OutputField, AppError> {
    if let Some(s) = model.scalar(name) {
        return Ok(OutputField {
            name: name.to_string(),
            kind: OutputKind::Scalar(s.type_),
        });
    }
    if let Some(c) = model.computed_field(name) {
        return Ok(OutputField {
            name: name.to_string(),
            kind: OutputKind::Computed(c.clone()),
        });
    }
    if let Some(r) = model.relation(name) {
        // Concrete relations read their own key column; virtual relations
        // surface the primary keys of the rows attached at the accessor.
        let related_pk = if r.concrete {
            r.remote_key.clone()
        } else {
            registry
                .model_by_ref(&r.related)
                .map(|m| m.pk.clone())
                .ok_or_else(|| unknown_field(model, name))?
        };
        return Ok(OutputField {
            name: name.to_string(),
            kind: OutputKind::Reference {
                concrete: r.concrete,
                to_one: r.to_one,
                read_key: if r.concrete {
                    r.local_key.clone()
                } else {
                    r.attach_key().to_string()
                },
                related_pk,
            },
        });
    }
    Err(unknown_field(model, name))
}

fn bind_nested(
    registry: &Registry,
    model: &ModelMeta,
    name: &str,
    sub: &FieldSpec,
) -> Result<OutputField, AppError> {
    // A sub-selection on a plain scalar (or computed) field degrades to the
    // leaf binding; only unknown names are an error.
    let Some(relation) = model.relation(name) else {
        return bind_leaf(registry, model, name);
    };
    let related = registry
        .model_by_ref(&relation.related)
        .ok_or_else(|| unknown_field(model, name))?;

    // Virtual relations are multi-valued unless they reverse a one-to-one;
    // concrete relations keep their declared cardinality.
    let to_one = relation.to_one;

    let schema = build_schema(registry, related, Some(sub))?;
    Ok(OutputField {
        name: name.to_string(),
        kind: OutputKind::Nested {
            attach_key: relation.attach_key().to_string(),
            to_one,
            schema: Box::new(schema),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{school_registry, school_registry_with_computed};
    use serde_json::json;

    fn spec(v: serde_json::Value) -> FieldSpec {
        serde_json::from_value(v).expect("field spec parses")
    }

    #[test]
    fn nested_schema_mirrors_request_with_cardinality() {
        let reg = school_registry();
        let student = reg.model("school", "student").unwrap();
        let s = build_schema(
            &reg,
            student,
            Some(&spec(json!([
                "id",
                {"school": ["name", {"teachers": ["name"]}]},
                {"card": ["card_number"]}
            ]))),
        )
        .unwrap();

        assert_eq!(s.fields.len(), 3);
        match &s.fields[1].kind {
            OutputKind::Nested { to_one, schema, .. } => {
                assert!(*to_one, "concrete fk is single-valued");
                match &schema.fields[1].kind {
                    OutputKind::Nested { to_one, attach_key, .. } => {
                        assert!(!*to_one, "virtual reverse fk is multi-valued");
                        assert_eq!(attach_key, "teachers");
                    }
                    other => panic!("expected nested teachers, got {:?}", other),
                }
            }
            other => panic!("expected nested school, got {:?}", other),
        }
        match &s.fields[2].kind {
            OutputKind::Nested { to_one, attach_key, .. } => {
                assert!(*to_one, "reverse one-to-one is single-valued");
                assert_eq!(attach_key, "card");
            }
            other => panic!("expected nested card, got {:?}", other),
        }
    }

    #[test]
    fn unknown_field_fails_whole_schema() {
        let reg = school_registry();
        let student = reg.model("school", "student").unwrap();
        let err = build_schema(
            &reg,
            student,
            Some(&spec(json!(["id", {"school": ["name", "bogus"]}]))),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::ObjectNotFound(_)));

        let err = build_schema(&reg, student, Some(&spec(json!(["bogus"])))).unwrap_err();
        assert!(matches!(err, AppError::ObjectNotFound(_)));
    }

    #[test]
    fn unrestricted_projection_binds_persisted_fields_only() {
        let reg = school_registry_with_computed();
        let student = reg.model("school", "student").unwrap();
        let s = build_schema(&reg, student, None).unwrap();
        let names: Vec<&str> = s.fields.iter().map(|f| f.name.as_str()).collect();
        assert!(names.contains(&"id"));
        assert!(names.contains(&"name"));
        assert!(names.contains(&"school"));
        assert!(!names.contains(&"display_name"), "computed is opt-in");
        assert!(!names.contains(&"card"), "virtual relations are not implicit");
        // Empty spec behaves the same as no spec.
        let s2 = build_schema(&reg, student, Some(&FieldSpec::default())).unwrap();
        assert_eq!(s.fields.len(), s2.fields.len());
    }

    #[test]
    fn computed_field_realized_only_when_requested() {
        let reg = school_registry_with_computed();
        let student = reg.model("school", "student").unwrap();
        let s = build_schema(&reg, student, Some(&spec(json!(["id", "display_name"])))).unwrap();
        assert!(matches!(s.fields[1].kind, OutputKind::Computed(_)));
    }

    #[test]
    fn relation_without_sub_selection_binds_reference() {
        let reg = school_registry();
        let student = reg.model("school", "student").unwrap();
        let s = build_schema(&reg, student, Some(&spec(json!(["school", "teachers"])))).unwrap();
        match &s.fields[0].kind {
            OutputKind::Reference { concrete, to_one, read_key, .. } => {
                assert!(concrete);
                assert!(to_one);
                assert_eq!(read_key, "school_id");
            }
            other => panic!("expected reference, got {:?}", other),
        }
        match &s.fields[1].kind {
            OutputKind::Reference { read_key, to_one, .. } => {
                assert_eq!(read_key, "teachers_ids");
                assert!(!to_one);
            }
            other => panic!("expected reference, got {:?}", other),
        }
    }
}
