//! Resolved model metadata: config validated and flattened for runtime use.
//!
//! This is the relation metadata surface the projection compiler consumes:
//! `(model, field_name)` answers whether the field is a relation, whether it
//! is concrete (physically backed) or virtual (reverse, traversed through an
//! accessor name), the related model, and its cardinality.

use crate::meta::types::{FieldType, RelationKind, ValidationRule};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub type ComputeFn = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// Declared, non-persisted output attribute. Opt-in only: the schema compiler
/// realizes it when the caller names it explicitly.
#[derive(Clone)]
pub struct ComputedField {
    pub name: String,
    pub label: String,
    pub output: FieldType,
    pub compute: ComputeFn,
}

impl fmt::Debug for ComputedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComputedField")
            .field("name", &self.name)
            .field("output", &self.output)
            .finish()
    }
}

#[derive(Clone, Debug)]
pub struct ScalarMeta {
    pub name: String,
    pub type_: FieldType,
    pub nullable: bool,
    pub label: Option<String>,
    pub pk: bool,
}

/// Target model address, `app.slug`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ModelRef {
    pub app: String,
    pub slug: String,
}

impl fmt::Display for ModelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.app, self.slug)
    }
}

/// How child rows are matched to parent rows when stitching a relation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchMode {
    /// `child[remote_key] == parent[local_key]`
    Eq,
    /// `parent[local_key]` is an id array containing `child[remote_key]`
    /// (forward many-to-many).
    LocalContains,
    /// `child[remote_key]` is an id array containing `parent[local_key]`
    /// (reverse many-to-many).
    RemoteContains,
}

#[derive(Clone, Debug)]
pub struct RelationMeta {
    pub name: String,
    pub kind: RelationKind,
    /// Physically backed on this model. Virtual relations are the
    /// loader-derived reverse side.
    pub concrete: bool,
    pub to_one: bool,
    pub related: ModelRef,
    /// Storage traversal name; set for virtual relations only.
    pub accessor: Option<String>,
    /// Key column on this model's rows.
    pub local_key: String,
    /// Key column on the related model's rows.
    pub remote_key: String,
    pub match_mode: MatchMode,
}

impl RelationMeta {
    /// Key under which prefetched related rows attach to a parent row, and
    /// which the serializer reads: the accessor name for virtual relations,
    /// the field name otherwise.
    pub fn attach_key(&self) -> &str {
        self.accessor.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug)]
pub struct ModelMeta {
    pub app: String,
    pub name: String,
    pub slug: String,
    pub table: String,
    pub pk: String,
    pub scalars: Vec<ScalarMeta>,
    pub relations: Vec<RelationMeta>,
    pub computed: Vec<ComputedField>,
    pub validation: HashMap<String, ValidationRule>,
}

impl ModelMeta {
    pub fn model_ref(&self) -> ModelRef {
        ModelRef {
            app: self.app.clone(),
            slug: self.slug.clone(),
        }
    }

    pub fn scalar(&self, name: &str) -> Option<&ScalarMeta> {
        self.scalars.iter().find(|s| s.name == name)
    }

    /// Relation by declared name, falling back to virtual accessor names so
    /// already-translated path segments resolve too.
    pub fn relation(&self, name: &str) -> Option<&RelationMeta> {
        self.relations
            .iter()
            .find(|r| r.name == name)
            .or_else(|| {
                self.relations
                    .iter()
                    .find(|r| !r.concrete && r.accessor.as_deref() == Some(name))
            })
    }

    pub fn computed_field(&self, name: &str) -> Option<&ComputedField> {
        self.computed.iter().find(|c| c.name == name)
    }

    pub fn concrete_relations(&self) -> impl Iterator<Item = &RelationMeta> {
        self.relations.iter().filter(|r| r.concrete)
    }

    /// First concrete relation pointing at the given model, if any.
    pub fn relation_to(&self, target: &ModelRef) -> Option<&RelationMeta> {
        self.concrete_relations().find(|r| r.related == *target)
    }

    /// Persisted column names: scalars (the pk is always one) and concrete
    /// relation keys.
    pub fn columns(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self.scalars.iter().map(|s| s.name.as_str()).collect();
        out.extend(self.concrete_relations().map(|r| r.local_key.as_str()));
        out
    }
}

#[derive(Debug, Default)]
pub struct AppMeta {
    pub label: String,
    pub models: HashMap<String, Arc<ModelMeta>>,
}

/// The resolved space: every app and model, plus the identity-model marker.
/// Built once at startup and shared immutably.
#[derive(Debug, Default)]
pub struct Registry {
    pub apps: HashMap<String, AppMeta>,
    pub identity: Option<ModelRef>,
}

impl Registry {
    pub fn app(&self, label: &str) -> Option<&AppMeta> {
        self.apps.get(label)
    }

    pub fn model(&self, app: &str, slug: &str) -> Option<&Arc<ModelMeta>> {
        self.apps.get(app).and_then(|a| a.models.get(slug))
    }

    pub fn model_by_ref(&self, r: &ModelRef) -> Option<&Arc<ModelMeta>> {
        self.model(&r.app, &r.slug)
    }

    pub fn identity_model(&self) -> Option<&Arc<ModelMeta>> {
        self.identity.as_ref().and_then(|r| self.model_by_ref(r))
    }
}
