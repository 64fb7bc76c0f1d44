//! Raw declarative model configuration (the JSON/ser-de side).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    BigInt,
    Int,
    Float,
    Bool,
    String,
    Text,
    Date,
    DateTime,
    Uuid,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    ManyToOne,
    OneToOne,
    ManyToMany,
}

fn default_true() -> bool {
    true
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FieldConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub type_: FieldType,
    #[serde(default = "default_true")]
    pub nullable: bool,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RelationConfig {
    pub name: String,
    pub kind: RelationKind,
    /// Target model: `"app.slug"`, or a bare slug within the same app.
    pub to: String,
    /// Local key column; defaults to `<name>_id` (`<name>_ids` for
    /// many-to-many, which stores an id array).
    #[serde(default)]
    pub column: Option<String>,
    /// Name (and accessor) of the derived reverse relation on the target
    /// model. Defaults follow the source model's lowercased name.
    #[serde(default)]
    pub related_name: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ValidationRule {
    #[serde(default)]
    pub required: Option<bool>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub max_length: Option<u32>,
    #[serde(default)]
    pub min_length: Option<u32>,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub allowed: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pub minimum: Option<f64>,
    #[serde(default)]
    pub maximum: Option<f64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Type name, e.g. `"Student"`; composed into override lookup keys.
    pub name: String,
    /// Routing slug; defaults to the lowercased name.
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldConfig>,
    #[serde(default)]
    pub relations: Vec<RelationConfig>,
    #[serde(default)]
    pub validation: HashMap<String, ValidationRule>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    pub label: String,
    #[serde(default)]
    pub models: Vec<ModelConfig>,
}

/// Whole-space configuration: every app and model the layer serves.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SpaceConfig {
    pub apps: Vec<AppConfig>,
    /// `"app.slug"` of the model representing authenticated callers; the
    /// auto-fill rule needs it to locate user relations.
    #[serde(default)]
    pub identity_model: Option<String>,
}
