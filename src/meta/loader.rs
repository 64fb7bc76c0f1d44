//! Builds the resolved registry from raw configuration.
//!
//! Reverse relations are derived here: every concrete relation materializes a
//! virtual relation on its target model, named after `related_name` when
//! given, else the lowercased source model name, with a storage accessor of
//! `<source>_set` for to-many reverses and the bare source name for reverse
//! one-to-one.

use crate::error::ConfigError;
use crate::meta::resolved::{
    AppMeta, ComputeFn, ComputedField, MatchMode, ModelMeta, ModelRef, Registry, RelationMeta,
    ScalarMeta,
};
use crate::meta::types::{FieldType, RelationKind, SpaceConfig};
use std::collections::HashMap;
use std::sync::Arc;

pub struct SpaceBuilder {
    config: SpaceConfig,
    computed: Vec<(ModelRef, ComputedField)>,
}

impl SpaceBuilder {
    pub fn new(config: SpaceConfig) -> Self {
        SpaceBuilder {
            config,
            computed: Vec::new(),
        }
    }

    /// Attach a computed field to `model` (`"app.slug"`). The compute closure
    /// receives the stored row and returns the output value.
    pub fn computed<F>(
        mut self,
        model: &str,
        name: &str,
        label: &str,
        output: FieldType,
        compute: F,
    ) -> Self
    where
        F: Fn(&serde_json::Value) -> serde_json::Value + Send + Sync + 'static,
    {
        let target = parse_model_ref(model, None);
        self.computed.push((
            target,
            ComputedField {
                name: name.to_string(),
                label: label.to_string(),
                output,
                compute: Arc::new(compute) as ComputeFn,
            },
        ));
        self
    }

    pub fn build(self) -> Result<Registry, ConfigError> {
        resolve(self.config, self.computed)
    }
}

fn parse_model_ref(target: &str, current_app: Option<&str>) -> ModelRef {
    match target.split_once('.') {
        Some((app, slug)) => ModelRef {
            app: app.to_string(),
            slug: slug.to_lowercase(),
        },
        None => ModelRef {
            app: current_app.unwrap_or_default().to_string(),
            slug: target.to_lowercase(),
        },
    }
}

fn resolve(
    config: SpaceConfig,
    computed: Vec<(ModelRef, ComputedField)>,
) -> Result<Registry, ConfigError> {
    let mut models: HashMap<ModelRef, ModelMeta> = HashMap::new();
    let mut names: HashMap<ModelRef, String> = HashMap::new();

    for app in &config.apps {
        for mc in &app.models {
            let slug = mc
                .slug
                .clone()
                .unwrap_or_else(|| mc.name.to_lowercase());
            let r = ModelRef {
                app: app.label.clone(),
                slug: slug.clone(),
            };
            if models.contains_key(&r) {
                return Err(ConfigError::Duplicate {
                    kind: "model",
                    id: r.to_string(),
                });
            }

            let mut scalars = Vec::new();
            let mut pk = None;
            for f in &mc.fields {
                if scalars.iter().any(|s: &ScalarMeta| s.name == f.name) {
                    return Err(ConfigError::Duplicate {
                        kind: "field",
                        id: format!("{}.{}", r, f.name),
                    });
                }
                let is_pk = f.name == "id";
                if is_pk {
                    pk = Some(f.name.clone());
                }
                scalars.push(ScalarMeta {
                    name: f.name.clone(),
                    type_: f.type_,
                    nullable: f.nullable,
                    label: f.label.clone(),
                    pk: is_pk,
                });
            }
            // Implicit big-int surrogate key when none is declared.
            let pk = match pk {
                Some(p) => p,
                None => {
                    scalars.insert(
                        0,
                        ScalarMeta {
                            name: "id".to_string(),
                            type_: FieldType::BigInt,
                            nullable: false,
                            label: None,
                            pk: true,
                        },
                    );
                    "id".to_string()
                }
            };

            names.insert(r.clone(), mc.name.clone());
            models.insert(
                r.clone(),
                ModelMeta {
                    app: app.label.clone(),
                    name: mc.name.clone(),
                    slug,
                    table: format!("{}_{}", app.label, r.slug),
                    pk,
                    scalars,
                    relations: Vec::new(),
                    computed: Vec::new(),
                    validation: mc.validation.clone(),
                },
            );
        }
    }

    // Concrete relations, then their derived reverse sides.
    for app in &config.apps {
        for mc in &app.models {
            let source = ModelRef {
                app: app.label.clone(),
                slug: mc
                    .slug
                    .clone()
                    .unwrap_or_else(|| mc.name.to_lowercase()),
            };
            for rc in &mc.relations {
                let target = parse_model_ref(&rc.to, Some(&app.label));
                let Some(target_pk) = models.get(&target).map(|m| m.pk.clone()) else {
                    return Err(ConfigError::MissingReference {
                        kind: "model",
                        id: target.to_string(),
                    });
                };
                let local_key = rc.column.clone().unwrap_or_else(|| match rc.kind {
                    RelationKind::ManyToMany => format!("{}_ids", rc.name),
                    _ => format!("{}_id", rc.name),
                });

                let source_model = models.get_mut(&source).expect("source model resolved");
                if source_model.scalar(&rc.name).is_some()
                    || source_model.relations.iter().any(|r| r.name == rc.name)
                {
                    return Err(ConfigError::Duplicate {
                        kind: "relation",
                        id: format!("{}.{}", source, rc.name),
                    });
                }
                source_model.relations.push(RelationMeta {
                    name: rc.name.clone(),
                    kind: rc.kind,
                    concrete: true,
                    to_one: !matches!(rc.kind, RelationKind::ManyToMany),
                    related: target.clone(),
                    accessor: None,
                    local_key: local_key.clone(),
                    remote_key: target_pk,
                    match_mode: match rc.kind {
                        RelationKind::ManyToMany => MatchMode::LocalContains,
                        _ => MatchMode::Eq,
                    },
                });

                let source_lower = names[&source].to_lowercase();
                let reverse_name = rc
                    .related_name
                    .clone()
                    .unwrap_or_else(|| source_lower.clone());
                let reverse_accessor = rc.related_name.clone().unwrap_or_else(|| {
                    match rc.kind {
                        RelationKind::OneToOne => source_lower.clone(),
                        _ => format!("{}_set", source_lower),
                    }
                });
                let target_pk = models[&target].pk.clone();
                let target_model = models.get_mut(&target).expect("target model resolved");
                if target_model.relations.iter().any(|r| r.name == reverse_name) {
                    return Err(ConfigError::Duplicate {
                        kind: "reverse relation",
                        id: format!("{}.{}", target, reverse_name),
                    });
                }
                target_model.relations.push(RelationMeta {
                    name: reverse_name,
                    kind: rc.kind,
                    concrete: false,
                    to_one: matches!(rc.kind, RelationKind::OneToOne),
                    related: source.clone(),
                    accessor: Some(reverse_accessor),
                    local_key: target_pk,
                    remote_key: local_key,
                    match_mode: match rc.kind {
                        RelationKind::ManyToMany => MatchMode::RemoteContains,
                        _ => MatchMode::Eq,
                    },
                });
            }
        }
    }

    for (target, field) in computed {
        let Some(model) = models.get_mut(&target) else {
            return Err(ConfigError::MissingReference {
                kind: "model",
                id: target.to_string(),
            });
        };
        if model.scalar(&field.name).is_some()
            || model.relations.iter().any(|r| r.name == field.name)
            || model.computed_field(&field.name).is_some()
        {
            return Err(ConfigError::Duplicate {
                kind: "computed field",
                id: format!("{}.{}", target, field.name),
            });
        }
        model.computed.push(field);
    }

    let identity = match &config.identity_model {
        Some(raw) => {
            let r = parse_model_ref(raw, None);
            if !models.contains_key(&r) {
                return Err(ConfigError::MissingReference {
                    kind: "identity model",
                    id: r.to_string(),
                });
            }
            Some(r)
        }
        None => None,
    };

    let mut apps: HashMap<String, AppMeta> = HashMap::new();
    for (r, model) in models {
        apps.entry(r.app.clone())
            .or_insert_with(|| AppMeta {
                label: r.app.clone(),
                models: HashMap::new(),
            })
            .models
            .insert(r.slug.clone(), Arc::new(model));
    }

    Ok(Registry { apps, identity })
}
