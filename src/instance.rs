//! Per-request instance state.
//!
//! One fixed-shape record per request carrying every resolved value the
//! lifecycle produces. Created at request start, dropped at request end,
//! never shared between requests.

use crate::action::Action;
use crate::error::AppError;
use crate::meta::{ModelMeta, Registry};
use crate::namespace::RequestNamespace;
use crate::overrides::statement::Statement;
use crate::overrides::viewset::ActionHandler;
use crate::projection::{build_schema, prefetch_paths, translate_paths, OutputSchema};
use serde_json::Value;
use std::sync::{Arc, OnceLock};

/// Authenticated caller identity, supplied by the transport layer. Absence
/// means anonymous.
#[derive(Clone, Debug)]
pub struct Caller {
    pub id: Value,
    pub username: String,
}

pub struct InstanceState {
    pub endpoint: String,
    pub app_label: String,
    pub model_slug: String,
    pub model: Arc<ModelMeta>,
    pub action: Action,
    pub namespace: RequestNamespace,
    /// Resolved override handler, if any; resolved once per request.
    pub handler: Option<Arc<dyn ActionHandler>>,
    pub statement: Option<Statement>,
    translated: OnceLock<Vec<String>>,
}

impl InstanceState {
    pub fn new(
        endpoint: String,
        app_label: String,
        model_slug: String,
        model: Arc<ModelMeta>,
        action: Action,
        namespace: RequestNamespace,
    ) -> Self {
        InstanceState {
            endpoint,
            app_label,
            model_slug,
            model,
            action,
            namespace,
            handler: None,
            statement: None,
            translated: OnceLock::new(),
        }
    }

    /// Translated prefetch paths for the requested projection; computed at
    /// most once per request and never failing (a bad spec yields no paths).
    pub fn translated_paths(&self, registry: &Registry) -> &[String] {
        self.translated.get_or_init(|| {
            let Some(fields) = &self.namespace.fields else {
                return Vec::new();
            };
            let candidates = prefetch_paths(fields);
            translate_paths(registry, &self.model, &candidates)
        })
    }

    /// Output schema for the requested projection. Unlike the prefetch plan,
    /// schema construction is fatal on unknown field names.
    pub fn schema(&self, registry: &Registry) -> Result<OutputSchema, AppError> {
        build_schema(registry, &self.model, self.namespace.fields.as_ref())
    }

    pub fn func_name(&self) -> Option<&str> {
        self.namespace.func.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::school_registry;
    use serde_json::json;

    #[test]
    fn translated_paths_memoize_once() {
        let reg = school_registry();
        let school = reg.model("school", "school").unwrap().clone();
        let ns: RequestNamespace = serde_json::from_value(json!({
            "fields": ["name", {"student": ["name", {"teachers": ["name"]}]}]
        }))
        .unwrap();
        let state = InstanceState::new(
            "client".into(),
            "school".into(),
            "school".into(),
            school,
            Action::List,
            ns,
        );
        let first = state.translated_paths(&reg).to_vec();
        assert_eq!(first, vec!["student_set.teachers".to_string()]);
        let second = state.translated_paths(&reg);
        assert_eq!(second, first.as_slice());
    }
}
