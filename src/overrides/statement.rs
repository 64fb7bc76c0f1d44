//! Declarative statement resolution.
//!
//! Statements carry per-model, per-endpoint business-rule configuration as
//! named blocks of loose JSON. Global and app declarations merge with the app
//! scope winning per block key. Consumers read blocks defensively: a missing
//! or malformed block means "feature disabled," never an error.

use crate::meta::ModelMeta;
use crate::overrides::locator::OverrideRegistry;
use serde_json::Value;
use std::collections::HashMap;

/// Raw statement declaration as registered by an override module.
#[derive(Clone, Debug, Default)]
pub struct StatementDecl {
    blocks: HashMap<String, Value>,
}

impl StatementDecl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn block(mut self, name: &str, value: Value) -> Self {
        self.blocks.insert(name.to_string(), value);
        self
    }

    pub fn blocks(&self) -> &HashMap<String, Value> {
        &self.blocks
    }
}

/// The merged statement configuration for one request.
#[derive(Clone, Debug, Default)]
pub struct Statement {
    blocks: HashMap<String, Value>,
}

impl Statement {
    pub fn from_blocks(blocks: HashMap<String, Value>) -> Self {
        Statement { blocks }
    }

    pub fn block(&self, name: &str) -> Option<&Value> {
        self.blocks.get(name)
    }

    /// Read `{field, action_enabled}` out of a block, or nothing if the block
    /// is absent or not shaped that way.
    pub fn field_rule(&self, block: &str, action_name: &str) -> Option<&str> {
        let config = self.block(block)?.as_object()?;
        let field = config.get("field")?.as_str()?;
        if field.is_empty() {
            return None;
        }
        let enabled = config.get("action_enabled")?.as_object()?;
        if enabled.get(action_name)?.as_bool()? {
            Some(field)
        } else {
            None
        }
    }
}

/// Locate and merge the `"<Model><Endpoint>Statements"` declarations for a
/// request. Returns `None` when neither scope declares anything.
pub fn resolve_statement(
    overrides: &OverrideRegistry,
    endpoint: &str,
    app_label: &str,
    model: &ModelMeta,
) -> Option<Statement> {
    use crate::overrides::locator::Scope;

    let global = overrides
        .locate(Scope::Global, app_label)
        .and_then(|m| m.find_statements(model, endpoint));
    let app = overrides
        .locate(Scope::App, app_label)
        .and_then(|m| m.find_statements(model, endpoint));

    if global.is_none() && app.is_none() {
        return None;
    }

    let mut blocks = HashMap::new();
    if let Some(decl) = global {
        blocks.extend(decl.blocks().clone());
    }
    if let Some(decl) = app {
        blocks.extend(decl.blocks().clone());
    }
    Some(Statement::from_blocks(blocks))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overrides::locator::{OverrideModule, Scope};
    use crate::testutil::school_registry;
    use serde_json::json;

    #[test]
    fn app_scope_wins_on_conflicting_blocks() {
        let reg = school_registry();
        let student = reg.model("school", "student").unwrap();

        let overrides = OverrideRegistry::new()
            .module(
                Scope::Global,
                "school",
                OverrideModule::new().statements(
                    "Student",
                    "client",
                    StatementDecl::new()
                        .block("user_fill_config", json!({"field": "from_global"}))
                        .block("only_global", json!({"keep": true})),
                ),
            )
            .module(
                Scope::App,
                "school",
                OverrideModule::new().statements(
                    "Student",
                    "client",
                    StatementDecl::new()
                        .block("user_fill_config", json!({"field": "from_app"})),
                ),
            );

        let st = resolve_statement(&overrides, "client", "school", student).expect("resolves");
        assert_eq!(
            st.block("user_fill_config").unwrap()["field"],
            json!("from_app")
        );
        assert_eq!(st.block("only_global").unwrap()["keep"], json!(true));
    }

    #[test]
    fn single_scope_passes_through_and_absence_is_none() {
        let reg = school_registry();
        let student = reg.model("school", "student").unwrap();

        let overrides = OverrideRegistry::new().module(
            Scope::Global,
            "school",
            OverrideModule::new().statements(
                "Student",
                "client",
                StatementDecl::new().block("user_filter_config", json!({"field": "owner"})),
            ),
        );

        let st = resolve_statement(&overrides, "client", "school", student).expect("resolves");
        assert!(st.block("user_filter_config").is_some());

        let school = reg.model("school", "school").unwrap();
        assert!(resolve_statement(&overrides, "client", "school", school).is_none());
    }

    #[test]
    fn field_rule_reads_defensively() {
        let well_formed = Statement {
            blocks: [(
                "user_fill_config".to_string(),
                json!({"field": "owner", "action_enabled": {"create": true, "update": false}}),
            )]
            .into(),
        };
        assert_eq!(well_formed.field_rule("user_fill_config", "create"), Some("owner"));
        assert_eq!(well_formed.field_rule("user_fill_config", "update"), None);
        assert_eq!(well_formed.field_rule("user_fill_config", "destroy"), None);
        assert_eq!(well_formed.field_rule("missing_block", "create"), None);

        for malformed in [
            json!("not an object"),
            json!({"field": 42, "action_enabled": {"create": true}}),
            json!({"field": "", "action_enabled": {"create": true}}),
            json!({"field": "owner"}),
            json!({"field": "owner", "action_enabled": "nope"}),
            json!({"field": "owner", "action_enabled": {"create": "yes"}}),
        ] {
            let st = Statement {
                blocks: [("user_fill_config".to_string(), malformed)].into(),
            };
            assert_eq!(st.field_rule("user_fill_config", "create"), None);
        }
    }
}
