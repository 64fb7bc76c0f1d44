//! Override module locator.
//!
//! Embedding applications register override modules per scope: one global
//! module and one app-scoped module may exist per app label. A module exposes
//! view sets and statement declarations under composed names,
//! `"<Model><Endpoint>ViewSet"` and `"<Model><Endpoint>Statements"`, so the
//! same model serves differently shaped endpoints.

use crate::meta::ModelMeta;
use crate::overrides::statement::StatementDecl;
use crate::overrides::viewset::ViewSet;
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scope {
    Global,
    App,
}

/// The declarations one scope contributes for one app label.
#[derive(Debug, Default)]
pub struct OverrideModule {
    viewsets: HashMap<String, ViewSet>,
    statements: HashMap<String, StatementDecl>,
}

impl OverrideModule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a view set under `"<Model><Endpoint>ViewSet"`.
    pub fn viewset(mut self, model_name: &str, endpoint: &str, vs: ViewSet) -> Self {
        self.viewsets
            .insert(composed_name(model_name, endpoint, "ViewSet"), vs);
        self
    }

    /// Register statements under `"<Model><Endpoint>Statements"`.
    pub fn statements(mut self, model_name: &str, endpoint: &str, decl: StatementDecl) -> Self {
        self.statements
            .insert(composed_name(model_name, endpoint, "Statements"), decl);
        self
    }

    pub fn find_viewset(&self, model: &ModelMeta, endpoint: &str) -> Option<&ViewSet> {
        self.viewsets
            .get(&composed_name(&model.name, endpoint, "ViewSet"))
    }

    pub fn find_statements(&self, model: &ModelMeta, endpoint: &str) -> Option<&StatementDecl> {
        self.statements
            .get(&composed_name(&model.name, endpoint, "Statements"))
    }
}

/// `("Student", "client", "ViewSet")` -> `"StudentClientViewSet"`.
fn composed_name(model_name: &str, endpoint: &str, suffix: &str) -> String {
    let mut title = String::with_capacity(endpoint.len());
    let mut chars = endpoint.chars();
    if let Some(first) = chars.next() {
        title.extend(first.to_uppercase());
        title.extend(chars.flat_map(char::to_lowercase));
    }
    format!("{model_name}{title}{suffix}")
}

/// All registered override modules, addressed by scope and app label.
#[derive(Debug, Default)]
pub struct OverrideRegistry {
    global: HashMap<String, OverrideModule>,
    apps: HashMap<String, OverrideModule>,
}

impl OverrideRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn module(mut self, scope: Scope, app_label: &str, module: OverrideModule) -> Self {
        match scope {
            Scope::Global => self.global.insert(app_label.to_string(), module),
            Scope::App => self.apps.insert(app_label.to_string(), module),
        };
        self
    }

    pub fn locate(&self, scope: Scope, app_label: &str) -> Option<&OverrideModule> {
        match scope {
            Scope::Global => self.global.get(app_label),
            Scope::App => self.apps.get(app_label),
        }
    }

    /// Modules in priority order: app scope first, then global.
    pub fn chain(&self, app_label: &str) -> impl Iterator<Item = &OverrideModule> {
        self.locate(Scope::App, app_label)
            .into_iter()
            .chain(self.locate(Scope::Global, app_label))
    }
}
