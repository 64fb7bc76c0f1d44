//! Priority-ordered handler resolution.
//!
//! The effective handler for an action comes from the merged override surface
//! (app scope shadowing global), searched per-action first and then through
//! view-level fallbacks; named-function actions rewrite the lookup key to
//! `<action>_<func>` so distinct client function names map to distinct
//! handlers on one surface, and never fall back.

use crate::action::Action;
use crate::meta::ModelMeta;
use crate::overrides::locator::OverrideRegistry;
use crate::overrides::viewset::ActionHandler;
use std::sync::Arc;

/// Resolve the override handler for one request. `None` means the built-in
/// default applies (standard actions) or the request must fail with
/// FunctionNotFound (named-function actions) - the dispatcher decides.
pub fn resolve_handler(
    overrides: &OverrideRegistry,
    endpoint: &str,
    app_label: &str,
    model: &ModelMeta,
    action: Action,
    func: Option<&str>,
) -> Option<Arc<dyn ActionHandler>> {
    let lookup = if action.is_named_function() {
        Some(format!("{}_{}", action.name(), func?))
    } else {
        None
    };
    let lookup = lookup.as_deref().unwrap_or(action.name());

    for module in overrides.chain(app_label) {
        if let Some(vs) = module.find_viewset(model, endpoint) {
            if let Some(h) = vs.handler(lookup) {
                return Some(h.clone());
            }
        }
    }

    if !action.is_named_function() {
        for module in overrides.chain(app_label) {
            if let Some(vs) = module.find_viewset(model, endpoint) {
                if let Some(h) = vs.fallback_handler() {
                    return Some(h.clone());
                }
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::overrides::locator::{OverrideModule, Scope};
    use crate::overrides::viewset::ViewSet;
    use crate::service::dispatch::DispatchContext;
    use crate::testutil::school_registry;
    use async_trait::async_trait;
    use serde_json::{json, Value};

    /// Test handler that just names itself.
    struct Tagged(&'static str);

    #[async_trait]
    impl ActionHandler for Tagged {
        async fn call(&self, _ctx: &mut DispatchContext) -> Result<Value, AppError> {
            Ok(json!(self.0))
        }
    }

    fn tagged(name: &'static str) -> Arc<dyn ActionHandler> {
        Arc::new(Tagged(name))
    }

    #[test]
    fn action_entry_beats_fallback_beats_nothing() {
        let reg = school_registry();
        let student = reg.model("school", "student").unwrap().clone();

        let overrides = OverrideRegistry::new().module(
            Scope::App,
            "school",
            OverrideModule::new().viewset(
                "Student",
                "client",
                ViewSet::new()
                    .action("list", tagged("method"))
                    .fallback(tagged("view")),
            ),
        );

        let h = resolve_handler(&overrides, "client", "school", &student, Action::List, None);
        assert!(h.is_some(), "method-level entry resolves");

        // No entry for retrieve: the view-level fallback resolves instead.
        let h = resolve_handler(&overrides, "client", "school", &student, Action::Retrieve, None);
        assert!(h.is_some(), "fallback resolves for standard actions");

        // Another model on the same endpoint has no surface at all.
        let school_model = reg.model("school", "school").unwrap().clone();
        let h = resolve_handler(&overrides, "client", "school", &school_model, Action::List, None);
        assert!(h.is_none(), "no surface means builtin default");
    }

    #[test]
    fn app_scope_shadows_global_scope() {
        let reg = school_registry();
        let student = reg.model("school", "student").unwrap().clone();

        let overrides = OverrideRegistry::new()
            .module(
                Scope::Global,
                "school",
                OverrideModule::new().viewset(
                    "Student",
                    "client",
                    ViewSet::new()
                        .action("list", tagged("global"))
                        .action("destroy", tagged("global_destroy")),
                ),
            )
            .module(
                Scope::App,
                "school",
                OverrideModule::new().viewset(
                    "Student",
                    "client",
                    ViewSet::new().action("list", tagged("app")),
                ),
            );

        // Both scopes define list; the app entry is found first.
        let h = resolve_handler(&overrides, "client", "school", &student, Action::List, None)
            .expect("resolves");
        let app_entry = overrides
            .locate(Scope::App, "school")
            .and_then(|m| m.find_viewset(&student, "client"))
            .and_then(|vs| vs.handler("list"))
            .expect("app entry");
        assert!(Arc::ptr_eq(&h, app_entry));

        // Only global defines destroy; the merged surface still exposes it.
        let h = resolve_handler(&overrides, "client", "school", &student, Action::Destroy, None);
        assert!(h.is_some());
    }

    #[test]
    fn named_functions_need_an_exact_aliased_entry() {
        let reg = school_registry();
        let student = reg.model("school", "student").unwrap().clone();

        let overrides = OverrideRegistry::new().module(
            Scope::App,
            "school",
            OverrideModule::new().viewset(
                "Student",
                "client",
                ViewSet::new()
                    .action("cloudfunc_bar", tagged("bar"))
                    .fallback(tagged("view")),
            ),
        );

        // cloudfunc "foo" does not resolve even though cloudfunc_bar and a
        // fallback exist.
        let h = resolve_handler(
            &overrides, "client", "school", &student, Action::CloudFunc, Some("foo"),
        );
        assert!(h.is_none());

        let h = resolve_handler(
            &overrides, "client", "school", &student, Action::CloudFunc, Some("bar"),
        );
        assert!(h.is_some());

        // A missing function name never resolves.
        let h = resolve_handler(&overrides, "client", "school", &student, Action::Batch, None);
        assert!(h.is_none());
    }

    #[test]
    fn endpoints_are_independent_surfaces() {
        let reg = school_registry();
        let student = reg.model("school", "student").unwrap().clone();

        let overrides = OverrideRegistry::new().module(
            Scope::App,
            "school",
            OverrideModule::new().viewset(
                "Student",
                "manage",
                ViewSet::new().action("list", tagged("manage")),
            ),
        );

        let h = resolve_handler(&overrides, "client", "school", &student, Action::List, None);
        assert!(h.is_none(), "client endpoint has no override");
        let h = resolve_handler(&overrides, "manage", "school", &student, Action::List, None);
        assert!(h.is_some());
    }
}
