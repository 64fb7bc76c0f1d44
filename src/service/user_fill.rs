//! Auto-fill of the calling user's identity field on write actions.
//!
//! Whitelist rule: create/update-family actions only, authenticated callers
//! only, non-empty object bodies only, and only when the resolved statement
//! declares a well-formed `user_fill_config` block enabling this action.
//! Handles a single level of the payload. Never raises.

use crate::action::Action;
use crate::instance::Caller;
use crate::meta::{ModelMeta, Registry};
use crate::overrides::statement::Statement;
use serde_json::Value;

pub const USER_FILL_BLOCK: &str = "user_fill_config";
/// Companion block consumed by the "mine" actions.
pub const USER_FILTER_BLOCK: &str = "user_filter_config";

/// Inject the caller's id into the configured field when every condition
/// holds and the field is absent from the payload. No-op otherwise.
pub fn apply_user_fill(
    registry: &Registry,
    model: &ModelMeta,
    statement: Option<&Statement>,
    action: Action,
    caller: Option<&Caller>,
    payload: &mut Value,
) {
    if !action.is_fill_target() {
        return;
    }
    let Some(caller) = caller else { return };
    let Some(body) = payload.as_object_mut() else {
        return;
    };
    if body.is_empty() {
        return;
    }
    let Some(field) = statement.and_then(|s| s.field_rule(USER_FILL_BLOCK, action.name())) else {
        return;
    };
    // The model must actually point at the identity model.
    let Some(identity) = registry.identity_model() else {
        return;
    };
    if model.relation_to(&identity.model_ref()).is_none() {
        return;
    }
    if !body.contains_key(field) {
        body.insert(field.to_string(), caller.id.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overrides::statement::StatementDecl;
    use crate::testutil::school_registry;
    use serde_json::json;

    fn statement() -> Statement {
        let decl = StatementDecl::new().block(
            USER_FILL_BLOCK,
            json!({"field": "owner_id", "action_enabled": {"create": true}}),
        );
        Statement::from_blocks(decl.blocks().clone())
    }

    fn caller() -> Caller {
        Caller {
            id: json!(42),
            username: "allen".into(),
        }
    }

    #[test]
    fn fills_missing_field_on_enabled_create() {
        let reg = school_registry();
        let student = reg.model("school", "student").unwrap();
        let st = statement();
        let mut body = json!({"name": "allen"});
        apply_user_fill(&reg, student, Some(&st), Action::Create, Some(&caller()), &mut body);
        assert_eq!(body["owner_id"], json!(42));
    }

    #[test]
    fn present_field_is_untouched() {
        let reg = school_registry();
        let student = reg.model("school", "student").unwrap();
        let st = statement();
        let mut body = json!({"name": "allen", "owner_id": 7});
        apply_user_fill(&reg, student, Some(&st), Action::Create, Some(&caller()), &mut body);
        assert_eq!(body["owner_id"], json!(7));
    }

    #[test]
    fn anonymous_caller_is_a_no_op() {
        let reg = school_registry();
        let student = reg.model("school", "student").unwrap();
        let st = statement();
        let mut body = json!({"name": "allen"});
        apply_user_fill(&reg, student, Some(&st), Action::Create, None, &mut body);
        assert_eq!(body, json!({"name": "allen"}));
    }

    #[test]
    fn action_not_listed_is_a_no_op() {
        let reg = school_registry();
        let student = reg.model("school", "student").unwrap();
        let st = statement();
        let mut body = json!({"name": "allen"});
        apply_user_fill(&reg, student, Some(&st), Action::Update, Some(&caller()), &mut body);
        assert_eq!(body, json!({"name": "allen"}));
    }

    #[test]
    fn empty_or_non_object_bodies_are_no_ops() {
        let reg = school_registry();
        let student = reg.model("school", "student").unwrap();
        let st = statement();
        for mut body in [json!({}), json!(null), json!([1, 2])] {
            apply_user_fill(&reg, student, Some(&st), Action::Create, Some(&caller()), &mut body);
            assert!(body.get("owner_id").is_none());
        }
    }

    #[test]
    fn model_without_identity_relation_is_a_no_op() {
        let reg = school_registry();
        let school = reg.model("school", "school").unwrap();
        let st = statement();
        let mut body = json!({"name": "No.1 High"});
        apply_user_fill(&reg, school, Some(&st), Action::Create, Some(&caller()), &mut body);
        assert_eq!(body, json!({"name": "No.1 High"}));
    }
}
