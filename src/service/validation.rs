//! Data-entry validation from per-model config rules.

use crate::action::Action;
use crate::error::AppError;
use crate::meta::{ModelMeta, ValidationRule};
use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;

/// External data-entry validator seam: `(model, action, payload)` to a
/// validated payload or a structured error.
#[async_trait]
pub trait EntryValidator: Send + Sync {
    async fn validate(
        &self,
        model: &ModelMeta,
        action: Action,
        payload: &Value,
    ) -> Result<Value, AppError>;
}

/// Default validator driven by the model's configured rules. Update-family
/// actions validate only the fields present; required is not enforced for
/// missing fields there.
pub struct RuleValidator;

#[async_trait]
impl EntryValidator for RuleValidator {
    async fn validate(
        &self,
        model: &ModelMeta,
        action: Action,
        payload: &Value,
    ) -> Result<Value, AppError> {
        let Some(body) = payload.as_object() else {
            return Err(AppError::ParameterFormat("payload must be an object".into()));
        };
        if action.is_partial() {
            for (col, v) in body {
                if let Some(rule) = model.validation.get(col) {
                    validate_field(col, v, rule)?;
                }
            }
        } else {
            for (col, rule) in &model.validation {
                let val = body.get(col);
                if rule.required == Some(true) && (val.is_none() || val == Some(&Value::Null)) {
                    return Err(AppError::ParameterFormat(format!("{} is required", col)));
                }
                if let Some(v) = val {
                    validate_field(col, v, rule)?;
                }
            }
        }
        Ok(payload.clone())
    }
}

fn validate_field(col: &str, v: &Value, rule: &ValidationRule) -> Result<(), AppError> {
    if v.is_null() {
        return Ok(());
    }
    if let Some(format) = &rule.format {
        validate_format(col, v, format)?;
    }
    if let Some(max) = rule.max_length {
        if let Some(s) = v.as_str() {
            if s.len() > max as usize {
                return Err(AppError::ParameterFormat(format!(
                    "{} must be at most {} characters",
                    col, max
                )));
            }
        }
    }
    if let Some(min) = rule.min_length {
        if let Some(s) = v.as_str() {
            if s.len() < min as usize {
                return Err(AppError::ParameterFormat(format!(
                    "{} must be at least {} characters",
                    col, min
                )));
            }
        }
    }
    if let Some(pattern) = &rule.pattern {
        let re = Regex::new(pattern)
            .map_err(|_| AppError::ParameterFormat(format!("invalid pattern for {}", col)))?;
        if let Some(s) = v.as_str() {
            if !re.is_match(s) {
                return Err(AppError::ParameterFormat(format!(
                    "{} does not match required pattern",
                    col
                )));
            }
        }
    }
    if let Some(allowed) = &rule.allowed {
        if !allowed.iter().any(|a| value_eq(v, a)) {
            return Err(AppError::ParameterFormat(format!(
                "{} must be one of: {:?}",
                col,
                allowed.iter().take(5).collect::<Vec<_>>()
            )));
        }
    }
    if let Some(min) = rule.minimum {
        if let Some(n) = v.as_f64() {
            if n < min {
                return Err(AppError::ParameterFormat(format!(
                    "{} must be at least {}",
                    col, min
                )));
            }
        }
    }
    if let Some(max) = rule.maximum {
        if let Some(n) = v.as_f64() {
            if n > max {
                return Err(AppError::ParameterFormat(format!(
                    "{} must be at most {}",
                    col, max
                )));
            }
        }
    }
    Ok(())
}

fn value_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(n), Value::Number(m)) => n.as_f64() == m.as_f64(),
        _ => a == b,
    }
}

fn validate_format(col: &str, v: &Value, format: &str) -> Result<(), AppError> {
    match format.to_lowercase().as_str() {
        "email" => {
            if let Some(s) = v.as_str() {
                if !s.contains('@') || s.len() < 3 {
                    return Err(AppError::ParameterFormat(format!(
                        "{} must be a valid email",
                        col
                    )));
                }
            }
        }
        "uuid" => {
            if let Some(s) = v.as_str() {
                if uuid::Uuid::parse_str(s).is_err() {
                    return Err(AppError::ParameterFormat(format!(
                        "{} must be a valid UUID",
                        col
                    )));
                }
            }
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::school_registry;
    use serde_json::json;

    #[tokio::test]
    async fn required_enforced_on_create_but_not_partial() {
        let reg = school_registry();
        let student = reg.model("school", "student").unwrap();

        let err = RuleValidator
            .validate(student, Action::Create, &json!({"score": 1}))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ParameterFormat(_)));

        RuleValidator
            .validate(student, Action::PartialUpdate, &json!({"score": 1}))
            .await
            .expect("partial skips missing required fields");
    }

    #[tokio::test]
    async fn max_length_enforced() {
        let reg = school_registry();
        let student = reg.model("school", "student").unwrap();
        let long = "x".repeat(101);
        let err = RuleValidator
            .validate(student, Action::Create, &json!({"name": long}))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ParameterFormat(_)));
    }
}
