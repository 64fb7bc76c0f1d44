//! Per-request action dispatch lifecycle.
//!
//! Strict order: parse the request namespace (malformed degrades to empty),
//! resolve the target model, resolve the handler and statement, compute the
//! prefetch plan (best-effort), then run the resolved handler or the built-in
//! default. Named-function actions have no default: an unresolved handler is
//! fatal.

use crate::action::Action;
use crate::error::AppError;
use crate::instance::{Caller, InstanceState};
use crate::meta::{FieldType, ModelMeta, Registry};
use crate::namespace::{payload_from_body, FilterSpec, RequestNamespace};
use crate::overrides::resolver::resolve_handler;
use crate::overrides::statement::resolve_statement;
use crate::projection::{serialize_row, serialize_rows};
use crate::service::user_fill::{apply_user_fill, USER_FILTER_BLOCK};
use crate::state::AppState;
use crate::storage::{prefetch, KeyMatch, Storage};
use serde_json::Value;
use std::sync::Arc;

/// Everything an action handler (override or built-in) can reach.
pub struct DispatchContext {
    pub state: AppState,
    pub instance: InstanceState,
    pub caller: Option<Caller>,
    /// Business payload (the body's `data` key).
    pub payload: Value,
    /// Record id from the route, for detail actions.
    pub record_id: Option<String>,
    /// Pre-validated target rows for batch handlers.
    pub batch_rows: Vec<Value>,
}

impl DispatchContext {
    pub fn model(&self) -> &Arc<ModelMeta> {
        &self.instance.model
    }

    pub fn registry(&self) -> &Registry {
        &self.state.registry
    }

    pub fn storage(&self) -> &dyn Storage {
        self.state.storage.as_ref()
    }

    /// Route id parsed against the model's primary-key type.
    pub fn parsed_id(&self) -> Result<Value, AppError> {
        let Some(raw) = self.record_id.as_deref() else {
            return Err(AppError::ParameterFormat("record id required".into()));
        };
        let pk_type = self
            .model()
            .scalar(&self.model().pk)
            .map(|s| s.type_)
            .unwrap_or(FieldType::BigInt);
        Ok(match pk_type {
            FieldType::BigInt | FieldType::Int => {
                let n: i64 = raw
                    .parse()
                    .map_err(|_| AppError::ParameterFormat(format!("invalid id: {raw}")))?;
                Value::Number(n.into())
            }
            FieldType::Uuid => {
                let u = uuid::Uuid::parse_str(raw)
                    .map_err(|_| AppError::ParameterFormat(format!("invalid id: {raw}")))?;
                Value::String(u.to_string())
            }
            _ => Value::String(raw.to_string()),
        })
    }

    async fn attach_prefetch(&self, rows: &mut [Value]) -> Result<(), AppError> {
        let paths = self.instance.translated_paths(self.registry());
        prefetch::attach(self.storage(), self.registry(), self.model(), rows, paths).await
    }

    fn serialize_one(&self, row: Value) -> Result<Value, AppError> {
        let schema = self.instance.schema(self.registry())?;
        Ok(serialize_row(&schema, &row))
    }

    /// Owner filter from the `user_filter_config` block for "mine" actions.
    /// The block is read defensively; for these actions enablement defaults
    /// to on unless the action is explicitly disabled.
    fn mine_filter(&self) -> Option<(String, Value)> {
        let caller = self.caller.as_ref()?;
        let statement = self.instance.statement.as_ref()?;
        let config = statement.block(USER_FILTER_BLOCK)?.as_object()?;
        let field = config.get("field")?.as_str()?;
        if field.is_empty() {
            return None;
        }
        if let Some(enabled) = config.get("action_enabled").and_then(Value::as_object) {
            if enabled.get(self.instance.action.name()) == Some(&Value::Bool(false)) {
                return None;
            }
        }
        Some((field.to_string(), caller.id.clone()))
    }

    pub async fn default_retrieve(&mut self) -> Result<Value, AppError> {
        let id = self.parsed_id()?;
        let row = self
            .storage()
            .fetch_by_id(self.model(), &id)
            .await?
            .ok_or_else(|| AppError::ObjectNotFound(format!("{} {}", self.model().slug, id)))?;
        if self.instance.action.is_mine() {
            if let Some((field, owner)) = self.mine_filter() {
                if row.get(&field) != Some(&owner) {
                    return Err(AppError::ObjectNotFound(format!(
                        "{} {}",
                        self.model().slug,
                        id
                    )));
                }
            }
        }
        let mut rows = vec![row];
        self.attach_prefetch(&mut rows).await?;
        self.serialize_one(rows.pop().expect("one row"))
    }

    pub async fn default_list(&mut self) -> Result<Value, AppError> {
        let mut filters: Vec<FilterSpec> = self.instance.namespace.filters.clone();
        if self.instance.action.is_mine() {
            if let Some((field, owner)) = self.mine_filter() {
                filters.push(FilterSpec {
                    field,
                    operator: "=".into(),
                    value: owner,
                });
            }
        }
        let mut rows = self.storage().fetch_all(self.model(), &filters).await?;
        self.attach_prefetch(&mut rows).await?;
        let schema = self.instance.schema(self.registry())?;
        Ok(serialize_rows(&schema, &rows))
    }

    pub async fn default_create(&mut self) -> Result<Value, AppError> {
        if self.payload.is_null() {
            self.payload = Value::Object(serde_json::Map::new());
        }
        self.prepare_write_payload();
        let model = self.model().clone();
        let validated = self
            .state
            .validator
            .validate(&model, self.instance.action, &self.payload)
            .await?;
        let row = self.storage().insert(&model, &validated).await?;
        let mut rows = vec![row];
        self.attach_prefetch(&mut rows).await?;
        self.serialize_one(rows.pop().expect("one row"))
    }

    pub async fn default_update(&mut self) -> Result<Value, AppError> {
        let id = self.parsed_id()?;
        let model = self.model().clone();
        self.storage()
            .fetch_by_id(&model, &id)
            .await?
            .ok_or_else(|| AppError::ObjectNotFound(format!("{} {}", model.slug, id)))?;
        self.prepare_write_payload();
        let validated = self
            .state
            .validator
            .validate(&model, self.instance.action, &self.payload)
            .await?;
        let row = self
            .storage()
            .update(&model, &id, &validated)
            .await?
            .ok_or_else(|| AppError::ObjectNotFound(format!("{} {}", model.slug, id)))?;
        let mut rows = vec![row];
        self.attach_prefetch(&mut rows).await?;
        self.serialize_one(rows.pop().expect("one row"))
    }

    pub async fn default_destroy(&mut self) -> Result<Value, AppError> {
        let id = self.parsed_id()?;
        let model = self.model().clone();
        self.storage()
            .fetch_by_id(&model, &id)
            .await?
            .ok_or_else(|| AppError::ObjectNotFound(format!("{} {}", model.slug, id)))?;
        self.storage().delete(&model, &id).await?;
        Ok(Value::Null)
    }

    /// Auto-fill the caller's identity field, then strip computed (read-only)
    /// fields from the payload.
    fn prepare_write_payload(&mut self) {
        apply_user_fill(
            &self.state.registry,
            &self.instance.model,
            self.instance.statement.as_ref(),
            self.instance.action,
            self.caller.as_ref(),
            &mut self.payload,
        );
        if let Some(body) = self.payload.as_object_mut() {
            for c in &self.instance.model.computed {
                body.remove(&c.name);
            }
        }
    }
}

/// Run one request through the lifecycle.
#[allow(clippy::too_many_arguments)]
pub async fn dispatch(
    state: &AppState,
    endpoint: &str,
    app_label: &str,
    model_slug: &str,
    action: Action,
    record_id: Option<String>,
    caller: Option<Caller>,
    body: Value,
) -> Result<Value, AppError> {
    // 1. Request namespace; malformed degrades to empty.
    let namespace = RequestNamespace::from_body(&body);
    let payload = payload_from_body(&body);

    // 2. Target model.
    let model = resolve_model(&state.registry, app_label, model_slug)?;
    tracing::debug!(endpoint, app = app_label, model = model_slug, action = %action, "dispatch");

    let mut instance = InstanceState::new(
        endpoint.to_string(),
        app_label.to_string(),
        model_slug.to_string(),
        model,
        action,
        namespace,
    );

    // 3. Handler; 4. statement; 5. prefetch plan (best-effort, memoized).
    instance.handler = resolve_handler(
        &state.overrides,
        endpoint,
        app_label,
        &instance.model,
        action,
        instance.func_name(),
    );
    instance.statement = resolve_statement(&state.overrides, endpoint, app_label, &instance.model);
    let _ = instance.translated_paths(&state.registry);

    let mut ctx = DispatchContext {
        state: state.clone(),
        instance,
        caller,
        payload,
        record_id,
        batch_rows: Vec::new(),
    };

    // 6. Execute.
    match action {
        Action::CloudFunc => {
            let handler = ctx.instance.handler.clone().ok_or_else(|| {
                AppError::FunctionNotFound(
                    ctx.instance.func_name().unwrap_or("<missing>").to_string(),
                )
            })?;
            handler.call(&mut ctx).await
        }
        Action::Batch => run_batch(&mut ctx).await,
        _ => match ctx.instance.handler.clone() {
            Some(handler) => handler.call(&mut ctx).await,
            None => run_default(&mut ctx).await,
        },
    }
}

fn resolve_model(
    registry: &Registry,
    app_label: &str,
    model_slug: &str,
) -> Result<Arc<ModelMeta>, AppError> {
    if !is_valid_label(app_label) {
        return Err(AppError::AppLabelInvalid(app_label.to_string()));
    }
    if !is_valid_label(model_slug) {
        return Err(AppError::ModelSlugInvalid(model_slug.to_string()));
    }
    let app = registry
        .app(app_label)
        .ok_or_else(|| AppError::AppLabelInvalid(app_label.to_string()))?;
    app.models
        .get(model_slug)
        .cloned()
        .ok_or_else(|| AppError::ModelNotFound(format!("{app_label}.{model_slug}")))
}

fn is_valid_label(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

async fn run_default(ctx: &mut DispatchContext) -> Result<Value, AppError> {
    match ctx.instance.action {
        Action::Retrieve | Action::RetrieveEnhance | Action::RetrieveMine => {
            ctx.default_retrieve().await
        }
        Action::List | Action::ListEnhance | Action::ListMine => ctx.default_list().await,
        Action::Create => ctx.default_create().await,
        Action::Update | Action::PartialUpdate | Action::PatchEnhance => {
            ctx.default_update().await
        }
        Action::Destroy => ctx.default_destroy().await,
        Action::CloudFunc | Action::Batch => unreachable!("named functions have no default"),
    }
}

/// Batch lifecycle: handler must resolve, every supplied id must exist, and
/// handler faults are re-signaled as batch errors.
async fn run_batch(ctx: &mut DispatchContext) -> Result<Value, AppError> {
    let handler = ctx.instance.handler.clone().ok_or_else(|| {
        AppError::FunctionNotFound(ctx.instance.func_name().unwrap_or("<missing>").to_string())
    })?;

    let ids = match ctx.payload.as_array() {
        Some(ids) if !ids.is_empty() => ids.clone(),
        _ => {
            return Err(AppError::ParameterFormat(
                "batch payload must be a non-empty id list".into(),
            ))
        }
    };

    let model = ctx.model().clone();
    let rows = ctx
        .storage()
        .fetch_by_key_in(&model, &model.pk, &ids, KeyMatch::Eq)
        .await?;
    if rows.len() != ids.len() {
        return Err(AppError::ParameterBusiness(
            "id list contains unknown records".into(),
        ));
    }
    ctx.batch_rows = rows;

    handler
        .call(ctx)
        .await
        .map_err(|e| AppError::BatchAction(e.to_string()))
}
