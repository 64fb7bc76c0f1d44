//! Axum handlers binding the route surface to the dispatch lifecycle.

use crate::action::Action;
use crate::error::AppError;
use crate::instance::Caller;
use crate::response::{success_response, SuccessBody};
use crate::service::dispatch::dispatch;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde_json::Value;
use std::sync::Arc;

/// Router state for one endpoint's route set.
#[derive(Clone)]
pub struct EndpointState {
    pub app: AppState,
    pub endpoint: Arc<str>,
}

impl EndpointState {
    pub fn new(app: AppState, endpoint: &str) -> Self {
        EndpointState {
            app,
            endpoint: Arc::from(endpoint),
        }
    }
}

async fn run(
    state: &EndpointState,
    app_label: String,
    model_slug: String,
    action: Action,
    record_id: Option<String>,
    caller: Option<Extension<Caller>>,
    body: Value,
) -> Result<(StatusCode, Json<SuccessBody>), AppError> {
    let result = dispatch(
        &state.app,
        &state.endpoint,
        &app_label,
        &model_slug,
        action,
        record_id,
        caller.map(|Extension(c)| c),
        body,
    )
    .await?;
    Ok(success_response(result))
}

macro_rules! collection_handler {
    ($name:ident, $action:expr) => {
        pub async fn $name(
            State(state): State<EndpointState>,
            Path((app_label, model_slug)): Path<(String, String)>,
            caller: Option<Extension<Caller>>,
            body: Option<Json<Value>>,
        ) -> Result<(StatusCode, Json<SuccessBody>), AppError> {
            let body = body.map(|Json(v)| v).unwrap_or(Value::Null);
            run(&state, app_label, model_slug, $action, None, caller, body).await
        }
    };
}

macro_rules! detail_handler {
    ($name:ident, $action:expr) => {
        pub async fn $name(
            State(state): State<EndpointState>,
            Path((app_label, model_slug, id)): Path<(String, String, String)>,
            caller: Option<Extension<Caller>>,
            body: Option<Json<Value>>,
        ) -> Result<(StatusCode, Json<SuccessBody>), AppError> {
            let body = body.map(|Json(v)| v).unwrap_or(Value::Null);
            run(&state, app_label, model_slug, $action, Some(id), caller, body).await
        }
    };
}

collection_handler!(list, Action::List);
collection_handler!(list_enhance, Action::ListEnhance);
collection_handler!(list_mine, Action::ListMine);
collection_handler!(create, Action::Create);
collection_handler!(cloudfunc, Action::CloudFunc);
collection_handler!(batch, Action::Batch);

detail_handler!(retrieve, Action::Retrieve);
detail_handler!(retrieve_enhance, Action::RetrieveEnhance);
detail_handler!(retrieve_mine, Action::RetrieveMine);
detail_handler!(update, Action::Update);
detail_handler!(partial_update, Action::PartialUpdate);
detail_handler!(patch_enhance, Action::PatchEnhance);
detail_handler!(destroy, Action::Destroy);
