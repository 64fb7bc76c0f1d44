//! Override surfaces: per-action handlers grouped into view sets.

use crate::error::AppError;
use crate::service::dispatch::DispatchContext;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// An executable action override. Handlers receive the full per-request
/// context and produce the envelope's `result` value.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    async fn call(&self, ctx: &mut DispatchContext) -> Result<Value, AppError>;
}

/// One override surface for a model x endpoint pair: named action entries
/// (including `cloudfunc_<name>` / `batch_<name>` aliases) plus an optional
/// view-level fallback that catches any standard action.
#[derive(Default)]
pub struct ViewSet {
    actions: HashMap<String, Arc<dyn ActionHandler>>,
    fallback: Option<Arc<dyn ActionHandler>>,
}

impl ViewSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn action(mut self, name: &str, handler: Arc<dyn ActionHandler>) -> Self {
        self.actions.insert(name.to_string(), handler);
        self
    }

    pub fn fallback(mut self, handler: Arc<dyn ActionHandler>) -> Self {
        self.fallback = Some(handler);
        self
    }

    pub fn handler(&self, name: &str) -> Option<&Arc<dyn ActionHandler>> {
        self.actions.get(name)
    }

    pub fn fallback_handler(&self) -> Option<&Arc<dyn ActionHandler>> {
        self.fallback.as_ref()
    }
}

impl std::fmt::Debug for ViewSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.actions.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("ViewSet")
            .field("actions", &names)
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}
