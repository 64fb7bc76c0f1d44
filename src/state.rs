//! Shared application state for all routes.

use crate::meta::Registry;
use crate::overrides::locator::OverrideRegistry;
use crate::service::validation::{EntryValidator, RuleValidator};
use crate::storage::Storage;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
    pub overrides: Arc<OverrideRegistry>,
    pub storage: Arc<dyn Storage>,
    pub validator: Arc<dyn EntryValidator>,
}

impl AppState {
    pub fn new(
        registry: Arc<Registry>,
        overrides: Arc<OverrideRegistry>,
        storage: Arc<dyn Storage>,
    ) -> Self {
        AppState {
            registry,
            overrides,
            storage,
            validator: Arc::new(RuleValidator),
        }
    }

    pub fn with_validator(mut self, validator: Arc<dyn EntryValidator>) -> Self {
        self.validator = validator;
        self
    }
}
