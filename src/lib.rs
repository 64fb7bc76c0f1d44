//! Prism SDK: projection-driven dynamic CRUD backend library.
//!
//! One declarative model configuration produces, per endpoint, a full
//! CRUD-style action surface whose output shape is chosen by the caller
//! (nested field projections over relations, including reverse relations with
//! no physical backing column) and whose behavior is overridable per action
//! through a global/app configuration hierarchy.

pub mod action;
pub mod error;
pub mod handlers;
pub mod instance;
pub mod meta;
pub mod namespace;
pub mod overrides;
pub mod projection;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;
pub mod storage;

#[cfg(test)]
pub mod testutil;

pub use action::Action;
pub use error::{AppError, ConfigError};
pub use instance::{Caller, InstanceState};
pub use meta::{Registry, SpaceBuilder, SpaceConfig};
pub use namespace::{FieldSpec, FilterSpec, RequestNamespace};
pub use overrides::{
    ActionHandler, OverrideModule, OverrideRegistry, Scope, Statement, StatementDecl, ViewSet,
};
pub use response::{success_body, success_response};
pub use routes::{common_routes, endpoint_routes};
pub use service::dispatch::{dispatch, DispatchContext};
pub use service::{EntryValidator, RuleValidator};
pub use state::AppState;
pub use storage::{MemoryStorage, PgStorage, Storage};
