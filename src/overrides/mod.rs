pub mod locator;
pub mod resolver;
pub mod statement;
pub mod viewset;

pub use locator::{OverrideModule, OverrideRegistry, Scope};
pub use resolver::resolve_handler;
pub use statement::{resolve_statement, Statement, StatementDecl};
pub use viewset::{ActionHandler, ViewSet};
