//! Field projection compiler: turns a client field-selection tree into a
//! relation-traversal plan and a matching nested output schema, then applies
//! that schema to storage rows.

pub mod prefetch;
pub mod schema;
pub mod serialize;
pub mod translate;

pub use prefetch::prefetch_paths;
pub use schema::{build_schema, OutputField, OutputKind, OutputSchema};
pub use serialize::{serialize_row, serialize_rows};
pub use translate::translate_paths;
