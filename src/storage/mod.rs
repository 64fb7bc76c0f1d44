//! Storage query seam consumed by the dispatch lifecycle.

pub mod memory;
pub mod pg;
pub mod prefetch;

use crate::error::AppError;
use crate::meta::ModelMeta;
use crate::namespace::FilterSpec;
use async_trait::async_trait;
use serde_json::Value;

pub use memory::MemoryStorage;
pub use pg::PgStorage;

/// How `fetch_by_key_in` matches a row column against the key set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyMatch {
    /// `row[column]` equals one of the keys.
    Eq,
    /// `row[column]` is an id array containing one of the keys.
    Contains,
}

/// Storage query layer. Rows are JSON objects keyed by column name. Write
/// operations are each one atomic unit of work.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn fetch_all(
        &self,
        model: &ModelMeta,
        filters: &[FilterSpec],
    ) -> Result<Vec<Value>, AppError>;

    async fn fetch_by_id(&self, model: &ModelMeta, id: &Value) -> Result<Option<Value>, AppError>;

    /// Batch fetch used by id-set pre-validation and relation stitching.
    async fn fetch_by_key_in(
        &self,
        model: &ModelMeta,
        column: &str,
        keys: &[Value],
        mode: KeyMatch,
    ) -> Result<Vec<Value>, AppError>;

    async fn insert(&self, model: &ModelMeta, body: &Value) -> Result<Value, AppError>;

    async fn update(
        &self,
        model: &ModelMeta,
        id: &Value,
        body: &Value,
    ) -> Result<Option<Value>, AppError>;

    async fn delete(&self, model: &ModelMeta, id: &Value) -> Result<bool, AppError>;
}
