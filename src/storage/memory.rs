//! In-memory storage adapter for tests and demos.

use crate::error::AppError;
use crate::meta::ModelMeta;
use crate::namespace::FilterSpec;
use crate::storage::{KeyMatch, Storage};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::RwLock;

#[derive(Default)]
pub struct MemoryStorage {
    tables: RwLock<HashMap<String, Vec<Value>>>,
    next_id: AtomicI64,
}

fn table_key(model: &ModelMeta) -> String {
    format!("{}.{}", model.app, model.slug)
}

fn filter_matches(row: &Value, filter: &FilterSpec) -> bool {
    let cell = row.get(&filter.field);
    match filter.operator.as_str() {
        "=" => cell == Some(&filter.value),
        "in" => match (&filter.value, cell) {
            (Value::Array(options), Some(cell)) => options.contains(cell),
            _ => false,
        },
        // Unknown operators are skipped, not rejected.
        _ => true,
    }
}

impl MemoryStorage {
    pub fn new() -> Self {
        MemoryStorage {
            tables: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    /// Load rows wholesale, keeping ids the caller supplied.
    pub fn seed(&self, model: &ModelMeta, rows: Vec<Value>) {
        let mut tables = self.tables.write().expect("storage lock");
        tables.entry(table_key(model)).or_default().extend(rows);
    }

    fn lock_err() -> AppError {
        AppError::System("storage lock poisoned".into())
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn fetch_all(
        &self,
        model: &ModelMeta,
        filters: &[FilterSpec],
    ) -> Result<Vec<Value>, AppError> {
        let tables = self.tables.read().map_err(|_| Self::lock_err())?;
        let rows = tables.get(&table_key(model)).cloned().unwrap_or_default();
        Ok(rows
            .into_iter()
            .filter(|r| filters.iter().all(|f| filter_matches(r, f)))
            .collect())
    }

    async fn fetch_by_id(&self, model: &ModelMeta, id: &Value) -> Result<Option<Value>, AppError> {
        let tables = self.tables.read().map_err(|_| Self::lock_err())?;
        Ok(tables
            .get(&table_key(model))
            .and_then(|rows| rows.iter().find(|r| r.get(&model.pk) == Some(id)))
            .cloned())
    }

    async fn fetch_by_key_in(
        &self,
        model: &ModelMeta,
        column: &str,
        keys: &[Value],
        mode: KeyMatch,
    ) -> Result<Vec<Value>, AppError> {
        let tables = self.tables.read().map_err(|_| Self::lock_err())?;
        let rows = tables.get(&table_key(model)).cloned().unwrap_or_default();
        Ok(rows
            .into_iter()
            .filter(|r| match (mode, r.get(column)) {
                (KeyMatch::Eq, Some(cell)) => keys.contains(cell),
                (KeyMatch::Contains, Some(Value::Array(ids))) => {
                    keys.iter().any(|k| ids.contains(k))
                }
                _ => false,
            })
            .collect())
    }

    async fn insert(&self, model: &ModelMeta, body: &Value) -> Result<Value, AppError> {
        let mut row = match body {
            Value::Object(obj) => obj.clone(),
            Value::Null => Map::new(),
            _ => return Err(AppError::ParameterFormat("payload must be an object".into())),
        };
        // Keep only persisted columns; assign the surrogate key if absent.
        let columns: Vec<String> = model.columns().iter().map(|c| c.to_string()).collect();
        row.retain(|k, _| columns.iter().any(|c| c == k));
        if row.get(&model.pk).map_or(true, Value::is_null) {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            row.insert(model.pk.clone(), Value::Number(id.into()));
        }
        let row = Value::Object(row);
        let mut tables = self.tables.write().map_err(|_| Self::lock_err())?;
        tables.entry(table_key(model)).or_default().push(row.clone());
        Ok(row)
    }

    async fn update(
        &self,
        model: &ModelMeta,
        id: &Value,
        body: &Value,
    ) -> Result<Option<Value>, AppError> {
        let Some(patch) = body.as_object() else {
            return Err(AppError::ParameterFormat("payload must be an object".into()));
        };
        let columns: Vec<String> = model.columns().iter().map(|c| c.to_string()).collect();
        let mut tables = self.tables.write().map_err(|_| Self::lock_err())?;
        let Some(rows) = tables.get_mut(&table_key(model)) else {
            return Ok(None);
        };
        for row in rows.iter_mut() {
            if row.get(&model.pk) == Some(id) {
                if let Some(obj) = row.as_object_mut() {
                    for (k, v) in patch {
                        if *k != model.pk && columns.iter().any(|c| c == k) {
                            obj.insert(k.clone(), v.clone());
                        }
                    }
                }
                return Ok(Some(row.clone()));
            }
        }
        Ok(None)
    }

    async fn delete(&self, model: &ModelMeta, id: &Value) -> Result<bool, AppError> {
        let mut tables = self.tables.write().map_err(|_| Self::lock_err())?;
        let Some(rows) = tables.get_mut(&table_key(model)) else {
            return Ok(false);
        };
        let before = rows.len();
        rows.retain(|r| r.get(&model.pk) != Some(id));
        Ok(rows.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::school_registry;
    use serde_json::json;

    #[tokio::test]
    async fn insert_assigns_pk_and_strips_unknown_columns() {
        let reg = school_registry();
        let student = reg.model("school", "student").unwrap();
        let storage = MemoryStorage::new();
        let row = storage
            .insert(student, &json!({"name": "allen", "bogus": 1, "display_name": "x"}))
            .await
            .unwrap();
        assert!(row["id"].is_number());
        assert_eq!(row["name"], json!("allen"));
        assert!(row.get("bogus").is_none());
        assert!(row.get("display_name").is_none());
    }

    #[tokio::test]
    async fn update_patches_only_known_columns_and_keeps_pk() {
        let reg = school_registry();
        let student = reg.model("school", "student").unwrap();
        let storage = MemoryStorage::new();
        let row = storage.insert(student, &json!({"name": "allen"})).await.unwrap();
        let id = row["id"].clone();

        let updated = storage
            .update(student, &id, &json!({"name": "joe", "id": 999, "bogus": 1}))
            .await
            .unwrap()
            .expect("row exists");
        assert_eq!(updated["id"], id);
        assert_eq!(updated["name"], json!("joe"));
        assert!(updated.get("bogus").is_none());

        assert!(storage
            .update(student, &json!(12345), &json!({"name": "x"}))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn filters_apply_exact_and_in() {
        let reg = school_registry();
        let student = reg.model("school", "student").unwrap();
        let storage = MemoryStorage::new();
        storage.seed(
            student,
            vec![
                json!({"id": 1, "name": "a", "school_id": 1}),
                json!({"id": 2, "name": "b", "school_id": 2}),
            ],
        );
        let eq: FilterSpec =
            serde_json::from_value(json!({"field": "school_id", "value": 2})).unwrap();
        let rows = storage.fetch_all(student, &[eq]).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], json!("b"));

        let isin: FilterSpec = serde_json::from_value(
            json!({"field": "id", "operator": "in", "value": [1, 2]}),
        )
        .unwrap();
        let rows = storage.fetch_all(student, &[isin]).await.unwrap();
        assert_eq!(rows.len(), 2);
    }
}
