//! PostgreSQL storage adapter.

use crate::error::AppError;
use crate::meta::ModelMeta;
use crate::namespace::FilterSpec;
use crate::sql::{self, PgBindValue, QueryBuf};
use crate::storage::{KeyMatch, Storage};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;

pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    pub fn new(pool: PgPool) -> Self {
        PgStorage { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn query_many(&self, q: &QueryBuf) -> Result<Vec<Value>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(PgBindValue::from_json(p));
        }
        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows.iter().map(row_to_json).collect())
    }

    async fn query_one(&self, q: &QueryBuf) -> Result<Option<Value>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(PgBindValue::from_json(p));
        }
        let row = query.fetch_optional(&self.pool).await?;
        Ok(row.as_ref().map(row_to_json))
    }

    /// Run one returning statement inside its own transaction.
    async fn execute_returning_tx(&self, q: &QueryBuf) -> Result<Option<Value>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query (tx)");
        let mut tx = self.pool.begin().await?;
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(PgBindValue::from_json(p));
        }
        let row = query.fetch_optional(&mut *tx).await?;
        let out = row.as_ref().map(row_to_json);
        tx.commit().await?;
        Ok(out)
    }
}

#[async_trait]
impl Storage for PgStorage {
    async fn fetch_all(
        &self,
        model: &ModelMeta,
        filters: &[FilterSpec],
    ) -> Result<Vec<Value>, AppError> {
        self.query_many(&sql::select_list(model, filters)).await
    }

    async fn fetch_by_id(&self, model: &ModelMeta, id: &Value) -> Result<Option<Value>, AppError> {
        let mut q = sql::select_by_id(model);
        q.params.push(id.clone());
        self.query_one(&q).await
    }

    async fn fetch_by_key_in(
        &self,
        model: &ModelMeta,
        column: &str,
        keys: &[Value],
        mode: KeyMatch,
    ) -> Result<Vec<Value>, AppError> {
        self.query_many(&sql::select_by_key_in(model, column, keys, mode))
            .await
    }

    async fn insert(&self, model: &ModelMeta, body: &Value) -> Result<Value, AppError> {
        let q = sql::insert(model, body);
        self.execute_returning_tx(&q)
            .await?
            .ok_or(AppError::Db(sqlx::Error::RowNotFound))
    }

    async fn update(
        &self,
        model: &ModelMeta,
        id: &Value,
        body: &Value,
    ) -> Result<Option<Value>, AppError> {
        let q = sql::update(model, id, body);
        self.execute_returning_tx(&q).await
    }

    async fn delete(&self, model: &ModelMeta, id: &Value) -> Result<bool, AppError> {
        let mut q = sql::delete(model);
        q.params.push(id.clone());
        Ok(self.execute_returning_tx(&q).await?.is_some())
    }
}

fn row_to_json(row: &sqlx::postgres::PgRow) -> Value {
    use sqlx::Column;
    use sqlx::Row;
    let mut map = serde_json::Map::new();
    for col in row.columns() {
        let name = col.name();
        map.insert(name.to_string(), cell_to_value(row, name));
    }
    Value::Object(map)
}

fn cell_to_value(row: &sqlx::postgres::PgRow, name: &str) -> Value {
    use sqlx::Row;
    if let Ok(Some(n)) = row.try_get::<Option<i16>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i32>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i64>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<f64>, _>(name) {
        if let Some(n) = serde_json::Number::from_f64(n) {
            return Value::Number(n);
        }
    }
    if let Ok(Some(b)) = row.try_get::<Option<bool>, _>(name) {
        return Value::Bool(b);
    }
    if let Ok(Some(u)) = row.try_get::<Option<uuid::Uuid>, _>(name) {
        return Value::String(u.to_string());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(name) {
        return Value::String(d.to_rfc3339());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::NaiveDateTime>, _>(name) {
        return Value::String(d.format("%Y-%m-%dT%H:%M:%S%.f").to_string());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::NaiveDate>, _>(name) {
        return Value::String(d.format("%Y-%m-%d").to_string());
    }
    if let Ok(Some(s)) = row.try_get::<Option<String>, _>(name) {
        return Value::String(s);
    }
    if let Ok(Some(j)) = row.try_get::<Option<serde_json::Value>, _>(name) {
        return j;
    }
    Value::Null
}
