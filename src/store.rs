//! Backing-store access: the `RecordStore` seam and its PostgreSQL implementation.

use crate::config::{ConnectionProfileConfig, EntityDescriptor};
use crate::error::AppError;
use crate::service::EntityQuery;
use crate::sql::{count_rows, list_fields, select_rows, QueryBuf};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgRow};
use sqlx::PgPool;

/// One column of the connection's schema.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldInfo {
    pub table_name: String,
    pub column_name: String,
    pub column_type: String,
}

/// Read-only queries one tenant connection answers.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Rows matching the query, bounded by its limit/offset.
    async fn select(&self, entity: &EntityDescriptor, query: &EntityQuery) -> Result<Vec<Value>, AppError>;

    /// Rows matching the query's predicates, ignoring limit/offset.
    async fn count(&self, entity: &EntityDescriptor, query: &EntityQuery) -> Result<u64, AppError>;

    async fn list_fields(&self, database: &str) -> Result<Vec<FieldInfo>, AppError>;

    async fn ping(&self) -> Result<(), AppError>;
}

pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        PgRecordStore { pool }
    }

    /// Pool that connects on first use, so one tenant being down does not block startup.
    pub fn connect_lazy(profile: &ConnectionProfileConfig) -> Self {
        let mut options = PgConnectOptions::new()
            .host(&profile.host)
            .port(profile.port)
            .database(&profile.database);
        if let Some(user) = &profile.username {
            options = options.username(user);
        }
        if let Some(password) = &profile.password {
            options = options.password(password);
        }
        let pool = PgPoolOptions::new()
            .max_connections(profile.max_connections)
            .connect_lazy_with(options);
        Self::new(pool)
    }

    async fn query_many(&self, q: &QueryBuf) -> Result<Vec<PgRow>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(p);
        }
        Ok(query.fetch_all(&self.pool).await?)
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn select(&self, entity: &EntityDescriptor, query: &EntityQuery) -> Result<Vec<Value>, AppError> {
        let rows = self.query_many(&select_rows(entity, query)).await?;
        Ok(rows.iter().map(row_to_json).collect())
    }

    async fn count(&self, entity: &EntityDescriptor, query: &EntityQuery) -> Result<u64, AppError> {
        let q = count_rows(entity, query);
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut count = sqlx::query_as::<_, (i64,)>(&q.sql);
        for p in &q.params {
            count = count.bind(p);
        }
        let (n,) = count.fetch_one(&self.pool).await?;
        Ok(n.max(0) as u64)
    }

    async fn list_fields(&self, database: &str) -> Result<Vec<FieldInfo>, AppError> {
        let q = list_fields();
        tracing::debug!(sql = %q.sql, database = %database, "query");
        let rows = sqlx::query_as::<_, (String, String, String)>(&q.sql)
            .bind(database)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(table_name, column_name, column_type)| FieldInfo {
                table_name,
                column_name,
                column_type,
            })
            .collect())
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn row_to_json(row: &PgRow) -> Value {
    use sqlx::Column;
    use sqlx::Row;
    let mut map = serde_json::Map::new();
    for col in row.columns() {
        let name = col.name();
        map.insert(name.to_string(), cell_to_value(row, name));
    }
    Value::Object(map)
}

fn cell_to_value(row: &PgRow, name: &str) -> Value {
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
    if let Ok(Some(n)) = row.try_get::<Option<f32>, _>(name) {
        if let Some(n) = serde_json::Number::from_f64(n as f64) {
            return Value::Number(n);
        }
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
    if let Ok(Some(j)) = row.try_get::<Option<Value>, _>(name) {
        return j;
    }
    Value::Null
}
