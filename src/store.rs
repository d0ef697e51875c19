//! Storage collaborator: executes built statements and hands rows back as records.
//! `SqlStorage` runs on the sqlx `Any` driver, so PostgreSQL and SQLite URLs both work.

use crate::error::AppError;
use crate::resource::Record;
use crate::sql::{BindValue, QueryBuf};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::any::{AnyPoolOptions, AnyRow};
use sqlx::{AnyConnection, AnyPool};
use std::sync::Mutex;

#[async_trait]
pub trait Storage: Send + Sync {
    /// Execute one statement with its bound parameters and return every row it produced.
    async fn execute(&self, query: &QueryBuf) -> Result<Vec<Record>, AppError>;

    /// Identity generated by the most recent insert, when the backend reports one.
    /// Shared across callers: under concurrent inserts it may belong to another request.
    async fn last_insert_id(&self) -> Result<Option<Value>, AppError>;

    /// Execute an INSERT and return its rows together with the identity it generated.
    /// Backends that can tie the identity to the statement should override this.
    async fn execute_insert(&self, query: &QueryBuf) -> Result<(Vec<Record>, Option<Value>), AppError> {
        let rows = self.execute(query).await?;
        let id = self.last_insert_id().await?;
        Ok((rows, id))
    }
}

pub struct SqlStorage {
    pool: AnyPool,
    last_insert_id: Mutex<Option<Value>>,
}

impl SqlStorage {
    pub fn new(pool: AnyPool) -> Self {
        SqlStorage {
            pool,
            last_insert_id: Mutex::new(None),
        }
    }

    /// Open a pool for `database_url` (e.g. `postgres://...`, `sqlite://app.db?mode=rwc`).
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, AppError> {
        sqlx::any::install_default_drivers();
        let pool = AnyPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    /// Run a multi-statement script (schema setup, seed data). Nothing is bound.
    pub async fn execute_script(&self, script: &str) -> Result<(), AppError> {
        tracing::debug!(bytes = script.len(), "script");
        sqlx::raw_sql(script).execute(&self.pool).await?;
        Ok(())
    }

    fn remember_insert(&self, id: Option<Value>) {
        let mut slot = self
            .last_insert_id
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = id;
    }

    /// Run one statement on a single pooled connection. For an INSERT the generated
    /// identity is read on that same connection before it goes back to the pool.
    async fn run(&self, query: &QueryBuf) -> Result<(Vec<Record>, Option<Value>), AppError> {
        tracing::debug!(sql = %query.sql(), params = ?query.params(), "query");
        let mut conn = self.pool.acquire().await?;
        let mut q = sqlx::query(query.sql());
        for p in query.params() {
            q = BindValue::from_json(p).bind(q);
        }
        let rows = q.fetch_all(&mut *conn).await?;
        let id = if query.is_insert() {
            let id = generated_id(&mut conn).await;
            self.remember_insert(id.clone());
            id
        } else {
            None
        };
        Ok((rows.iter().map(row_to_json).collect(), id))
    }
}

#[async_trait]
impl Storage for SqlStorage {
    async fn execute(&self, query: &QueryBuf) -> Result<Vec<Record>, AppError> {
        Ok(self.run(query).await?.0)
    }

    async fn execute_insert(&self, query: &QueryBuf) -> Result<(Vec<Record>, Option<Value>), AppError> {
        self.run(query).await
    }

    async fn last_insert_id(&self) -> Result<Option<Value>, AppError> {
        let slot = self
            .last_insert_id
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(slot.clone())
    }
}

/// Ask the connection that ran the insert for the identity it generated.
async fn generated_id(conn: &mut AnyConnection) -> Option<Value> {
    let sql = match conn.backend_name() {
        "SQLite" => "SELECT last_insert_rowid()",
        "PostgreSQL" => "SELECT lastval()",
        "MySQL" => "SELECT LAST_INSERT_ID()",
        _ => return None,
    };
    match sqlx::query_scalar::<_, i64>(sql).fetch_one(&mut *conn).await {
        Ok(id) => Some(Value::Number(id.into())),
        Err(e) => {
            tracing::debug!(error = %e, "no generated identity");
            None
        }
    }
}

fn row_to_json(row: &AnyRow) -> Record {
    use sqlx::Column;
    use sqlx::Row;
    let mut map = Record::new();
    for col in row.columns() {
        map.insert(col.name().to_string(), cell_to_value(row, col.ordinal()));
    }
    map
}

fn cell_to_value(row: &AnyRow, idx: usize) -> Value {
    use sqlx::Row;
    if let Ok(Some(n)) = row.try_get::<Option<i64>, _>(idx) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<f64>, _>(idx) {
        if let Some(n) = serde_json::Number::from_f64(n) {
            return Value::Number(n);
        }
    }
    if let Ok(Some(n)) = row.try_get::<Option<f32>, _>(idx) {
        if let Some(n) = serde_json::Number::from_f64(n as f64) {
            return Value::Number(n);
        }
    }
    if let Ok(Some(b)) = row.try_get::<Option<bool>, _>(idx) {
        return Value::Bool(b);
    }
    if let Ok(Some(s)) = row.try_get::<Option<String>, _>(idx) {
        return Value::String(s);
    }
    Value::Null
}
