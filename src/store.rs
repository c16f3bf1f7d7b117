//! MySQL-backed executor for compiled schemas and resolved queries. Table names get the
//! prefix from `MODEL_TABLE_PREFIX` env (default empty).

use crate::error::AppError;
use crate::executor::{DdlExecutor, QueryExecutor};
use crate::query::QueryPlan;
use crate::schema::{JunctionTableDescriptor, TableDescriptor};
use crate::sql::{bind_all, create_junction_table_sql, create_table_sql, select_sql};
use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::mysql::{MySqlPool, MySqlPoolOptions, MySqlRow};

/// Table prefix from env `MODEL_TABLE_PREFIX`, default empty.
pub fn table_prefix() -> String {
    std::env::var("MODEL_TABLE_PREFIX").unwrap_or_default()
}

#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
    prefix: String,
}

impl MySqlStore {
    /// Store over `pool` using the env table prefix.
    pub fn new(pool: MySqlPool) -> Self {
        Self::with_prefix(pool, table_prefix())
    }

    pub fn with_prefix(pool: MySqlPool, prefix: impl Into<String>) -> Self {
        MySqlStore {
            pool,
            prefix: prefix.into(),
        }
    }

    pub async fn connect(database_url: &str) -> Result<Self, AppError> {
        let pool = MySqlPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    async fn execute_ddl(&self, sql: &str) -> Result<(), AppError> {
        tracing::debug!(sql = %sql, "ddl");
        sqlx::query(sql).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl DdlExecutor for MySqlStore {
    async fn create_table(&self, table: &TableDescriptor) -> Result<(), AppError> {
        self.execute_ddl(&create_table_sql(table, &self.prefix)).await
    }

    async fn create_junction_table(&self, table: &JunctionTableDescriptor) -> Result<(), AppError> {
        self.execute_ddl(&create_junction_table_sql(table, &self.prefix)).await
    }
}

#[async_trait]
impl QueryExecutor for MySqlStore {
    async fn fetch(&self, plan: &QueryPlan) -> Result<Vec<Value>, AppError> {
        let q = select_sql(plan, &self.prefix);
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let rows = bind_all(sqlx::query(&q.sql), &q.params)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(row_to_json).collect())
    }
}

fn row_to_json(row: &MySqlRow) -> Value {
    use sqlx::Column;
    use sqlx::Row;
    let mut map = Map::new();
    for col in row.columns() {
        let name = col.name();
        map.insert(name.to_string(), cell_to_value(row, name));
    }
    nest_aliases(map)
}

/// Turn dotted aliases (`author.name`) into nested objects (`{"author": {"name": ..}}`).
fn nest_aliases(flat: Map<String, Value>) -> Value {
    let mut out = Map::new();
    for (key, value) in flat {
        let mut parts: Vec<&str> = key.split('.').collect();
        let Some(leaf) = parts.pop() else { continue };
        let mut node = &mut out;
        for part in parts {
            let entry = node
                .entry(part.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            node = match entry {
                Value::Object(m) => m,
                _ => unreachable!("entry was just made an object"),
            };
        }
        node.insert(leaf.to_string(), value);
    }
    Value::Object(out)
}

fn cell_to_value(row: &MySqlRow, name: &str) -> Value {
    use sqlx::Row;
    if let Ok(Some(n)) = row.try_get::<Option<i64>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<u64>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(b)) = row.try_get::<Option<bool>, _>(name) {
        return Value::Bool(b);
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nests_dotted_aliases() {
        let mut flat = Map::new();
        flat.insert("title".into(), json!("Hello"));
        flat.insert("author.name".into(), json!("Ada"));
        flat.insert("tags.label".into(), json!("rust"));
        flat.insert("author.employer.title".into(), json!("ACME"));
        assert_eq!(
            nest_aliases(flat),
            json!({
                "title": "Hello",
                "author": {"name": "Ada", "employer": {"title": "ACME"}},
                "tags": {"label": "rust"}
            })
        );
    }

    #[test]
    fn scalar_is_replaced_by_nested_object() {
        let mut flat = Map::new();
        flat.insert("author".into(), json!(3));
        flat.insert("author.name".into(), json!("Ada"));
        assert_eq!(nest_aliases(flat), json!({"author": {"name": "Ada"}}));
    }
}
