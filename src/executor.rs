//! Collaborator seams: the core hands descriptors and query plans to these, and never executes SQL itself.

use crate::error::AppError;
use crate::query::QueryPlan;
use crate::schema::{JunctionTableDescriptor, TableDescriptor};
use async_trait::async_trait;
use serde_json::Value;

/// Renders and executes `CREATE TABLE` statements, including identifier quoting.
#[async_trait]
pub trait DdlExecutor: Send + Sync {
    async fn create_table(&self, table: &TableDescriptor) -> Result<(), AppError>;

    async fn create_junction_table(&self, table: &JunctionTableDescriptor) -> Result<(), AppError>;
}

/// Renders and executes `SELECT ... JOIN ...` for a resolved plan, returning one JSON object per row.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn fetch(&self, plan: &QueryPlan) -> Result<Vec<Value>, AppError>;
}
