//! Fetch a model together with its related data.

use crate::config::{FieldDefaults, ModelSet};
use crate::error::AppError;
use crate::executor::QueryExecutor;
use crate::query::{resolve_query, QueryOptions, QueryPlan};
use serde_json::Value;

pub struct ModelService;

impl ModelService {
    /// Resolve the projection and joins for `model_name` and fetch rows through `executor`.
    /// Resolution errors surface before the executor is called.
    pub async fn get<E>(
        executor: &E,
        models: &ModelSet,
        defaults: &FieldDefaults,
        model_name: &str,
        options: QueryOptions,
    ) -> Result<Vec<Value>, AppError>
    where
        E: QueryExecutor + ?Sized,
    {
        let plan = Self::plan(models, defaults, model_name, options)?;
        executor.fetch(&plan).await
    }

    /// The plan `get` would execute, without executing it.
    pub fn plan(
        models: &ModelSet,
        defaults: &FieldDefaults,
        model_name: &str,
        options: QueryOptions,
    ) -> Result<QueryPlan, AppError> {
        Ok(resolve_query(models, defaults, model_name, options)?)
    }
}
