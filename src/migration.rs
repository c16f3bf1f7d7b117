//! Apply compiled models through a DDL executor: every model table first, then junction tables.
//! Junction tables reference base tables, so backends enforcing foreign keys at creation need that order.

use crate::config::{FieldDefaults, ModelSet};
use crate::error::AppError;
use crate::executor::DdlExecutor;
use crate::schema::{compile_schema, CompiledSchema};

/// Compile `models` and hand every descriptor to `executor`.
/// Nothing is handed over if compilation fails. Returns the compiled schema.
pub async fn apply_schema<E>(
    executor: &E,
    models: &ModelSet,
    defaults: &FieldDefaults,
) -> Result<CompiledSchema, AppError>
where
    E: DdlExecutor + ?Sized,
{
    let schema = compile_schema(models, defaults)?;

    for table in &schema.tables {
        executor.create_table(table).await?;
    }
    for table in &schema.junction_tables {
        executor.create_junction_table(table).await?;
    }

    tracing::info!(
        tables = schema.tables.len(),
        junction_tables = schema.junction_tables.len(),
        "schema applied"
    );
    Ok(schema)
}
