//! Example consumer: a separate Rust project that uses model-sdk as a dependency.
//!
//! Prints the DDL for the models in `CONFIG_PATH` (default: the bundled `sample` dir).
//! With `DATABASE_URL` set, applies it to MySQL. With `MODEL` set, prints (and with a
//! database, runs) the query that materializes that model.
//!
//! Run from repo root: `cargo run -p example-consumer`

use model_sdk::sql::{create_junction_table_sql, create_table_sql, select_sql};
use model_sdk::store::table_prefix;
use model_sdk::{apply_schema, compile_schema, load_from_dir, ModelService, MySqlStore, QueryOptions};
use std::path::PathBuf;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("model_sdk=info")),
        )
        .init();

    let config_dir = std::env::var("CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("sample"));
    let config = load_from_dir(&config_dir).await?;
    let prefix = table_prefix();

    let schema = compile_schema(&config.models, &config.field_defaults)?;
    for table in &schema.tables {
        println!("{};\n", create_table_sql(table, &prefix));
    }
    for table in &schema.junction_tables {
        println!("{};\n", create_junction_table_sql(table, &prefix));
    }

    let store = match std::env::var("DATABASE_URL") {
        Ok(url) => {
            let store = MySqlStore::connect(&url).await?;
            apply_schema(&store, &config.models, &config.field_defaults).await?;
            Some(store)
        }
        Err(_) => None,
    };

    if let Ok(model) = std::env::var("MODEL") {
        let plan = ModelService::plan(&config.models, &config.field_defaults, &model, QueryOptions::default())?;
        println!("{};", select_sql(&plan, &prefix).sql);
        if let Some(store) = &store {
            let rows =
                ModelService::get(store, &config.models, &config.field_defaults, &model, QueryOptions::default())
                    .await?;
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
    }

    tracing::info!(
        models = config.models.len(),
        tables = schema.tables.len(),
        junction_tables = schema.junction_tables.len(),
        "done"
    );
    Ok(())
}
