//! Typed errors for model configuration, compilation and execution.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("unknown field type '{type_name}' on {model}.{field}")]
    UnknownFieldType {
        model: String,
        field: String,
        type_name: String,
    },
    #[error("relation {model}.{field} targets unknown model '{target}'")]
    MissingRelationTarget {
        model: String,
        field: String,
        target: String,
    },
    #[error("missing attribute '{}' on {}", .attribute, location(.model, .field))]
    MissingAttribute {
        model: String,
        field: Option<String>,
        attribute: &'static str,
    },
    #[error("unknown model: {0}")]
    UnknownModel(String),
    #[error("invalid {kind} identifier: '{name}'")]
    InvalidIdentifier { kind: &'static str, name: String },
    #[error("config load: {0}")]
    Load(String),
}

fn location(model: &str, field: &Option<String>) -> String {
    match field {
        Some(f) => format!("{}.{}", model, f),
        None => format!("model {}", model),
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
}
