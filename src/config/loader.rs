//! Load model definitions and the field-default template from JSON.

use crate::config::types::{FieldConfig, FieldDefaults, ModelSet};
use crate::error::SchemaError;
use std::path::Path;

pub const MODELS_FILE: &str = "models.json";
pub const FIELD_DEFAULTS_FILE: &str = "field_defaults.json";

/// Parse a `models.json` document (object of model name -> definition). Declared order is kept.
pub fn parse_models(json: &str) -> Result<ModelSet, SchemaError> {
    serde_json::from_str(json).map_err(|e| SchemaError::Load(format!("{}: {}", MODELS_FILE, e)))
}

/// Parse a field-default template. Attributes it leaves out fall back to the built-in template.
pub fn parse_field_defaults(json: &str) -> Result<FieldDefaults, SchemaError> {
    let raw: FieldConfig = serde_json::from_str(json)
        .map_err(|e| SchemaError::Load(format!("{}: {}", FIELD_DEFAULTS_FILE, e)))?;
    Ok(FieldDefaults(raw.merged_with(&FieldDefaults::default().0)))
}

/// Config directory contents: models plus the template they are resolved against.
#[derive(Clone, Debug)]
pub struct LoadedConfig {
    pub models: ModelSet,
    pub field_defaults: FieldDefaults,
}

/// Read `models.json` (required) and `field_defaults.json` (optional) from `dir`.
pub async fn load_from_dir(dir: impl AsRef<Path>) -> Result<LoadedConfig, SchemaError> {
    let dir = dir.as_ref();
    let models_path = dir.join(MODELS_FILE);
    let models_json = tokio::fs::read_to_string(&models_path)
        .await
        .map_err(|e| SchemaError::Load(format!("{}: {}", models_path.display(), e)))?;
    let models = parse_models(&models_json)?;

    let defaults_path = dir.join(FIELD_DEFAULTS_FILE);
    let field_defaults = match tokio::fs::read_to_string(&defaults_path).await {
        Ok(json) => parse_field_defaults(&json)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => FieldDefaults::default(),
        Err(e) => return Err(SchemaError::Load(format!("{}: {}", defaults_path.display(), e))),
    };

    tracing::debug!(dir = %dir.display(), models = models.len(), "loaded model config");
    Ok(LoadedConfig {
        models,
        field_defaults,
    })
}
