//! Raw model config types matching the JSON shape of `models.json`.
//!
//! Every field attribute is optional here so the field-default template can fill
//! exactly the attributes a definition leaves out.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Model name -> model definition, in declared order.
pub type ModelSet = IndexMap<String, ModelConfig>;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldConfig {
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_set: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collation: Option<String>,
    /// Target model name (relation fields only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_many: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl FieldConfig {
    /// Fill every attribute absent here from `template`. Present attributes are never overridden.
    pub fn merged_with(&self, template: &FieldConfig) -> FieldConfig {
        FieldConfig {
            type_: self.type_.clone().or_else(|| template.type_.clone()),
            max_length: self.max_length.or(template.max_length),
            required: self.required.or(template.required),
            unique: self.unique.or(template.unique),
            comment: self.comment.clone().or_else(|| template.comment.clone()),
            character_set: self
                .character_set
                .clone()
                .or_else(|| template.character_set.clone()),
            collation: self.collation.clone().or_else(|| template.collation.clone()),
            data: self.data.clone().or_else(|| template.data.clone()),
            has_many: self.has_many.or(template.has_many),
            default: self.default.clone().or_else(|| template.default.clone()),
        }
    }
}

/// Process-wide field-default template, passed explicitly to every resolution call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldDefaults(pub FieldConfig);

impl Default for FieldDefaults {
    fn default() -> Self {
        FieldDefaults(FieldConfig {
            type_: Some("string".into()),
            max_length: Some(255),
            required: Some(false),
            unique: Some(false),
            has_many: Some(false),
            ..FieldConfig::default()
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Labels {
    #[serde(default)]
    pub singular: Option<String>,
    #[serde(default)]
    pub plural: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub table: Option<String>,
    /// Required; kept optional so an omission surfaces as a config error rather than a parse error.
    #[serde(default)]
    pub fields: Option<IndexMap<String, FieldConfig>>,
    #[serde(default)]
    pub collation: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub labels: Option<Labels>,
}

pub const DEFAULT_COLLATION: &str = "utf8_general_ci";

impl ModelConfig {
    /// Model id: explicit `id`, else the mapping key.
    pub fn id_or<'a>(&'a self, key: &'a str) -> &'a str {
        self.id.as_deref().unwrap_or(key)
    }

    /// Physical table name: explicit `table`, else the model id.
    pub fn table_or<'a>(&'a self, key: &'a str) -> &'a str {
        self.table.as_deref().unwrap_or_else(|| self.id_or(key))
    }
}
