//! Resolved model definitions: raw config merged with the field-default template.
//!
//! Resolution is recomputed wherever a field is read; nothing here is cached, so a
//! changed template is picked up consistently by the compiler and the resolver.

use crate::config::types::{FieldConfig, FieldDefaults, Labels, ModelConfig, DEFAULT_COLLATION};
use crate::error::SchemaError;
use serde_json::Value;

/// Scalar column types recognized in field definitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScalarType {
    String,
    Int,
    Float,
    Double,
    Bool,
    Date,
    DateTime,
}

impl ScalarType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScalarType::String => "string",
            ScalarType::Int => "int",
            ScalarType::Float => "float",
            ScalarType::Double => "double",
            ScalarType::Bool => "bool",
            ScalarType::Date => "date",
            ScalarType::DateTime => "datetime",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Relation {
    /// Target model name.
    pub target: String,
    /// `false`: this model holds one foreign key. `true`: many-to-many through a junction table.
    pub has_many: bool,
    pub default: i64,
}

#[derive(Clone, Debug, PartialEq)]
pub enum FieldKind {
    Scalar(ScalarType),
    Relation(Relation),
}

#[derive(Clone, Debug, PartialEq)]
pub struct FieldDefinition {
    pub name: String,
    pub kind: FieldKind,
    /// `-1` means unbounded.
    pub max_length: i64,
    pub required: bool,
    pub unique: bool,
    pub comment: Option<String>,
    pub character_set: Option<String>,
    pub collation: Option<String>,
    /// Scalar default; relation defaults live on [`Relation`].
    pub default: Option<Value>,
}

impl FieldDefinition {
    pub fn relation(&self) -> Option<&Relation> {
        match &self.kind {
            FieldKind::Relation(r) => Some(r),
            FieldKind::Scalar(_) => None,
        }
    }

    pub fn storage(&self) -> StorageKind {
        StorageKind::of(self)
    }
}

/// Physical storage for a field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageKind {
    LargeText,
    Native(ScalarType),
    ForeignKey,
    BoundedString,
}

const MAX_BOUNDED_LENGTH: i64 = 255;

impl StorageKind {
    /// Total classification. Relations are checked first so a foreign key column is always an integer.
    pub fn of(field: &FieldDefinition) -> StorageKind {
        match &field.kind {
            FieldKind::Relation(_) => StorageKind::ForeignKey,
            _ if field.max_length == -1 || field.max_length > MAX_BOUNDED_LENGTH => StorageKind::LargeText,
            FieldKind::Scalar(ScalarType::String) => StorageKind::BoundedString,
            FieldKind::Scalar(t) => StorageKind::Native(*t),
        }
    }

    pub fn sql_type(&self) -> &'static str {
        match self {
            StorageKind::LargeText => "TEXT",
            StorageKind::Native(t) => t.as_str(),
            StorageKind::ForeignKey => "INT(11)",
            StorageKind::BoundedString => "VARCHAR(255)",
        }
    }
}

/// Merge `raw` with the template and classify it. Unknown type tokens fail; a missing type is `string`.
pub fn resolve_field(
    model: &str,
    name: &str,
    raw: &FieldConfig,
    defaults: &FieldDefaults,
) -> Result<FieldDefinition, SchemaError> {
    let f = raw.merged_with(&defaults.0);
    let type_name = f.type_.as_deref().unwrap_or("string");
    let scalar = match type_name {
        "string" => Some(ScalarType::String),
        "int" => Some(ScalarType::Int),
        "float" => Some(ScalarType::Float),
        "double" => Some(ScalarType::Double),
        "bool" => Some(ScalarType::Bool),
        "date" => Some(ScalarType::Date),
        "datetime" => Some(ScalarType::DateTime),
        "relation" => None,
        other => {
            return Err(SchemaError::UnknownFieldType {
                model: model.to_string(),
                field: name.to_string(),
                type_name: other.to_string(),
            })
        }
    };

    let (kind, default) = match scalar {
        Some(t) => (FieldKind::Scalar(t), f.default.clone()),
        None => {
            let target = f.data.clone().ok_or_else(|| SchemaError::MissingAttribute {
                model: model.to_string(),
                field: Some(name.to_string()),
                attribute: "data",
            })?;
            let relation = Relation {
                target,
                has_many: f.has_many.unwrap_or(false),
                default: relation_default(model, name, f.default.as_ref()),
            };
            (FieldKind::Relation(relation), None)
        }
    };

    Ok(FieldDefinition {
        name: name.to_string(),
        kind,
        max_length: f.max_length.unwrap_or(MAX_BOUNDED_LENGTH),
        required: f.required.unwrap_or(false),
        unique: f.unique.unwrap_or(false),
        comment: f.comment,
        character_set: f.character_set,
        collation: f.collation,
        default,
    })
}

/// Relation defaults must be numeric; anything else becomes 0.
fn relation_default(model: &str, field: &str, default: Option<&Value>) -> i64 {
    let numeric = match default {
        None | Some(Value::Null) => return 0,
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok().map(|f| f as i64),
        Some(_) => None,
    };
    numeric.unwrap_or_else(|| {
        tracing::warn!(model, field, default = ?default, "non-numeric relation default, using 0");
        0
    })
}

#[derive(Clone, Debug, PartialEq)]
pub struct ModelDefinition {
    pub id: String,
    pub table: String,
    pub fields: Vec<FieldDefinition>,
    pub collation: String,
    pub comment: Option<String>,
    pub labels: Labels,
}

impl ModelDefinition {
    /// Singular display name: the configured label, else the id with its first letter upper-cased.
    pub fn singular_label(&self) -> String {
        self.labels.singular.clone().unwrap_or_else(|| ucfirst(&self.id))
    }

    /// Configured plural label. No plural is derived from the id.
    pub fn plural_label(&self) -> Option<&str> {
        self.labels.plural.as_deref()
    }
}

fn ucfirst(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Resolve one model under its mapping key: id, table, and every field in declared order.
pub fn resolve_model(
    key: &str,
    raw: &ModelConfig,
    defaults: &FieldDefaults,
) -> Result<ModelDefinition, SchemaError> {
    let id = raw.id_or(key).to_string();
    let raw_fields = raw.fields.as_ref().ok_or_else(|| SchemaError::MissingAttribute {
        model: id.clone(),
        field: None,
        attribute: "fields",
    })?;
    let fields = raw_fields
        .iter()
        .map(|(name, f)| resolve_field(&id, name, f, defaults))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ModelDefinition {
        table: raw.table_or(key).to_string(),
        id,
        fields,
        collation: raw.collation.clone().unwrap_or_else(|| DEFAULT_COLLATION.to_string()),
        comment: raw.comment.clone(),
        labels: raw.labels.clone().unwrap_or_default(),
    })
}
