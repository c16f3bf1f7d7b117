//! Config validation: identifiers, required attributes and relation targets.

use crate::config::ModelSet;
use crate::error::SchemaError;
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

fn identifier_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier regex"))
}

fn check_identifier(kind: &'static str, name: &str) -> Result<(), SchemaError> {
    if identifier_re().is_match(name) {
        Ok(())
    } else {
        Err(SchemaError::InvalidIdentifier {
            kind,
            name: name.to_string(),
        })
    }
}

/// Structural checks over the raw model set. Field types are checked during resolution.
pub fn validate(models: &ModelSet) -> Result<(), SchemaError> {
    let model_names: HashSet<&str> = models.keys().map(String::as_str).collect();

    for (key, model) in models {
        let id = model.id_or(key);
        check_identifier("model", key)?;
        check_identifier("model", id)?;
        check_identifier("table", model.table_or(key))?;
        if let Some(collation) = model.collation.as_deref() {
            check_identifier("collation", collation)?;
        }

        let fields = model.fields.as_ref().ok_or_else(|| SchemaError::MissingAttribute {
            model: id.to_string(),
            field: None,
            attribute: "fields",
        })?;

        for (name, field) in fields {
            check_identifier("field", name)?;
            if let Some(charset) = field.character_set.as_deref().filter(|c| !c.is_empty()) {
                check_identifier("character set", charset)?;
            }
            if let Some(collation) = field.collation.as_deref().filter(|c| !c.is_empty()) {
                check_identifier("collation", collation)?;
            }
            if field.type_.as_deref() != Some("relation") {
                continue;
            }
            let target = field.data.as_deref().ok_or_else(|| SchemaError::MissingAttribute {
                model: id.to_string(),
                field: Some(name.clone()),
                attribute: "data",
            })?;
            if !model_names.contains(target) {
                return Err(SchemaError::MissingRelationTarget {
                    model: id.to_string(),
                    field: name.clone(),
                    target: target.to_string(),
                });
            }
        }
    }

    Ok(())
}
