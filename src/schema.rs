//! Schema compiler: model definitions -> table and junction-table descriptors.
//!
//! Output is MySQL-flavoured (`INT(11)`, inline `COMMENT`, `COLLATE`) but unquoted;
//! identifier quoting and statement rendering belong to the DDL executor.

use crate::config::{resolve_model, validate, FieldDefaults, FieldDefinition, ModelDefinition, ModelSet, StorageKind};
use crate::error::SchemaError;
use crate::naming::{foreign_key_name, junction_column, junction_table_name, quote_literal, ID_COLUMN};
use indexmap::IndexMap;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ColumnDef {
    pub name: String,
    pub sql_type: String,
    /// Trailing fragments in emission order, e.g. `UNIQUE`, `NOT NULL`, `COMMENT '...'`.
    pub constraints: Vec<String>,
}

impl ColumnDef {
    fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        ColumnDef {
            name: name.into(),
            sql_type: sql_type.into(),
            constraints: Vec::new(),
        }
    }

    /// Type plus constraint fragments, without the column name.
    pub fn type_and_constraints(&self) -> String {
        let mut out = self.sql_type.clone();
        for c in &self.constraints {
            out.push(' ');
            out.push_str(c);
        }
        out
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ForeignKeyDescriptor {
    pub constraint_name: String,
    pub referenced_table: String,
    pub referenced_column: String,
}

impl ForeignKeyDescriptor {
    /// `table(column)`.
    pub fn reference(&self) -> String {
        format!("{}({})", self.referenced_table, self.referenced_column)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TableDescriptor {
    pub name: String,
    pub columns: Vec<ColumnDef>,
    pub collation: String,
    pub comment: Option<String>,
    /// Keyed by field name, which is also the foreign key column.
    pub foreign_keys: IndexMap<String, ForeignKeyDescriptor>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct JunctionTableDescriptor {
    pub name: String,
    pub columns: Vec<ColumnDef>,
    pub primary_key: Vec<String>,
    /// Keyed by junction column.
    pub foreign_keys: IndexMap<String, ForeignKeyDescriptor>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CompiledSchema {
    pub tables: Vec<TableDescriptor>,
    pub junction_tables: Vec<JunctionTableDescriptor>,
}

/// Compile every model in declared order. Fails as a whole on the first configuration error.
pub fn compile_schema(models: &ModelSet, defaults: &FieldDefaults) -> Result<CompiledSchema, SchemaError> {
    validate(models)?;

    let mut out = CompiledSchema::default();
    for (key, raw) in models {
        let model = resolve_model(key, raw, defaults)?;
        let mut table = TableDescriptor {
            name: model.table.clone(),
            columns: Vec::new(),
            collation: model.collation.clone(),
            comment: model.comment.clone(),
            foreign_keys: IndexMap::new(),
        };

        for field in &model.fields {
            let Some(relation) = field.relation() else {
                table.columns.push(scalar_column(field));
                continue;
            };
            let target = target_model(models, defaults, &model, field, &relation.target)?;
            if relation.has_many {
                out.junction_tables
                    .push(junction_table(&model.table, &field.name, &relation.target, &target.table));
                continue;
            }
            table.columns.push(scalar_column(field));
            table.foreign_keys.insert(
                field.name.clone(),
                ForeignKeyDescriptor {
                    constraint_name: foreign_key_name(&model.table, &field.name),
                    referenced_table: target.table.clone(),
                    referenced_column: ID_COLUMN.to_string(),
                },
            );
        }

        tracing::debug!(
            model = %model.id,
            table = %table.name,
            columns = table.columns.len(),
            foreign_keys = table.foreign_keys.len(),
            "compiled table"
        );
        out.tables.push(table);
    }
    Ok(out)
}

/// Resolve the model a relation field points at (looked up by mapping key).
pub(crate) fn target_model(
    models: &ModelSet,
    defaults: &FieldDefaults,
    owner: &ModelDefinition,
    field: &FieldDefinition,
    target: &str,
) -> Result<ModelDefinition, SchemaError> {
    let raw = models.get(target).ok_or_else(|| SchemaError::MissingRelationTarget {
        model: owner.id.clone(),
        field: field.name.clone(),
        target: target.to_string(),
    })?;
    resolve_model(target, raw, defaults)
}

fn scalar_column(field: &FieldDefinition) -> ColumnDef {
    let mut col = ColumnDef::new(&field.name, StorageKind::of(field).sql_type());
    if field.unique {
        col.constraints.push("UNIQUE".into());
    }
    if field.required {
        col.constraints.push("NOT NULL".into());
    }
    if let Some(comment) = field.comment.as_deref().filter(|c| !c.is_empty()) {
        col.constraints.push(format!("COMMENT {}", quote_literal(comment)));
    }
    if let Some(cs) = field.character_set.as_deref().filter(|c| !c.is_empty()) {
        col.constraints.push(format!("CHARACTER SET {}", quote_literal(cs)));
    } else if let Some(coll) = field.collation.as_deref().filter(|c| !c.is_empty()) {
        col.constraints.push(format!("COLLATE {}", quote_literal(coll)));
    }
    col
}

fn junction_table(owner_table: &str, field: &str, target_model: &str, target_table: &str) -> JunctionTableDescriptor {
    let name = junction_table_name(owner_table, field);
    let owner_col = junction_column(owner_table);
    let field_col = junction_column(field);

    let mut foreign_keys = IndexMap::new();
    foreign_keys.insert(
        owner_col.clone(),
        ForeignKeyDescriptor {
            constraint_name: foreign_key_name(&name, field),
            referenced_table: owner_table.to_string(),
            referenced_column: ID_COLUMN.to_string(),
        },
    );
    foreign_keys.insert(
        field_col.clone(),
        ForeignKeyDescriptor {
            constraint_name: foreign_key_name(&name, target_model),
            referenced_table: target_table.to_string(),
            referenced_column: ID_COLUMN.to_string(),
        },
    );

    let not_null_int = |col: &str| ColumnDef {
        name: col.to_string(),
        sql_type: StorageKind::ForeignKey.sql_type().to_string(),
        constraints: vec!["NOT NULL".into()],
    };

    JunctionTableDescriptor {
        columns: vec![not_null_int(&owner_col), not_null_int(&field_col)],
        primary_key: vec![owner_col, field_col],
        foreign_keys,
        name,
    }
}
