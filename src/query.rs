//! Query projection and join resolution for one model and its related models.

use crate::config::{resolve_model, validate, FieldDefaults, ModelDefinition, ModelSet};
use crate::error::SchemaError;
use crate::naming::{
    column_alias, junction_column, junction_table_name, nested_prefix, select_expr, ID_COLUMN,
};
use crate::schema::target_model;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Relation hops expanded by projection. Fields of a joined model that are themselves
/// relations are not followed past this depth, which also stops cycles in the model graph.
pub const MAX_JOIN_DEPTH: usize = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JoinKind {
    Inner,
    Left,
}

impl JoinKind {
    /// Required relations drop owner rows with a missing target; optional ones keep them with nulls.
    pub fn for_required(required: bool) -> Self {
        if required {
            JoinKind::Inner
        } else {
            JoinKind::Left
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JoinSpec {
    pub kind: JoinKind,
    /// Alias or table name already in scope.
    pub left_table: String,
    pub left_column: String,
    /// Physical table being joined.
    pub right_table: String,
    pub right_column: String,
    #[serde(default)]
    pub right_alias: Option<String>,
}

impl JoinSpec {
    /// Name the joined table is referenced by: its alias, else the table itself.
    pub fn right_name(&self) -> &str {
        self.right_alias.as_deref().unwrap_or(&self.right_table)
    }
}

impl fmt::Display for JoinSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind.as_sql(), self.right_table)?;
        if let Some(alias) = &self.right_alias {
            write!(f, " AS {}", alias)?;
        }
        write!(
            f,
            " ON {}.{} = {}.{}",
            self.left_table,
            self.left_column,
            self.right_name(),
            self.right_column
        )
    }
}

/// One selected expression. Displays as `<column> AS '<alias>'`; renderers qualify
/// computed columns with the table they were projected from.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SelectItem {
    Column {
        /// Alias or table name the column belongs to.
        table_ref: String,
        column: String,
        alias: String,
    },
    /// Caller-supplied expression, used verbatim.
    Raw(String),
}

impl fmt::Display for SelectItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectItem::Column { column, alias, .. } => f.write_str(&select_expr(column, alias)),
            SelectItem::Raw(expr) => f.write_str(expr),
        }
    }
}

impl PartialEq<&str> for SelectItem {
    fn eq(&self, other: &&str) -> bool {
        self.to_string() == *other
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderBy {
    pub column: String,
    #[serde(default)]
    pub descending: bool,
}

/// Filter, sort and pagination options, handed to the query executor untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Passthrough {
    /// Exact-match filters, column (optionally `alias.column`) -> value.
    #[serde(default)]
    pub filters: IndexMap<String, Value>,
    #[serde(default)]
    pub order_by: Vec<OrderBy>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub offset: Option<u32>,
}

/// Caller overrides. A `Some` value replaces the computed one outright; lists are never appended to.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryOptions {
    #[serde(default)]
    pub select: Option<Vec<String>>,
    #[serde(default)]
    pub join: Option<Vec<JoinSpec>>,
    /// Alias of the queried table; defaults to the model name.
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(flatten)]
    pub passthrough: Passthrough,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QueryPlan {
    pub model: String,
    pub table: String,
    pub alias: String,
    pub select: Vec<SelectItem>,
    pub joins: Vec<JoinSpec>,
    pub passthrough: Passthrough,
}

#[derive(Default)]
struct Projection {
    select: Vec<SelectItem>,
    joins: Vec<JoinSpec>,
}

/// Build the selection list and ordered joins for `model_name`, then apply caller overrides.
/// The whole model set is validated first, so only checked identifiers reach a plan.
pub fn resolve_query(
    models: &ModelSet,
    defaults: &FieldDefaults,
    model_name: &str,
    options: QueryOptions,
) -> Result<QueryPlan, SchemaError> {
    validate(models)?;
    let raw = models
        .get(model_name)
        .ok_or_else(|| SchemaError::UnknownModel(model_name.to_string()))?;
    let model = resolve_model(model_name, raw, defaults)?;
    let alias = options.alias.unwrap_or_else(|| model_name.to_string());

    let mut projection = Projection::default();
    project(models, defaults, &model, &alias, "", 0, MAX_JOIN_DEPTH, &mut projection)?;

    let plan = QueryPlan {
        model: model_name.to_string(),
        table: model.table,
        alias,
        select: match options.select {
            Some(select) => select.into_iter().map(SelectItem::Raw).collect(),
            None => projection.select,
        },
        joins: options.join.unwrap_or(projection.joins),
        passthrough: options.passthrough,
    };
    tracing::debug!(
        model = %plan.model,
        select = plan.select.len(),
        joins = plan.joins.len(),
        "resolved query"
    );
    Ok(plan)
}

/// Project `model`'s scalar fields under `prefix`, joining relations while `depth < max_depth`.
#[allow(clippy::too_many_arguments)]
fn project(
    models: &ModelSet,
    defaults: &FieldDefaults,
    model: &ModelDefinition,
    table_ref: &str,
    prefix: &str,
    depth: usize,
    max_depth: usize,
    out: &mut Projection,
) -> Result<(), SchemaError> {
    for field in &model.fields {
        let Some(relation) = field.relation() else {
            out.select.push(SelectItem::Column {
                table_ref: table_ref.to_string(),
                column: field.name.clone(),
                alias: column_alias(prefix, &field.name),
            });
            continue;
        };
        if depth >= max_depth {
            continue;
        }
        let target = target_model(models, defaults, model, field, &relation.target)?;
        let alias = if depth == 0 {
            field.name.clone()
        } else {
            format!("{}_{}", table_ref, field.name)
        };

        if relation.has_many {
            let junction = junction_table_name(&model.table, &field.name);
            out.joins.push(JoinSpec {
                kind: JoinKind::Left,
                left_table: table_ref.to_string(),
                left_column: ID_COLUMN.to_string(),
                right_table: junction.clone(),
                right_column: junction_column(&model.table),
                right_alias: None,
            });
            out.joins.push(JoinSpec {
                kind: JoinKind::Left,
                left_table: junction,
                left_column: junction_column(&field.name),
                right_table: target.table.clone(),
                right_column: ID_COLUMN.to_string(),
                right_alias: Some(alias.clone()),
            });
        } else {
            out.joins.push(JoinSpec {
                kind: JoinKind::for_required(field.required),
                left_table: table_ref.to_string(),
                left_column: field.name.clone(),
                right_table: target.table.clone(),
                right_column: ID_COLUMN.to_string(),
                right_alias: Some(alias.clone()),
            });
        }

        let nested = nested_prefix(prefix, &field.name);
        project(models, defaults, &target, &alias, &nested, depth + 1, max_depth, out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_models;
    use pretty_assertions::assert_eq;

    fn blog() -> ModelSet {
        parse_models(
            r#"{
                "company": {"fields": {"title": {}}},
                "user": {"fields": {
                    "name": {},
                    "employer": {"type": "relation", "data": "company"}
                }},
                "post": {"fields": {
                    "title": {},
                    "author": {"type": "relation", "data": "user", "required": true}
                }}
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn depth_limit_is_configurable() {
        let models = blog();
        let defaults = FieldDefaults::default();
        let post = resolve_model("post", &models["post"], &defaults).unwrap();

        let mut one_hop = Projection::default();
        project(&models, &defaults, &post, "post", "", 0, 1, &mut one_hop).unwrap();
        assert_eq!(one_hop.joins.len(), 1);
        assert_eq!(one_hop.select, ["title AS 'title'", "name AS 'author.name'"]);

        let mut two_hops = Projection::default();
        project(&models, &defaults, &post, "post", "", 0, 2, &mut two_hops).unwrap();
        let joins: Vec<_> = two_hops.joins.iter().map(ToString::to_string).collect();
        assert_eq!(
            joins,
            [
                "INNER JOIN user AS author ON post.author = author.id",
                "LEFT JOIN company AS author_employer ON author.employer = author_employer.id",
            ]
        );
        assert_eq!(
            two_hops.select,
            [
                "title AS 'title'",
                "name AS 'author.name'",
                "title AS 'author.employer.title'",
            ]
        );
    }

    #[test]
    fn computed_columns_keep_their_table() {
        let models = blog();
        let plan = resolve_query(&models, &FieldDefaults::default(), "post", QueryOptions::default()).unwrap();
        assert_eq!(
            plan.select[1],
            SelectItem::Column {
                table_ref: "author".into(),
                column: "name".into(),
                alias: "author.name".into(),
            }
        );

        let options = QueryOptions {
            select: Some(vec!["COUNT(*) AS 'n'".into()]),
            ..QueryOptions::default()
        };
        let plan = resolve_query(&models, &FieldDefaults::default(), "post", options).unwrap();
        assert_eq!(plan.select, vec![SelectItem::Raw("COUNT(*) AS 'n'".into())]);
    }

    #[test]
    fn invalid_field_name_is_rejected_before_projection() {
        let models = parse_models(r#"{"post": {"fields": {"title FROM mysql.user -- ": {}}}}"#).unwrap();
        let err = resolve_query(&models, &FieldDefaults::default(), "post", QueryOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            SchemaError::InvalidIdentifier { kind: "field", ref name } if name == "title FROM mysql.user -- "
        ));
    }

    #[test]
    fn unrelated_invalid_model_fails_resolution() {
        let mut models = blog();
        models.extend(parse_models(r#"{"audit": {"table": "audit log", "fields": {}}}"#).unwrap());
        let err = resolve_query(&models, &FieldDefaults::default(), "post", QueryOptions::default()).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidIdentifier { kind: "table", .. }));
    }

    #[test]
    fn join_display_without_alias() {
        let join = JoinSpec {
            kind: JoinKind::Left,
            left_table: "post".into(),
            left_column: "id".into(),
            right_table: "post_tags".into(),
            right_column: "id_post".into(),
            right_alias: None,
        };
        assert_eq!(join.to_string(), "LEFT JOIN post_tags ON post.id = post_tags.id_post");
    }

    #[test]
    fn options_deserialize_with_passthrough() {
        let options: QueryOptions = serde_json::from_str(
            r#"{"alias": "p", "filters": {"title": "hello"}, "orderBy": [{"column": "title"}], "limit": 10}"#,
        )
        .unwrap();
        assert_eq!(options.alias.as_deref(), Some("p"));
        assert_eq!(options.select, None);
        assert_eq!(options.passthrough.filters["title"], "hello");
        assert_eq!(options.passthrough.order_by[0].column, "title");
        assert_eq!(options.passthrough.limit, Some(10));
    }
}
