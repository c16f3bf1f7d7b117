use async_trait::async_trait;
use model_sdk::{
    apply_schema, compile_schema, parse_models, resolve_query, AppError, DdlExecutor, FieldDefaults,
    JoinKind, JoinSpec, JunctionTableDescriptor, ModelService, ModelSet, QueryExecutor, QueryOptions,
    QueryPlan, SchemaError, TableDescriptor,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Mutex;

/// Records every hand-off instead of executing it.
#[derive(Default)]
struct Recorder {
    calls: Mutex<Vec<String>>,
    plans: Mutex<Vec<QueryPlan>>,
}

impl Recorder {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DdlExecutor for Recorder {
    async fn create_table(&self, table: &TableDescriptor) -> Result<(), AppError> {
        self.calls.lock().unwrap().push(format!("table {}", table.name));
        Ok(())
    }

    async fn create_junction_table(&self, table: &JunctionTableDescriptor) -> Result<(), AppError> {
        self.calls.lock().unwrap().push(format!("junction {}", table.name));
        Ok(())
    }
}

#[async_trait]
impl QueryExecutor for Recorder {
    async fn fetch(&self, plan: &QueryPlan) -> Result<Vec<Value>, AppError> {
        self.plans.lock().unwrap().push(plan.clone());
        Ok(vec![json!({"title": "Hello"})])
    }
}

fn models(json: &str) -> ModelSet {
    parse_models(json).unwrap()
}

fn blog() -> ModelSet {
    models(
        r#"{
            "post": {"fields": {
                "title": {"type": "string"},
                "author": {"type": "relation", "required": true, "data": "user", "hasMany": false},
                "tags": {"type": "relation", "data": "tag", "hasMany": true}
            }},
            "user": {"fields": {"name": {"type": "string"}}},
            "tag": {"fields": {"label": {"type": "string"}}}
        }"#,
    )
}

fn joins(plan: &QueryPlan) -> Vec<String> {
    plan.joins.iter().map(ToString::to_string).collect()
}

#[test]
fn belongs_to_projection_and_join() {
    let models = models(
        r#"{
            "post": {"fields": {
                "title": {"type": "string"},
                "author": {"type": "relation", "required": true, "data": "user", "hasMany": false}
            }},
            "user": {"fields": {"name": {"type": "string"}}}
        }"#,
    );
    let plan = resolve_query(&models, &FieldDefaults::default(), "post", QueryOptions::default()).unwrap();
    assert_eq!(plan.alias, "post");
    assert_eq!(plan.table, "post");
    assert_eq!(plan.select, ["title AS 'title'", "name AS 'author.name'"]);
    assert_eq!(joins(&plan), ["INNER JOIN user AS author ON post.author = author.id"]);
}

#[test]
fn has_many_projection_and_joins() {
    let plan = resolve_query(&blog(), &FieldDefaults::default(), "post", QueryOptions::default()).unwrap();
    assert_eq!(
        plan.select,
        ["title AS 'title'", "name AS 'author.name'", "label AS 'tags.label'"]
    );
    assert_eq!(
        plan.joins[1..].to_vec(),
        vec![
            JoinSpec {
                kind: JoinKind::Left,
                left_table: "post".into(),
                left_column: "id".into(),
                right_table: "post_tags".into(),
                right_column: "id_post".into(),
                right_alias: None,
            },
            JoinSpec {
                kind: JoinKind::Left,
                left_table: "post_tags".into(),
                left_column: "id_tags".into(),
                right_table: "tag".into(),
                right_column: "id".into(),
                right_alias: Some("tags".into()),
            },
        ]
    );
}

#[test]
fn join_kind_follows_required() {
    let with_required = |required: bool| {
        models(&format!(
            r#"{{
                "post": {{"fields": {{"author": {{"type": "relation", "data": "user", "required": {}}}}}}},
                "user": {{"fields": {{"name": {{}}}}}}
            }}"#,
            required
        ))
    };
    let defaults = FieldDefaults::default();

    let required = resolve_query(&with_required(true), &defaults, "post", QueryOptions::default()).unwrap();
    let optional = resolve_query(&with_required(false), &defaults, "post", QueryOptions::default()).unwrap();

    assert_eq!(required.joins[0].kind, JoinKind::Inner);
    assert_eq!(optional.joins[0].kind, JoinKind::Left);
    assert_eq!(required.select, optional.select);
    assert_eq!(required.joins[0].right_table, optional.joins[0].right_table);
}

#[test]
fn relation_fields_of_joined_models_are_not_expanded() {
    let models = models(
        r#"{
            "user": {"fields": {
                "name": {},
                "best_friend": {"type": "relation", "data": "user"}
            }},
            "post": {"fields": {"author": {"type": "relation", "data": "user"}}}
        }"#,
    );
    let plan = resolve_query(&models, &FieldDefaults::default(), "post", QueryOptions::default()).unwrap();
    assert_eq!(plan.select, ["name AS 'author.name'"]);
    assert_eq!(joins(&plan), ["LEFT JOIN user AS author ON post.author = author.id"]);
}

#[test]
fn projection_is_idempotent() {
    let models = blog();
    let defaults = FieldDefaults::default();
    let first = resolve_query(&models, &defaults, "post", QueryOptions::default()).unwrap();
    let second = resolve_query(&models, &defaults, "post", QueryOptions::default()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn overrides_replace_computed_values() {
    let options = QueryOptions {
        select: Some(Vec::new()),
        join: Some(Vec::new()),
        alias: Some("p".into()),
        ..QueryOptions::default()
    };
    let plan = resolve_query(&blog(), &FieldDefaults::default(), "post", options).unwrap();
    assert!(plan.select.is_empty());
    assert!(plan.joins.is_empty());
    assert_eq!(plan.alias, "p");

    let options = QueryOptions {
        select: Some(vec!["COUNT(*) AS 'n'".into()]),
        alias: Some("p".into()),
        ..QueryOptions::default()
    };
    let plan = resolve_query(&blog(), &FieldDefaults::default(), "post", options).unwrap();
    assert_eq!(plan.select, ["COUNT(*) AS 'n'"]);
    assert_eq!(plan.joins[0].left_table, "p");
}

#[test]
fn resolver_errors() {
    let defaults = FieldDefaults::default();
    let err = resolve_query(&blog(), &defaults, "comment", QueryOptions::default()).unwrap_err();
    assert!(matches!(err, SchemaError::UnknownModel(ref m) if m == "comment"));

    let dangling = models(r#"{"post": {"fields": {"author": {"type": "relation", "data": "user"}}}}"#);
    let err = resolve_query(&dangling, &defaults, "post", QueryOptions::default()).unwrap_err();
    assert!(matches!(err, SchemaError::MissingRelationTarget { ref target, .. } if target == "user"));
}

#[test]
fn template_is_read_on_every_call() {
    let models = models(r#"{"post": {"fields": {"body": {}}}}"#);
    let mut defaults = FieldDefaults::default();
    let before = compile_schema(&models, &defaults).unwrap();
    defaults.0.max_length = Some(-1);
    defaults.0.required = Some(true);
    let after = compile_schema(&models, &defaults).unwrap();

    assert_eq!(before.tables[0].columns[0].type_and_constraints(), "VARCHAR(255)");
    assert_eq!(after.tables[0].columns[0].type_and_constraints(), "TEXT NOT NULL");
}

#[tokio::test]
async fn apply_hands_tables_before_junction_tables() {
    let recorder = Recorder::default();
    let schema = apply_schema(&recorder, &blog(), &FieldDefaults::default()).await.unwrap();
    assert_eq!(
        recorder.calls(),
        ["table post", "table user", "table tag", "junction post_tags"]
    );
    assert_eq!(schema.tables.len(), 3);
    assert_eq!(schema.junction_tables.len(), 1);
}

#[tokio::test]
async fn apply_hands_nothing_on_error() {
    let recorder = Recorder::default();
    let broken = models(
        r#"{
            "user": {"fields": {"name": {}}},
            "post": {"fields": {"score": {"type": "decimal"}}}
        }"#,
    );
    let err = apply_schema(&recorder, &broken, &FieldDefaults::default()).await.unwrap_err();
    assert!(matches!(err, AppError::Schema(SchemaError::UnknownFieldType { .. })));
    assert!(recorder.calls().is_empty());
}

#[tokio::test]
async fn service_passes_plan_through() {
    let recorder = Recorder::default();
    let mut options = QueryOptions::default();
    options.passthrough.limit = Some(10);
    let rows = ModelService::get(&recorder, &blog(), &FieldDefaults::default(), "post", options)
        .await
        .unwrap();
    assert_eq!(rows, vec![json!({"title": "Hello"})]);

    let plans = recorder.plans.lock().unwrap();
    assert_eq!(plans.len(), 1);
    assert_eq!(plans[0].model, "post");
    assert_eq!(plans[0].passthrough.limit, Some(10));
    assert_eq!(plans[0].joins.len(), 3);
}

#[tokio::test]
async fn service_does_not_fetch_on_error() {
    let recorder = Recorder::default();
    let err = ModelService::get(&recorder, &blog(), &FieldDefaults::default(), "nope", QueryOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Schema(SchemaError::UnknownModel(_))));
    assert!(recorder.plans.lock().unwrap().is_empty());
}

#[tokio::test]
async fn service_does_not_fetch_invalid_identifiers() {
    let recorder = Recorder::default();
    let unsafe_field = models(r#"{"post": {"fields": {"title FROM mysql.user -- ": {}}}}"#);
    let err = ModelService::get(&recorder, &unsafe_field, &FieldDefaults::default(), "post", QueryOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Schema(SchemaError::InvalidIdentifier { kind: "field", .. })));
    assert!(recorder.plans.lock().unwrap().is_empty());
}
