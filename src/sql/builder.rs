//! Renders compiled descriptors and query plans as MySQL statements.
//! Identifiers come from validated config and are backtick-quoted; filter values are parameters.

use crate::naming::{quote_literal, ID_COLUMN};
use crate::query::{QueryPlan, SelectItem};
use crate::schema::{ColumnDef, ForeignKeyDescriptor, JunctionTableDescriptor, TableDescriptor};
use indexmap::IndexMap;
use serde_json::Value;

pub const DEFAULT_LIMIT: u32 = 100;
pub const MAX_LIMIT: u32 = 1000;

/// Quote identifier for MySQL.
fn quoted(s: &str) -> String {
    format!("`{}`", s.replace('`', "``"))
}

/// Physical table name with the configured prefix, quoted.
fn prefixed(prefix: &str, table: &str) -> String {
    quoted(&format!("{}{}", prefix, table))
}

/// `a.b` -> `` `a`.`b` ``; a bare column is qualified with `default_table`.
fn qualified_column(default_table: &str, column: &str) -> String {
    match column.split_once('.') {
        Some((table, col)) => format!("{}.{}", quoted(table), quoted(col)),
        None => format!("{}.{}", quoted(default_table), quoted(column)),
    }
}

pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: Value) -> &'static str {
        self.params.push(v);
        "?"
    }
}

/// Computed columns are qualified with their table alias, so equal column names on
/// joined tables stay unambiguous.
fn select_item(item: &SelectItem) -> String {
    match item {
        SelectItem::Column {
            table_ref,
            column,
            alias,
        } => format!("{}.{} AS {}", quoted(table_ref), quoted(column), quote_literal(alias)),
        SelectItem::Raw(expr) => expr.clone(),
    }
}

fn column_def(col: &ColumnDef) -> String {
    format!("{} {}", quoted(&col.name), col.type_and_constraints())
}

fn foreign_key_defs(prefix: &str, fks: &IndexMap<String, ForeignKeyDescriptor>) -> Vec<String> {
    fks.iter()
        .map(|(column, fk)| {
            format!(
                "CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
                quoted(&fk.constraint_name),
                quoted(column),
                prefixed(prefix, &fk.referenced_table),
                quoted(&fk.referenced_column)
            )
        })
        .collect()
}

/// CREATE TABLE for a model table. Adds the surrogate `id` key every model table is referenced by.
pub fn create_table_sql(table: &TableDescriptor, prefix: &str) -> String {
    let mut defs = vec![format!("{} INT(11) NOT NULL AUTO_INCREMENT", quoted(ID_COLUMN))];
    defs.extend(table.columns.iter().map(column_def));
    defs.push(format!("PRIMARY KEY ({})", quoted(ID_COLUMN)));
    defs.extend(foreign_key_defs(prefix, &table.foreign_keys));

    let mut sql = format!(
        "CREATE TABLE IF NOT EXISTS {} (\n  {}\n) DEFAULT COLLATE {}",
        prefixed(prefix, &table.name),
        defs.join(",\n  "),
        table.collation
    );
    if let Some(comment) = table.comment.as_deref().filter(|c| !c.is_empty()) {
        sql.push_str(&format!(" COMMENT {}", quote_literal(comment)));
    }
    sql
}

/// CREATE TABLE for a junction table: composite primary key, no surrogate key.
pub fn create_junction_table_sql(table: &JunctionTableDescriptor, prefix: &str) -> String {
    let mut defs: Vec<String> = table.columns.iter().map(column_def).collect();
    let pk: Vec<String> = table.primary_key.iter().map(|c| quoted(c)).collect();
    defs.push(format!("PRIMARY KEY ({})", pk.join(", ")));
    defs.extend(foreign_key_defs(prefix, &table.foreign_keys));
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n  {}\n)",
        prefixed(prefix, &table.name),
        defs.join(",\n  ")
    )
}

/// SELECT for a resolved plan. Every joined table is aliased (to its unprefixed name when the
/// plan gives no alias) so join conditions can reference it regardless of the table prefix.
/// An empty selection renders as `*`. LIMIT defaults to 100 and is capped at 1000.
pub fn select_sql(plan: &QueryPlan, prefix: &str) -> QueryBuf {
    let mut q = QueryBuf::new();
    let select = if plan.select.is_empty() {
        "*".to_string()
    } else {
        plan.select.iter().map(select_item).collect::<Vec<_>>().join(", ")
    };

    let mut sql = format!(
        "SELECT {} FROM {} AS {}",
        select,
        prefixed(prefix, &plan.table),
        quoted(&plan.alias)
    );
    for join in &plan.joins {
        sql.push_str(&format!(
            " {} {} AS {} ON {}.{} = {}.{}",
            join.kind.as_sql(),
            prefixed(prefix, &join.right_table),
            quoted(join.right_name()),
            quoted(&join.left_table),
            quoted(&join.left_column),
            quoted(join.right_name()),
            quoted(&join.right_column)
        ));
    }

    let opts = &plan.passthrough;
    let mut where_parts = Vec::new();
    for (col, val) in &opts.filters {
        let ph = q.push_param(val.clone());
        where_parts.push(format!("{} = {}", qualified_column(&plan.alias, col), ph));
    }
    if !where_parts.is_empty() {
        sql.push_str(&format!(" WHERE {}", where_parts.join(" AND ")));
    }

    if !opts.order_by.is_empty() {
        let order: Vec<String> = opts
            .order_by
            .iter()
            .map(|o| {
                let dir = if o.descending { "DESC" } else { "ASC" };
                format!("{} {}", qualified_column(&plan.alias, &o.column), dir)
            })
            .collect();
        sql.push_str(&format!(" ORDER BY {}", order.join(", ")));
    }

    let limit = opts.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
    sql.push_str(&format!(" LIMIT {}", limit));
    if let Some(offset) = opts.offset {
        sql.push_str(&format!(" OFFSET {}", offset));
    }

    q.sql = sql;
    q
}
