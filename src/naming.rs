//! Deterministic identifiers shared by the schema compiler and the join resolver.

/// Column every model table is keyed by and every foreign key references.
pub const ID_COLUMN: &str = "id";

/// `FK_<table>_<suffix>`.
pub fn foreign_key_name(table: &str, suffix: &str) -> String {
    format!("FK_{}_{}", table, suffix)
}

/// `<ownerTable>_<field>`.
pub fn junction_table_name(owner_table: &str, field: &str) -> String {
    format!("{}_{}", owner_table, field)
}

/// `id_<name>`: junction column pointing at the owner table or the related field.
pub fn junction_column(name: &str) -> String {
    format!("id_{}", name)
}

/// Alias prefix for columns projected through relation `field` under `parent` prefix.
pub fn nested_prefix(parent: &str, field: &str) -> String {
    format!("{}{}.", parent, field)
}

/// Single-quoted SQL string literal, used for column aliases and COMMENT/COLLATE values.
pub fn quote_literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Result alias of `column` projected under `prefix`: `<prefix><column>`.
pub fn column_alias(prefix: &str, column: &str) -> String {
    format!("{}{}", prefix, column)
}

/// `<column> AS '<alias>'`.
pub fn select_expr(column: &str, alias: &str) -> String {
    format!("{} AS {}", column, quote_literal(alias))
}
