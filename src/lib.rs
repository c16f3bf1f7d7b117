//! Model SDK: declarative model definitions compiled to relational DDL and join queries.

pub mod config;
pub mod error;
pub mod executor;
pub mod migration;
pub mod naming;
pub mod query;
pub mod schema;
pub mod service;
pub mod sql;
pub mod store;

pub use config::{load_from_dir, parse_field_defaults, parse_models, validate, FieldDefaults, LoadedConfig, ModelSet};
pub use error::{AppError, SchemaError};
pub use executor::{DdlExecutor, QueryExecutor};
pub use migration::apply_schema;
pub use query::{resolve_query, JoinKind, JoinSpec, QueryOptions, QueryPlan, SelectItem, MAX_JOIN_DEPTH};
pub use schema::{compile_schema, CompiledSchema, JunctionTableDescriptor, TableDescriptor};
pub use service::ModelService;
pub use store::MySqlStore;
