//! ModelService: resolve a model query and hand it to a query executor.

mod model;
pub use model::ModelService;
