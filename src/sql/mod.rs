//! MySQL rendering of descriptors and plans: quoted identifiers, values as parameters.

mod builder;
pub mod params;
pub use builder::*;
pub use params::*;
