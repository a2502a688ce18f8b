//! HTTP handlers for entity queries and the fixed utility routes.

pub mod entity;
pub mod utility;
pub use entity::*;
pub use utility::*;
