//! HTTP handlers for entity routes and schema export.

pub mod entity;
pub mod export;
pub use entity::*;
pub use export::*;
