pub mod entity;
pub mod loader;
pub mod registry;
pub mod settings;

pub use entity::*;
pub use loader::*;
pub use registry::*;
pub use settings::*;
