//! Request extractors.

pub mod prefer;
pub use prefer::*;
