//! Pure domain types with minimal dependencies
//!
//! Types here should have no framework dependencies (cosmic, iced, etc.)
//! to avoid circular dependencies.

pub mod geometry;
pub mod selection;

pub use geometry::*;
pub use selection::*;
