//! Reference data tables.

pub mod constellation_lines;

pub use constellation_lines::{LineCatalog, LineSegment};
