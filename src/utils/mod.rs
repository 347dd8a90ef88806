//! Shared helpers used across the crate.
//!
//! - [`format`] - Hex and address formatting for operands and listing columns
//! - [`visitedmap`] - Bitfield tracking of the image bytes covered by decodes

pub mod format;
pub mod visitedmap;

pub use visitedmap::VisitedMap;
