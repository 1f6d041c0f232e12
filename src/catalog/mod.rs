//! Bezel catalog: the device/color/orientation index and screenshot auto-matching.

/// Three-level catalog index built from the metadata table.
pub mod index;
/// Best-fit bezel selection for a screenshot size.
pub mod matcher;
