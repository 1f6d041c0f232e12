//! Shared primitives: geometry, error taxonomy, pixel math.

/// Geometry and timing primitives.
pub mod core;
/// Error taxonomy.
pub mod error;
pub(crate) mod math;
