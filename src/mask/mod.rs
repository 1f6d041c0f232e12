//! Screen masks derived from bezel alpha.

/// Flood-fill mask construction.
pub mod engine;
