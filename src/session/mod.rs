//! Host-side compose state: the loaded screenshot, the bezel selection and the current output.

/// Compose dispatch per screenshot kind.
pub mod compose;
/// Session knobs.
pub mod opts;
/// Composed output slot and transient blob locators.
pub mod output;
/// Screenshot ingestion.
pub mod source;
