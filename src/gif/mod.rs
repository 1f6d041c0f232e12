//! Animated GIF decoding, recomposition, and re-encoding.

/// Frame reconstruction with disposal handling.
pub mod decode;
/// Indexed GIF encoding.
pub mod encode;
/// Decode -> compose -> encode.
pub mod pipeline;
/// Palette building and index mapping.
pub mod quantize;
