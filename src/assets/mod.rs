//! Bezel and screenshot asset loading.

/// Injected compute-if-absent caches.
pub mod cache;
/// Raster decoding into premultiplied RGBA8.
pub mod decode;
/// `ffprobe`-backed media probing.
pub mod media;
/// Bezel image + mask store.
pub mod store;
