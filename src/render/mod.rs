//! Frame compositing on the CPU.

/// Premultiplied RGBA8 blend helpers.
pub mod blend;
/// Screenshot-into-bezel compositor.
pub mod compositor;
/// Frame buffer type.
pub mod frame;
