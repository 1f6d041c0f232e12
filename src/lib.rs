//! bezelkit places screenshots, animated GIFs and screen recordings inside device bezels.
//!
//! The public API is session-oriented:
//!
//! - Load a [`CatalogIndex`] from the bezel metadata table
//! - Create a [`ComposeSession`] and hand it a [`ScreenshotSource`]
//! - [`ComposeSession::compose`] into a PNG, a looping GIF or a recorded video
//!
//! Lower-level pieces ([`build_mask`], [`FrameCompositor`], [`compose_gif`], [`compose_video`])
//! are usable on their own.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

/// Bezel and screenshot asset loading.
pub mod assets;
/// Catalog index and auto-match.
pub mod catalog;
/// Geometry, errors, pixel math.
pub mod foundation;
/// Animated GIF pipeline.
pub mod gif;
/// Screen mask construction.
pub mod mask;
/// CPU compositing.
pub mod render;
/// Host compose session.
pub mod session;
/// Capture-backed video pipeline.
pub mod video;

pub use crate::assets::decode::PreparedImage;
pub use crate::assets::store::{BezelAssets, PreparedBezel};
pub use crate::catalog::index::{BezelEntry, BezelId, BezelMeta, CatalogIndex};
pub use crate::catalog::matcher::find_best_match;
pub use crate::foundation::core::{Canvas, Fps, Orientation, ScreenRect};
pub use crate::foundation::error::{BezelError, BezelResult};
pub use crate::gif::pipeline::{ComposedGif, GifOpts, compose_gif};
pub use crate::mask::engine::{Mask, build_mask};
pub use crate::render::compositor::{FrameCompositor, SourceFrame};
pub use crate::render::frame::FrameRGBA;
pub use crate::session::compose::{ComposeReport, ComposeSession, OrientationNotice, SourceUpdate};
pub use crate::session::opts::SessionOpts;
pub use crate::session::output::{BlobStore, ComposedOutput, OutputSlot};
pub use crate::session::source::{ScreenshotSource, SourceKind};
pub use crate::video::abort::AbortSignal;
pub use crate::video::pipeline::{ComposedVideo, VideoOpts, compose_video};
pub use crate::video::platform::{CapturePlatform, MediaPlayback, MediaRecorder, VideoHandle};

#[cfg(feature = "media-ffmpeg")]
pub use crate::video::ffmpeg::FfmpegPlatform;
