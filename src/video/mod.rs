//! Video compositing through a capture/record platform.
//!
//! The pipeline plays a source video, composes every displayed frame into the bezel, and feeds the
//! result to a recorder. [`platform`] holds the host abstraction; [`ffmpeg`] is the native
//! implementation driving the system `ffmpeg`.

/// Cooperative cancellation.
pub mod abort;
/// `ffmpeg`-backed playback and recording.
#[cfg(feature = "media-ffmpeg")]
pub mod ffmpeg;
/// Playback/recording loop.
pub mod pipeline;
/// Capture platform traits and format negotiation.
pub mod platform;
