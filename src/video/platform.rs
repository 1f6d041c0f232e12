use std::path::{Path, PathBuf};

use crate::assets::media::{MediaInfo, probe_video};
use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{BezelError, BezelResult};
use crate::render::frame::FrameRGBA;

/// Container/codec strings in preference order.
pub const DEFAULT_FORMATS: [&str; 3] = [
    "video/mp4;codecs=avc1",
    "video/webm;codecs=vp9",
    "video/webm;codecs=vp8",
];

/// A playable source video with known geometry.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoHandle {
    info: MediaInfo,
}

impl VideoHandle {
    /// Probe `path` and wrap the result.
    pub fn probe(path: &Path) -> BezelResult<Self> {
        Ok(Self::from_info(probe_video(path)?))
    }

    /// Wrap already-known stream facts.
    pub fn from_info(info: MediaInfo) -> Self {
        Self { info }
    }

    /// Stream facts.
    pub fn info(&self) -> &MediaInfo {
        &self.info
    }

    /// Source file.
    pub fn path(&self) -> &Path {
        &self.info.source_path
    }

    /// Pixel width.
    pub fn width(&self) -> u32 {
        self.info.width
    }

    /// Pixel height.
    pub fn height(&self) -> u32 {
        self.info.height
    }

    /// Duration in seconds, 0 when unknown.
    pub fn duration_sec(&self) -> f64 {
        self.info.duration_sec
    }
}

/// An audio track that can be attached to a recording.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AudioTrack {
    /// Track label.
    pub id: String,
    /// Media the track is read from.
    pub source: PathBuf,
}

/// Recorder setup negotiated before capture begins.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecorderConfig {
    /// Captured canvas size.
    pub canvas: Canvas,
    /// Capture frame rate.
    pub fps: Fps,
    /// Negotiated container/codec string.
    pub mime_type: String,
}

/// What playback produced next.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlaybackEvent {
    /// A frame ready for display, premultiplied.
    Frame(FrameRGBA),
    /// Playback reached the end.
    Ended,
}

/// Real-time playback of a source video.
pub trait MediaPlayback {
    /// Source stream facts.
    fn info(&self) -> &MediaInfo;
    /// Start playback from time zero.
    fn play(&mut self) -> BezelResult<()>;
    /// Audio tracks exposed once playback has begun.
    fn audio_tracks(&self) -> Vec<AudioTrack>;
    /// Block until the next displayed frame or the end of playback.
    fn next_frame(&mut self) -> BezelResult<PlaybackEvent>;
    /// Release the decoder; further calls are no-ops.
    fn release(&mut self);
}

/// Stream recorder fed with composed canvas frames.
pub trait MediaRecorder {
    /// Attach an audio track; only valid before [`MediaRecorder::start`].
    fn add_audio_track(&mut self, track: AudioTrack) -> BezelResult<()>;
    /// Begin recording.
    fn start(&mut self) -> BezelResult<()>;
    /// Append one captured canvas frame.
    fn write_frame(&mut self, frame: &FrameRGBA) -> BezelResult<()>;
    /// Finalize and return the emitted data chunks in order.
    fn stop(&mut self) -> BezelResult<Vec<Vec<u8>>>;
    /// Discard the recording.
    fn abort(&mut self);
    /// Stop the capture stream and every attached audio track.
    fn stop_tracks(&mut self);
}

/// Host capabilities for capture-backed video compositing.
pub trait CapturePlatform {
    /// Return `true` when a canvas capture primitive and a stream recorder are available.
    fn supports_capture(&self) -> bool;
    /// Return `true` when the recorder can produce `mime_type`.
    fn is_type_supported(&self, mime_type: &str) -> bool;
    /// Create a recorder for the negotiated format.
    fn create_recorder(&self, cfg: RecorderConfig) -> BezelResult<Box<dyn MediaRecorder>>;
    /// Open `handle` for playback at the capture frame rate.
    fn open_playback(&self, handle: &VideoHandle, fps: Fps)
    -> BezelResult<Box<dyn MediaPlayback>>;
}

/// Pick the first preferred format the platform supports.
pub fn negotiate_format<S: AsRef<str>>(
    platform: &dyn CapturePlatform,
    preferences: &[S],
) -> BezelResult<String> {
    let chosen = preferences
        .iter()
        .map(AsRef::as_ref)
        .find(|m| platform.is_type_supported(m))
        .ok_or_else(|| BezelError::capability("no supported video recording format"))?;
    tracing::debug!(mime_type = chosen, "negotiated recorder format");
    Ok(chosen.to_string())
}

/// File extension for a container/codec string.
pub fn extension_for_mime(mime_type: &str) -> &'static str {
    if mime_type.starts_with("video/webm") {
        "webm"
    } else {
        "mp4"
    }
}
