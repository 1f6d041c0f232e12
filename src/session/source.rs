use std::path::Path;
use std::sync::Arc;

use crate::assets::decode::{PreparedImage, decode_image};
use crate::foundation::core::Orientation;
use crate::foundation::error::{BezelError, BezelResult};
use crate::gif::decode::{DecodedGif, decode_gif, is_gif};
use crate::video::platform::VideoHandle;

/// Kind of screenshot currently loaded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceKind {
    /// Single still raster.
    Image,
    /// Decoded animation.
    Gif,
    /// Video file composed through a capture platform.
    Video,
}

impl SourceKind {
    /// Output file extension for non-video kinds.
    pub fn still_extension(self) -> Option<&'static str> {
        match self {
            Self::Image => Some("png"),
            Self::Gif => Some("gif"),
            Self::Video => None,
        }
    }
}

/// The screenshot a session composes. Exactly one variant is loaded at a time.
#[derive(Clone, Debug)]
pub enum ScreenshotSource {
    /// Still image decoded to premultiplied RGBA8.
    Image(Arc<PreparedImage>),
    /// Animation, fully reconstructed at logical-screen size.
    GifFrames(DecodedGif),
    /// Probed video file.
    Video(VideoHandle),
}

impl ScreenshotSource {
    /// Sniff `bytes` and decode them as a GIF animation or a still image.
    pub fn from_bytes(bytes: &[u8], min_delay_ms: u32) -> BezelResult<Self> {
        if is_gif(bytes) {
            return Ok(Self::GifFrames(decode_gif(bytes, min_delay_ms)?));
        }
        Ok(Self::Image(Arc::new(decode_image(bytes)?)))
    }

    /// Load a screenshot file, telling stills and GIFs apart by content and treating anything
    /// `image` cannot recognize as a video.
    #[tracing::instrument(skip(path), fields(path = %path.display()))]
    pub fn from_path(path: &Path, min_delay_ms: u32) -> BezelResult<Self> {
        let mut head = [0u8; 16];
        let n = {
            let mut f = std::fs::File::open(path).map_err(|e| {
                BezelError::io(format!("failed to open '{}': {e}", path.display()))
            })?;
            read_head(&mut f, &mut head)
                .map_err(|e| BezelError::io(format!("failed to read '{}': {e}", path.display())))?
        };
        let head = &head[..n];

        if is_gif(head) || image::guess_format(head).is_ok() {
            let bytes = std::fs::read(path).map_err(|e| {
                BezelError::io(format!("failed to read '{}': {e}", path.display()))
            })?;
            return Self::from_bytes(&bytes, min_delay_ms);
        }
        tracing::debug!("not a raster format; probing as video");
        Ok(Self::Video(VideoHandle::probe(path)?))
    }

    /// Which variant is loaded.
    pub fn kind(&self) -> SourceKind {
        match self {
            Self::Image(_) => SourceKind::Image,
            Self::GifFrames(_) => SourceKind::Gif,
            Self::Video(_) => SourceKind::Video,
        }
    }

    /// Source width in pixels.
    pub fn width(&self) -> u32 {
        match self {
            Self::Image(img) => img.width,
            Self::GifFrames(gif) => gif.canvas.width,
            Self::Video(v) => v.width(),
        }
    }

    /// Source height in pixels.
    pub fn height(&self) -> u32 {
        match self {
            Self::Image(img) => img.height,
            Self::GifFrames(gif) => gif.canvas.height,
            Self::Video(v) => v.height(),
        }
    }

    /// Orientation derived from the source dimensions.
    pub fn orientation(&self) -> Orientation {
        Orientation::of_dimensions(self.width(), self.height())
    }

    /// `true` once the source has something to compose.
    pub fn is_ready(&self) -> bool {
        match self {
            Self::Image(img) => img.width > 0 && img.height > 0,
            Self::GifFrames(gif) => !gif.frames.is_empty(),
            Self::Video(v) => v.width() > 0 && v.height() > 0,
        }
    }
}

fn read_head(r: &mut impl std::io::Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}

#[cfg(test)]
#[path = "../../tests/unit/session/source.rs"]
mod tests;
