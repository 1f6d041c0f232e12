use std::io::Cursor;

use crate::foundation::core::Canvas;
use crate::foundation::error::{BezelError, BezelResult};
use crate::foundation::math::premultiply_rgba8_in_place;
use crate::render::blend::over;
use crate::render::frame::FrameRGBA;

/// Display time given to frames whose stored delay is zero.
pub const DEFAULT_FRAME_DELAY_MS: u32 = 100;

/// Effective display time of a stored delay: zero means unset, anything else is floored at
/// `min_delay_ms`.
pub fn effective_delay_ms(stored_ms: u32, min_delay_ms: u32) -> u32 {
    let delay = if stored_ms == 0 {
        DEFAULT_FRAME_DELAY_MS
    } else {
        stored_ms
    };
    delay.max(min_delay_ms)
}

/// What happens to a frame's area before the next frame is drawn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Disposal {
    /// Leave the canvas as drawn (also covers "unspecified").
    #[default]
    Keep,
    /// Clear the frame's rectangle to transparent.
    Background,
    /// Restore the canvas to its state before the frame was drawn.
    Previous,
}

impl From<gif::DisposalMethod> for Disposal {
    fn from(d: gif::DisposalMethod) -> Self {
        match d {
            gif::DisposalMethod::Background => Self::Background,
            gif::DisposalMethod::Previous => Self::Previous,
            gif::DisposalMethod::Any | gif::DisposalMethod::Keep => Self::Keep,
        }
    }
}

/// One raw frame as stored in the file: a straight-alpha RGBA patch at an offset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GifPatch {
    /// Patch left offset on the logical screen.
    pub left: u32,
    /// Patch top offset on the logical screen.
    pub top: u32,
    /// Patch width.
    pub width: u32,
    /// Patch height.
    pub height: u32,
    /// Straight-alpha RGBA8, `width * height * 4` bytes.
    pub rgba: Vec<u8>,
    /// Delay in milliseconds as stored (centiseconds * 10).
    pub delay_ms: u32,
    /// Disposal applied after this frame.
    pub disposal: Disposal,
}

/// A fully composited animation frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedGifFrame {
    /// Premultiplied full-canvas raster.
    pub frame: FrameRGBA,
    /// Display time; unset delays use [`DEFAULT_FRAME_DELAY_MS`], never below the minimum.
    pub delay_ms: u32,
}

/// Decoded animation at logical-screen size.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedGif {
    /// Logical screen size.
    pub canvas: Canvas,
    /// Frames in source order.
    pub frames: Vec<DecodedGifFrame>,
}

/// Return `true` when `bytes` start with a GIF signature.
pub fn is_gif(bytes: &[u8]) -> bool {
    bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a")
}

/// Parse GIF bytes into raw patches plus the logical screen size.
pub fn read_patches(bytes: &[u8]) -> BezelResult<(Canvas, Vec<GifPatch>)> {
    let mut opts = gif::DecodeOptions::new();
    opts.set_color_output(gif::ColorOutput::RGBA);
    let mut decoder = opts
        .read_info(Cursor::new(bytes))
        .map_err(|e| BezelError::data(format!("gif header decode failed: {e}")))?;
    let canvas = Canvas {
        width: u32::from(decoder.width()),
        height: u32::from(decoder.height()),
    };

    let mut patches = Vec::new();
    while let Some(frame) = decoder
        .read_next_frame()
        .map_err(|e| BezelError::data(format!("gif frame decode failed: {e}")))?
    {
        patches.push(GifPatch {
            left: u32::from(frame.left),
            top: u32::from(frame.top),
            width: u32::from(frame.width),
            height: u32::from(frame.height),
            rgba: frame.buffer.to_vec(),
            delay_ms: u32::from(frame.delay) * 10,
            disposal: frame.dispose.into(),
        });
    }
    Ok((canvas, patches))
}

/// Composite raw patches into full-canvas frames, honoring disposal.
///
/// The previous frame's disposal is applied before drawing; a `Previous` frame snapshots the
/// canvas before it is drawn. Zero-area patches produce no frame but still take part in disposal.
pub fn reconstruct_frames(
    canvas: Canvas,
    patches: impl IntoIterator<Item = GifPatch>,
    min_delay_ms: u32,
) -> BezelResult<Vec<DecodedGifFrame>> {
    if canvas.width == 0 || canvas.height == 0 {
        return Err(BezelError::data("gif logical screen has no area"));
    }
    let mut current = vec![0u8; canvas.rgba_len()];
    let mut restore: Option<Vec<u8>> = None;
    let mut previous: Option<GifPatch> = None;
    let mut frames = Vec::new();

    for patch in patches {
        if let Some(prev) = previous.take() {
            match prev.disposal {
                Disposal::Background => clear_rect(&mut current, canvas, &prev),
                Disposal::Previous => {
                    if let Some(snapshot) = restore.as_ref() {
                        current.copy_from_slice(snapshot);
                    }
                }
                Disposal::Keep => {}
            }
        }

        restore = (patch.disposal == Disposal::Previous).then(|| current.clone());

        if patch.width == 0 || patch.height == 0 {
            tracing::trace!("skipping zero-area gif patch");
            previous = Some(patch);
            continue;
        }

        draw_patch(&mut current, canvas, &patch)?;
        frames.push(DecodedGifFrame {
            frame: FrameRGBA {
                width: canvas.width,
                height: canvas.height,
                data: current.clone(),
                premultiplied: true,
            },
            delay_ms: effective_delay_ms(patch.delay_ms, min_delay_ms),
        });
        previous = Some(patch);
    }

    if frames.is_empty() {
        return Err(BezelError::data("gif contains no frames"));
    }
    Ok(frames)
}

/// Decode a GIF into composited frames.
#[tracing::instrument(skip(bytes), fields(len = bytes.len()))]
pub fn decode_gif(bytes: &[u8], min_delay_ms: u32) -> BezelResult<DecodedGif> {
    let (canvas, patches) = read_patches(bytes)?;
    let frames = reconstruct_frames(canvas, patches, min_delay_ms)?;
    tracing::debug!(
        frames = frames.len(),
        width = canvas.width,
        height = canvas.height,
        "decoded gif"
    );
    Ok(DecodedGif { canvas, frames })
}

fn clear_rect(current: &mut [u8], canvas: Canvas, patch: &GifPatch) {
    let x0 = patch.left.min(canvas.width) as usize;
    let x1 = patch.left.saturating_add(patch.width).min(canvas.width) as usize;
    let y0 = patch.top.min(canvas.height);
    let y1 = patch.top.saturating_add(patch.height).min(canvas.height);
    let stride = canvas.width as usize * 4;
    for y in y0..y1 {
        let row = y as usize * stride;
        current[row + x0 * 4..row + x1 * 4].fill(0);
    }
}

fn draw_patch(current: &mut [u8], canvas: Canvas, patch: &GifPatch) -> BezelResult<()> {
    let expected = (patch.width as usize) * (patch.height as usize) * 4;
    if patch.rgba.len() != expected {
        return Err(BezelError::data(format!(
            "gif patch has {} bytes, expected {expected}",
            patch.rgba.len()
        )));
    }
    let mut src = patch.rgba.clone();
    premultiply_rgba8_in_place(&mut src);

    let stride = canvas.width as usize * 4;
    let patch_stride = patch.width as usize * 4;
    for py in 0..patch.height {
        let y = patch.top + py;
        if y >= canvas.height {
            break;
        }
        for px in 0..patch.width {
            let x = patch.left + px;
            if x >= canvas.width {
                break;
            }
            let s = py as usize * patch_stride + px as usize * 4;
            let d = y as usize * stride + x as usize * 4;
            let out = over(
                [current[d], current[d + 1], current[d + 2], current[d + 3]],
                [src[s], src[s + 1], src[s + 2], src[s + 3]],
            );
            current[d..d + 4].copy_from_slice(&out);
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/gif/decode.rs"]
mod tests;
