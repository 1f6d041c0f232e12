use crate::assets::store::PreparedBezel;
use crate::foundation::error::{BezelError, BezelResult};
use crate::gif::decode::DecodedGif;
use crate::gif::encode::{IndexedFrame, encode_gif};
use crate::gif::quantize::{apply_palette, build_palette};
use crate::render::compositor::{FrameCompositor, SourceFrame};
use crate::render::frame::FrameRGBA;

/// Animated GIF knobs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GifOpts {
    /// Number of leading composed frames sampled for the palette.
    pub sample_frames: usize,
    /// Palette size cap, transparent slot included.
    pub max_colors: usize,
    /// Shortest frame delay in milliseconds.
    pub min_delay_ms: u32,
}

impl Default for GifOpts {
    fn default() -> Self {
        Self {
            sample_frames: 5,
            max_colors: 256,
            min_delay_ms: 20,
        }
    }
}

/// Result of re-encoding an animation inside a bezel.
#[derive(Clone, Debug)]
pub struct ComposedGif {
    /// Encoded GIF bytes.
    pub bytes: Vec<u8>,
    /// First composed frame, for previews.
    pub preview: FrameRGBA,
    /// Number of frames encoded.
    pub frame_count: usize,
}

/// Composite every frame of `gif` into `bezel` and encode a looping GIF.
#[tracing::instrument(skip_all, fields(frames = gif.frames.len(), bezel = %bezel.entry.id()))]
pub fn compose_gif(
    gif: &DecodedGif,
    bezel: &PreparedBezel,
    compositor: &mut FrameCompositor,
    opts: &GifOpts,
) -> BezelResult<ComposedGif> {
    if gif.frames.is_empty() {
        return Err(BezelError::data("gif frames could not be composed"));
    }

    let mut composed = Vec::with_capacity(gif.frames.len());
    for f in &gif.frames {
        let out = compositor.compose(SourceFrame::from_frame(&f.frame)?, bezel)?;
        composed.push((out.to_straight_rgba8(), f.delay_ms.max(opts.min_delay_ms)));
    }

    let sample_count = composed.len().min(opts.sample_frames.max(1));
    let samples: Vec<&[u8]> = composed[..sample_count]
        .iter()
        .map(|(px, _)| px.as_slice())
        .collect();
    let palette = build_palette(&samples, opts.max_colors)?;

    let indexed: Vec<IndexedFrame> = composed
        .iter()
        .map(|(px, delay_ms)| IndexedFrame {
            indices: apply_palette(px, &palette),
            delay_ms: *delay_ms,
        })
        .collect();
    let bytes = encode_gif(bezel.entry.canvas, &indexed, &palette)?;

    let preview = FrameRGBA {
        width: bezel.entry.canvas.width,
        height: bezel.entry.canvas.height,
        data: composed[0].0.clone(),
        premultiplied: false,
    };
    tracing::info!(
        frames = indexed.len(),
        bytes = bytes.len(),
        transparent = palette.transparent_index().is_some(),
        "encoded gif"
    );
    Ok(ComposedGif {
        bytes,
        preview,
        frame_count: indexed.len(),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/gif/pipeline.rs"]
mod tests;
