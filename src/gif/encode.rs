use std::borrow::Cow;

use crate::foundation::core::Canvas;
use crate::foundation::error::{BezelError, BezelResult};
use crate::gif::quantize::Palette;

/// One palette-indexed full-canvas frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexedFrame {
    /// One palette index per pixel, row-major.
    pub indices: Vec<u8>,
    /// Display time in milliseconds.
    pub delay_ms: u32,
}

/// Milliseconds to GIF centiseconds, rounded, never below 2 (20 ms).
pub fn delay_to_centis(delay_ms: u32) -> u16 {
    let cs = delay_ms.saturating_add(5) / 10;
    cs.clamp(2, u32::from(u16::MAX)) as u16
}

/// Encode an infinitely looping GIF with one global palette.
///
/// Every frame covers the whole canvas. When the palette has a transparent entry each frame marks
/// it transparent and disposes to background, so transparent pixels never show the previous
/// frame.
#[tracing::instrument(skip(frames, palette), fields(frames = frames.len(), colors = palette.len()))]
pub fn encode_gif(canvas: Canvas, frames: &[IndexedFrame], palette: &Palette) -> BezelResult<Vec<u8>> {
    if frames.is_empty() {
        return Err(BezelError::data("cannot encode a gif without frames"));
    }
    if palette.is_empty() {
        return Err(BezelError::data("cannot encode a gif with an empty palette"));
    }
    let w: u16 = canvas
        .width
        .try_into()
        .map_err(|_| BezelError::data("gif width exceeds u16"))?;
    let h: u16 = canvas
        .height
        .try_into()
        .map_err(|_| BezelError::data("gif height exceeds u16"))?;
    let px_count = (canvas.width as usize) * (canvas.height as usize);

    let mut buf = Vec::new();
    {
        let mut encoder = gif::Encoder::new(&mut buf, w, h, &palette.to_rgb_bytes())
            .map_err(|e| BezelError::data(format!("gif encoder init failed: {e}")))?;
        encoder
            .set_repeat(gif::Repeat::Infinite)
            .map_err(|e| BezelError::data(format!("gif repeat flag failed: {e}")))?;

        let transparent = palette.transparent_index();
        let dispose = if transparent.is_some() {
            gif::DisposalMethod::Background
        } else {
            gif::DisposalMethod::Keep
        };
        for (i, f) in frames.iter().enumerate() {
            if f.indices.len() != px_count {
                return Err(BezelError::data(format!(
                    "gif frame {i} has {} indices, expected {px_count}",
                    f.indices.len()
                )));
            }
            let frame = gif::Frame {
                width: w,
                height: h,
                delay: delay_to_centis(f.delay_ms),
                dispose,
                transparent,
                buffer: Cow::Borrowed(&f.indices),
                ..gif::Frame::default()
            };
            encoder
                .write_frame(&frame)
                .map_err(|e| BezelError::data(format!("gif frame {i} encode failed: {e}")))?;
        }
        // Dropping the encoder writes the trailer.
    }
    Ok(buf)
}

#[cfg(test)]
#[path = "../../tests/unit/gif/encode.rs"]
mod tests;
