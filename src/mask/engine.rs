use std::collections::VecDeque;

use crate::assets::decode::PreparedImage;
use crate::foundation::core::{Canvas, ScreenRect};
use crate::foundation::error::{BezelError, BezelResult};

/// Pixels with alpha at or below this value may belong to the screen interior.
pub const INTERIOR_ALPHA_THRESHOLD: u8 = 254;

/// Translucency mask isolating a bezel's display cutout.
///
/// Full bezel canvas size, premultiplied RGBA8. Inside the flood-filled screen region each pixel is
/// white with alpha `255 - bezel_alpha`; everything else is fully transparent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mask {
    /// Canvas the mask was built for.
    pub canvas: Canvas,
    /// Screen rectangle the mask was built for.
    pub screen: ScreenRect,
    /// Premultiplied RGBA8 pixels, `canvas.width * canvas.height * 4` bytes.
    pub rgba8_premul: Vec<u8>,
}

impl Mask {
    /// Mask alpha at `(x, y)`; outside the canvas is transparent.
    pub fn alpha_at(&self, x: u32, y: u32) -> u8 {
        if x >= self.canvas.width || y >= self.canvas.height {
            return 0;
        }
        let idx = ((y as usize) * (self.canvas.width as usize) + (x as usize)) * 4;
        self.rgba8_premul[idx + 3]
    }

    /// Return `true` if the mask was built for exactly this bezel geometry.
    pub fn matches_geometry(&self, canvas: Canvas, screen: ScreenRect) -> bool {
        self.canvas == canvas && self.screen == screen
    }

    /// Straight-alpha copy, e.g. for writing the mask as a PNG.
    pub fn to_straight_rgba8(&self) -> Vec<u8> {
        let mut out = self.rgba8_premul.clone();
        crate::foundation::math::unpremultiply_rgba8_in_place(&mut out);
        out
    }
}

/// Build the screen mask for `bezel` drawn at the origin of a `canvas`-sized surface.
///
/// The fill starts at the center of `screen` (or the first candidate in row-major order when the
/// center is opaque) and spreads 4-connected over pixels with alpha <= 254. Transparent islands not
/// connected to the seed, like camera cutouts, stay out of the mask.
#[tracing::instrument(skip(bezel))]
pub fn build_mask(bezel: &PreparedImage, canvas: Canvas, screen: ScreenRect) -> BezelResult<Mask> {
    screen.validate_within(canvas)?;

    let sw = screen.width as usize;
    let sh = screen.height as usize;
    let total = sw * sh;

    let mut alpha = Vec::with_capacity(total);
    for y in 0..screen.height {
        for x in 0..screen.width {
            alpha.push(bezel.alpha_at(screen.x + x, screen.y + y));
        }
    }
    let is_candidate = |i: usize| alpha[i] <= INTERIOR_ALPHA_THRESHOLD;

    let center = (sh / 2) * sw + sw / 2;
    let seed = if is_candidate(center) {
        center
    } else {
        (0..total).find(|&i| is_candidate(i)).ok_or_else(|| {
            BezelError::data(format!(
                "bezel has no transparent screen interior inside ({}, {}, {}x{})",
                screen.x, screen.y, screen.width, screen.height
            ))
        })?
    };

    let mut visited = vec![false; total];
    let mut queue = VecDeque::with_capacity(total);
    visited[seed] = true;
    queue.push_back(seed);

    while let Some(cur) = queue.pop_front() {
        let x = cur % sw;
        let y = cur / sw;

        let mut visit = |idx: usize| {
            if !visited[idx] && is_candidate(idx) {
                visited[idx] = true;
                queue.push_back(idx);
            }
        };
        if x + 1 < sw {
            visit(cur + 1);
        }
        if x > 0 {
            visit(cur - 1);
        }
        if y + 1 < sh {
            visit(cur + sw);
        }
        if y > 0 {
            visit(cur - sw);
        }
    }

    let mut rgba8_premul = vec![0u8; canvas.rgba_len()];
    let cw = canvas.width as usize;
    let mut filled = 0usize;
    for (i, seen) in visited.iter().enumerate() {
        if !*seen {
            continue;
        }
        filled += 1;
        let m = 255 - alpha[i];
        let cx = screen.x as usize + i % sw;
        let cy = screen.y as usize + i / sw;
        let o = (cy * cw + cx) * 4;
        // White at alpha m, premultiplied.
        rgba8_premul[o..o + 4].copy_from_slice(&[m, m, m, m]);
    }
    tracing::debug!(filled, total, "built bezel mask");

    Ok(Mask {
        canvas,
        screen,
        rgba8_premul,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/mask/engine.rs"]
mod tests;
