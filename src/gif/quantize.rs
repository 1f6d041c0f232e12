use crate::foundation::error::{BezelError, BezelResult};

const REDUCED_KEYS: usize = 1 << 12;
const NEUQUANT_SAMPLE_FACTOR: i32 = 10;
const NEUQUANT_MAX_PIXELS: usize = 1 << 20;

/// Indexed palette with an optional fully transparent slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<[u8; 4]>,
    transparent_index: Option<u8>,
}

impl Palette {
    /// Palette entries as straight RGBA.
    pub fn colors(&self) -> &[[u8; 4]] {
        &self.colors
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Return `true` for an empty palette.
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Index of the entry whose alpha is zero, if any.
    pub fn transparent_index(&self) -> Option<u8> {
        self.transparent_index
    }

    /// Flat `r, g, b` triples as the GIF color table expects.
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        self.colors.iter().flat_map(|c| [c[0], c[1], c[2]]).collect()
    }
}

/// Snap a straight-alpha pixel to 4 bits per channel with one-bit alpha.
///
/// Alpha above half becomes opaque; anything else becomes fully transparent with its color
/// cleared.
pub fn reduce_rgba4444(px: [u8; 4]) -> [u8; 4] {
    if px[3] <= 127 {
        return [0, 0, 0, 0];
    }
    [(px[0] >> 4) * 17, (px[1] >> 4) * 17, (px[2] >> 4) * 17, 255]
}

fn key_of(reduced: [u8; 4]) -> usize {
    (usize::from(reduced[0] / 17) << 8) | (usize::from(reduced[1] / 17) << 4) | usize::from(reduced[2] / 17)
}

fn color_of(key: usize) -> [u8; 4] {
    [
        ((key >> 8) & 0xf) as u8 * 17,
        ((key >> 4) & 0xf) as u8 * 17,
        (key & 0xf) as u8 * 17,
        255,
    ]
}

/// Build a palette of at most `max_colors` entries from straight-alpha RGBA samples.
///
/// When any sampled pixel reduces to transparent, one slot is reserved for `[0, 0, 0, 0]` and
/// recorded as the transparent index. Samples with few distinct colors get an exact palette;
/// otherwise NeuQuant picks the opaque entries.
#[tracing::instrument(skip(samples), fields(samples = samples.len()))]
pub fn build_palette(samples: &[&[u8]], max_colors: usize) -> BezelResult<Palette> {
    let max_colors = max_colors.clamp(2, 256);
    let mut seen = vec![false; REDUCED_KEYS];
    let mut has_transparent = false;
    let mut total_px = 0usize;
    for sample in samples {
        if !sample.len().is_multiple_of(4) {
            return Err(BezelError::data("palette sample is not rgba8"));
        }
        for px in sample.chunks_exact(4) {
            let r = reduce_rgba4444([px[0], px[1], px[2], px[3]]);
            if r[3] == 0 {
                has_transparent = true;
            } else {
                seen[key_of(r)] = true;
            }
            total_px += 1;
        }
    }
    if total_px == 0 {
        return Err(BezelError::data("palette sample has no pixels"));
    }

    let budget = max_colors - usize::from(has_transparent);
    let distinct: Vec<usize> = (0..REDUCED_KEYS).filter(|&k| seen[k]).collect();
    let mut colors: Vec<[u8; 4]> = if distinct.len() <= budget {
        distinct.into_iter().map(color_of).collect()
    } else {
        neuquant_colors(samples, total_px, budget)
    };
    tracing::debug!(
        colors = colors.len(),
        transparent = has_transparent,
        "built palette"
    );

    let transparent_index = if has_transparent {
        colors.push([0, 0, 0, 0]);
        Some((colors.len() - 1) as u8)
    } else {
        None
    };
    Ok(Palette {
        colors,
        transparent_index,
    })
}

fn neuquant_colors(samples: &[&[u8]], total_px: usize, budget: usize) -> Vec<[u8; 4]> {
    let step = total_px.div_ceil(NEUQUANT_MAX_PIXELS).max(1);
    let mut pixels = Vec::with_capacity((total_px / step + 1) * 4);
    for (i, px) in samples
        .iter()
        .flat_map(|s| s.chunks_exact(4))
        .enumerate()
    {
        if i % step != 0 {
            continue;
        }
        let r = reduce_rgba4444([px[0], px[1], px[2], px[3]]);
        if r[3] != 0 {
            pixels.extend_from_slice(&r);
        }
    }
    let nq = color_quant::NeuQuant::new(NEUQUANT_SAMPLE_FACTOR, budget, &pixels);

    let mut seen = vec![false; REDUCED_KEYS];
    let mut colors = Vec::with_capacity(budget);
    for c in nq.color_map_rgba().chunks_exact(4) {
        let r = reduce_rgba4444([c[0], c[1], c[2], 255]);
        let k = key_of(r);
        if !seen[k] {
            seen[k] = true;
            colors.push(r);
        }
    }
    colors
}

/// Map straight-alpha RGBA pixels to palette indices.
///
/// Transparent pixels take the transparent slot, or the entry nearest black when the palette has
/// none (transparency that only appears outside the sampled frames).
pub fn apply_palette(rgba: &[u8], palette: &Palette) -> Vec<u8> {
    let fallback = palette.transparent_index.unwrap_or(0);
    let opaque: Vec<(u8, [u8; 4])> = palette
        .colors
        .iter()
        .enumerate()
        .filter(|(_, c)| c[3] != 0)
        .map(|(i, c)| (i as u8, *c))
        .collect();

    let mut lut = vec![fallback; REDUCED_KEYS];
    if !opaque.is_empty() {
        for (key, slot) in lut.iter_mut().enumerate() {
            let c = color_of(key);
            let mut best = (u32::MAX, fallback);
            for (i, p) in &opaque {
                let d = sq_dist(c, *p);
                if d < best.0 {
                    best = (d, *i);
                }
            }
            *slot = best.1;
        }
    }

    rgba.chunks_exact(4)
        .map(|px| {
            let r = reduce_rgba4444([px[0], px[1], px[2], px[3]]);
            if r[3] == 0 {
                // Without a transparent slot, transparency maps to the entry nearest black.
                palette.transparent_index.unwrap_or(lut[0])
            } else {
                lut[key_of(r)]
            }
        })
        .collect()
}

fn sq_dist(a: [u8; 4], b: [u8; 4]) -> u32 {
    (0..3)
        .map(|i| {
            let d = i32::from(a[i]) - i32::from(b[i]);
            (d * d) as u32
        })
        .sum()
}

#[cfg(test)]
#[path = "../../tests/unit/gif/quantize.rs"]
mod tests;
