use crate::foundation::error::{BezelError, BezelResult};

pub use kurbo::{Affine, Vec2};

/// Frames-per-second represented as a rational `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds), must be non-zero.
    pub den: u32,
}

impl Fps {
    /// Create a validated FPS value.
    pub fn new(num: u32, den: u32) -> BezelResult<Self> {
        if den == 0 {
            return Err(BezelError::data("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(BezelError::data("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Convert to floating-point FPS.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }
}

/// Canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Number of bytes of a tightly packed RGBA8 raster of this size.
    pub fn rgba_len(self) -> usize {
        (self.width as usize)
            .saturating_mul(self.height as usize)
            .saturating_mul(4)
    }
}

/// Bezel or screenshot orientation.
///
/// Ordering puts `Portrait` first, which is also the listing order.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum Orientation {
    /// Taller than wide, or square.
    Portrait,
    /// Strictly wider than tall.
    Landscape,
}

impl Orientation {
    /// Orientation of a `width x height` raster. Square rasters are portrait.
    pub fn of_dimensions(width: u32, height: u32) -> Self {
        if width > height {
            Self::Landscape
        } else {
            Self::Portrait
        }
    }

    /// Parse the catalog spelling (`"Portrait"` / `"Landscape"`).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Portrait" => Some(Self::Portrait),
            "Landscape" => Some(Self::Landscape),
            _ => None,
        }
    }

    /// Catalog spelling of this orientation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Portrait => "Portrait",
            Self::Landscape => "Landscape",
        }
    }
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Axis-aligned screen cutout inside a bezel canvas, in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct ScreenRect {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl ScreenRect {
    /// Return `true` when the rectangle has no area.
    pub fn is_degenerate(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Width over height.
    pub fn aspect(self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }

    /// Exclusive right edge.
    pub fn right(self) -> u32 {
        self.x.saturating_add(self.width)
    }

    /// Exclusive bottom edge.
    pub fn bottom(self) -> u32 {
        self.y.saturating_add(self.height)
    }

    /// Return `true` when `(x, y)` lies inside the rectangle.
    pub fn contains(self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Validate the rectangle against the bezel canvas it belongs to.
    ///
    /// A violation is a catalog data error.
    pub fn validate_within(self, canvas: Canvas) -> BezelResult<()> {
        if self.is_degenerate() {
            return Err(BezelError::data(format!(
                "screen rectangle {}x{} has no area",
                self.width, self.height
            )));
        }
        if self.right() > canvas.width || self.bottom() > canvas.height {
            return Err(BezelError::data(format!(
                "screen rectangle ({}, {}, {}x{}) exceeds bezel canvas {}x{}",
                self.x, self.y, self.width, self.height, canvas.width, canvas.height
            )));
        }
        Ok(())
    }

    /// Cover-fit placement of a `src_w x src_h` source centered in this rectangle.
    pub fn cover_fit(self, src_w: u32, src_h: u32) -> BezelResult<CoverFit> {
        if src_w == 0 || src_h == 0 {
            return Err(BezelError::data("source raster has no area"));
        }
        let sx = f64::from(self.width) / f64::from(src_w);
        let sy = f64::from(self.height) / f64::from(src_h);
        let scale = sx.max(sy);
        let target_w = f64::from(src_w) * scale;
        let target_h = f64::from(src_h) * scale;
        Ok(CoverFit {
            scale,
            target_w,
            target_h,
            offset_x: f64::from(self.x) + (f64::from(self.width) - target_w) / 2.0,
            offset_y: f64::from(self.y) + (f64::from(self.height) - target_h) / 2.0,
        })
    }
}

/// Result of [`ScreenRect::cover_fit`]: uniform scale plus centered draw origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoverFit {
    /// Uniform scale factor applied to the source.
    pub scale: f64,
    /// Scaled source width.
    pub target_w: f64,
    /// Scaled source height.
    pub target_h: f64,
    /// Draw origin x in canvas space (may be left of the screen rectangle).
    pub offset_x: f64,
    /// Draw origin y in canvas space (may be above the screen rectangle).
    pub offset_y: f64,
}

impl CoverFit {
    /// Source-to-canvas transform.
    pub fn to_affine(self) -> Affine {
        Affine::translate(Vec2::new(self.offset_x, self.offset_y)) * Affine::scale(self.scale)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
