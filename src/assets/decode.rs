use std::path::Path;
use std::sync::Arc;

use crate::foundation::core::Canvas;
use crate::foundation::error::{BezelError, BezelResult};
use crate::foundation::math::premultiply_rgba8_in_place;

/// Decoded raster in premultiplied RGBA8 form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreparedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Premultiplied RGBA8, row-major, tightly packed.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl PreparedImage {
    /// Wrap straight-alpha RGBA8 pixels, premultiplying them.
    pub fn from_straight_rgba8(width: u32, height: u32, mut rgba: Vec<u8>) -> BezelResult<Self> {
        let canvas = Canvas { width, height };
        if rgba.len() != canvas.rgba_len() {
            return Err(BezelError::data(format!(
                "rgba buffer has {} bytes, expected {} for {width}x{height}",
                rgba.len(),
                canvas.rgba_len()
            )));
        }
        premultiply_rgba8_in_place(&mut rgba);
        Ok(Self {
            width,
            height,
            rgba8_premul: Arc::new(rgba),
        })
    }

    /// Pixel dimensions.
    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }

    /// Alpha of pixel `(x, y)`; pixels outside the raster are transparent.
    pub fn alpha_at(&self, x: u32, y: u32) -> u8 {
        if x >= self.width || y >= self.height {
            return 0;
        }
        let idx = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        self.rgba8_premul[idx + 3]
    }
}

/// Decode any raster format supported by `image` into premultiplied RGBA8.
pub fn decode_image(bytes: &[u8]) -> BezelResult<PreparedImage> {
    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| BezelError::data(format!("failed to decode image: {e}")))?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(BezelError::data("decoded image has no pixels"));
    }
    PreparedImage::from_straight_rgba8(width, height, rgba.into_raw())
}

/// Read and decode an image file.
pub fn load_image(path: &Path) -> BezelResult<PreparedImage> {
    let bytes = std::fs::read(path).map_err(|e| {
        BezelError::io(format!("failed to read image '{}': {e}", path.display()))
    })?;
    decode_image(&bytes)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
