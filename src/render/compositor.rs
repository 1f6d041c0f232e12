use std::sync::Arc;

use crate::assets::decode::PreparedImage;
use crate::assets::store::PreparedBezel;
use crate::foundation::core::{Affine, Canvas};
use crate::foundation::error::{BezelError, BezelResult};
use crate::render::blend::{
    clip_to_rect_in_place, destination_in_in_place, over_at_origin_in_place,
};
use crate::render::frame::FrameRGBA;

/// Borrowed premultiplied RGBA8 raster to place inside a bezel's screen.
#[derive(Clone, Copy, Debug)]
pub struct SourceFrame<'a> {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Premultiplied RGBA8, row-major, tightly packed.
    pub rgba8_premul: &'a [u8],
}

impl<'a> SourceFrame<'a> {
    /// Borrow a premultiplied frame, rejecting straight-alpha input.
    pub fn from_frame(frame: &'a FrameRGBA) -> BezelResult<Self> {
        if !frame.premultiplied {
            return Err(BezelError::data(
                "compositor sources must be premultiplied",
            ));
        }
        Ok(Self {
            width: frame.width,
            height: frame.height,
            rgba8_premul: &frame.data,
        })
    }
}

impl<'a> From<&'a PreparedImage> for SourceFrame<'a> {
    fn from(img: &'a PreparedImage) -> Self {
        Self {
            width: img.width,
            height: img.height,
            rgba8_premul: img.rgba8_premul.as_slice(),
        }
    }
}

/// Places screenshots inside bezels.
///
/// Owns a scratch arena (render context + target pixmap) sized on first use and reset on every
/// call, so per-frame GIF and video compositing does not reallocate.
#[derive(Default)]
pub struct FrameCompositor {
    ctx: Option<vello_cpu::RenderContext>,
    target: Option<vello_cpu::Pixmap>,
    frames_composed: u64,
}

impl std::fmt::Debug for FrameCompositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameCompositor")
            .field("has_ctx", &self.ctx.is_some())
            .field("has_target", &self.target.is_some())
            .field("frames_composed", &self.frames_composed)
            .finish()
    }
}

impl FrameCompositor {
    /// Create a compositor with an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of frames composed so far.
    pub fn frames_composed(&self) -> u64 {
        self.frames_composed
    }

    /// Compose `source` into `bezel`, returning a premultiplied frame at the bezel canvas size.
    pub fn compose(
        &mut self,
        source: SourceFrame<'_>,
        bezel: &PreparedBezel,
    ) -> BezelResult<FrameRGBA> {
        let mut out = FrameRGBA::transparent(bezel.entry.canvas);
        self.compose_into(source, bezel, &mut out)?;
        Ok(out)
    }

    /// Compose into an existing frame, reusing its allocation when the size already matches.
    ///
    /// Steps: cover-fit paint of the source, clip to the screen rectangle, destination-in with
    /// the mask, then the bezel drawn over the result.
    pub fn compose_into(
        &mut self,
        source: SourceFrame<'_>,
        bezel: &PreparedBezel,
        out: &mut FrameRGBA,
    ) -> BezelResult<()> {
        let canvas = bezel.entry.canvas;
        let screen = bezel.entry.screen;
        screen.validate_within(canvas)?;
        if !bezel.mask.matches_geometry(canvas, screen) {
            return Err(BezelError::data("mask was built for a different bezel geometry"));
        }
        let fit = screen.cover_fit(source.width, source.height)?;
        let (w, h) = pixmap_dims(canvas)?;
        let src_pixmap = pixmap_from_premul_bytes(source.rgba8_premul, source.width, source.height)?;
        let paint = vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(src_pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        };

        let mut target = match self.target.take() {
            Some(pm) if pm.width() == w && pm.height() == h => pm,
            _ => vello_cpu::Pixmap::new(w, h),
        };
        target.data_as_u8_slice_mut().fill(0);

        self.with_ctx_mut(w, h, |_, ctx| {
            ctx.set_blend_mode(vello_cpu::peniko::BlendMode::default());
            ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
            ctx.set_transform(affine_to_cpu(fit.to_affine()));
            ctx.set_paint(paint);
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                0.0,
                0.0,
                f64::from(source.width),
                f64::from(source.height),
            ));
            ctx.flush();
            ctx.render_to_pixmap(&mut target);
            Ok(())
        })?;

        out.width = canvas.width;
        out.height = canvas.height;
        out.premultiplied = true;
        out.data.clear();
        out.data.extend_from_slice(target.data_as_u8_slice());
        self.target = Some(target);

        clip_to_rect_in_place(&mut out.data, canvas, screen);
        destination_in_in_place(&mut out.data, &bezel.mask.rgba8_premul)?;
        over_at_origin_in_place(
            &mut out.data,
            canvas,
            bezel.image.rgba8_premul.as_slice(),
            bezel.image.canvas(),
        )?;

        self.frames_composed += 1;
        tracing::trace!(
            frame = self.frames_composed,
            scale = fit.scale,
            "composed frame"
        );
        Ok(())
    }

    fn with_ctx_mut<R>(
        &mut self,
        width: u16,
        height: u16,
        f: impl FnOnce(&mut Self, &mut vello_cpu::RenderContext) -> BezelResult<R>,
    ) -> BezelResult<R> {
        let mut ctx = match self.ctx.take() {
            None => vello_cpu::RenderContext::new(width, height),
            Some(ctx) if ctx.width() == width && ctx.height() == height => ctx,
            Some(_) => vello_cpu::RenderContext::new(width, height),
        };
        ctx.reset();
        let out = f(self, &mut ctx)?;
        self.ctx = Some(ctx);
        Ok(out)
    }
}

fn pixmap_dims(canvas: Canvas) -> BezelResult<(u16, u16)> {
    let w: u16 = canvas
        .width
        .try_into()
        .map_err(|_| BezelError::data("canvas width exceeds u16"))?;
    let h: u16 = canvas
        .height
        .try_into()
        .map_err(|_| BezelError::data("canvas height exceeds u16"))?;
    if w == 0 || h == 0 {
        return Err(BezelError::data("canvas has no area"));
    }
    Ok((w, h))
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn pixmap_from_premul_bytes(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> BezelResult<vello_cpu::Pixmap> {
    let (w, h) = pixmap_dims(Canvas { width, height })?;
    if bytes.len()
        != (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4)
    {
        return Err(BezelError::data("source pixmap byte len mismatch"));
    }
    let mut pixels = Vec::<vello_cpu::peniko::color::PremulRgba8>::with_capacity(
        (width as usize) * (height as usize),
    );
    for px in bytes.chunks_exact(4) {
        pixels.push(vello_cpu::peniko::color::PremulRgba8::from_u8_array([
            px[0], px[1], px[2], px[3],
        ]));
    }
    // Pixmap stores PremulRgba8; our bytes are already premultiplied.
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels, w, h, true,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
