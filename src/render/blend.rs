use crate::foundation::core::{Canvas, ScreenRect};
use crate::foundation::error::{BezelError, BezelResult};
use crate::foundation::math::mul_div255_u8;

/// Premultiplied RGBA8 pixel.
pub type PremulRgba8 = [u8; 4];

/// Premultiplied source-over.
pub fn over(dst: PremulRgba8, src: PremulRgba8) -> PremulRgba8 {
    match src[3] {
        0 => dst,
        255 => src,
        sa => {
            let inv = 255u16 - u16::from(sa);
            std::array::from_fn(|i| src[i].saturating_add(mul_div255_u8(u16::from(dst[i]), inv)))
        }
    }
}

/// Keep `dst` only where `mask` is opaque: every channel scaled by the mask's alpha.
pub fn destination_in(dst: PremulRgba8, mask_alpha: u8) -> PremulRgba8 {
    match mask_alpha {
        0 => [0; 4],
        255 => dst,
        a => {
            let a = u16::from(a);
            [
                mul_div255_u8(u16::from(dst[0]), a),
                mul_div255_u8(u16::from(dst[1]), a),
                mul_div255_u8(u16::from(dst[2]), a),
                mul_div255_u8(u16::from(dst[3]), a),
            ]
        }
    }
}

/// Apply [`destination_in`] across equal-length buffers, reading alpha from `mask`.
pub fn destination_in_in_place(dst: &mut [u8], mask: &[u8]) -> BezelResult<()> {
    if dst.len() != mask.len() || !dst.len().is_multiple_of(4) {
        return Err(BezelError::data(
            "destination_in expects equal-length rgba8 buffers",
        ));
    }
    for (d, m) in dst.chunks_exact_mut(4).zip(mask.chunks_exact(4)) {
        let out = destination_in([d[0], d[1], d[2], d[3]], m[3]);
        d.copy_from_slice(&out);
    }
    Ok(())
}

/// Draw `src` over `dst` with both anchored at the origin; only the overlap is touched.
pub fn over_at_origin_in_place(
    dst: &mut [u8],
    dst_canvas: Canvas,
    src: &[u8],
    src_canvas: Canvas,
) -> BezelResult<()> {
    if dst.len() != dst_canvas.rgba_len() || src.len() != src_canvas.rgba_len() {
        return Err(BezelError::data(
            "over expects rgba8 buffers matching their dimensions",
        ));
    }
    let w = dst_canvas.width.min(src_canvas.width) as usize;
    let h = dst_canvas.height.min(src_canvas.height) as usize;
    let dst_stride = dst_canvas.width as usize * 4;
    let src_stride = src_canvas.width as usize * 4;
    for y in 0..h {
        let d_row = &mut dst[y * dst_stride..y * dst_stride + w * 4];
        let s_row = &src[y * src_stride..y * src_stride + w * 4];
        for (d, s) in d_row.chunks_exact_mut(4).zip(s_row.chunks_exact(4)) {
            let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]]);
            d.copy_from_slice(&out);
        }
    }
    Ok(())
}

/// Zero every pixel outside `rect`.
pub fn clip_to_rect_in_place(dst: &mut [u8], canvas: Canvas, rect: ScreenRect) {
    let stride = canvas.width as usize * 4;
    let x0 = rect.x.min(canvas.width) as usize * 4;
    let x1 = rect.right().min(canvas.width) as usize * 4;
    for (y, row) in dst.chunks_exact_mut(stride).enumerate() {
        if !rect.contains(rect.x, y as u32) {
            row.fill(0);
            continue;
        }
        row[..x0].fill(0);
        row[x1..].fill(0);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/blend.rs"]
mod tests;
