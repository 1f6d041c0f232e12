use super::*;
use crate::catalog::index::BezelEntry;
use crate::foundation::core::{Orientation, ScreenRect};
use crate::foundation::math::mul_div255_u8;
use crate::mask::engine::build_mask;

const FRAME: [u8; 4] = [30, 30, 30, 255];

fn screen() -> ScreenRect {
    ScreenRect {
        x: 4,
        y: 4,
        width: 12,
        height: 16,
    }
}

fn canvas() -> Canvas {
    Canvas {
        width: 20,
        height: 24,
    }
}

/// Opaque frame around a transparent hole equal to `screen()`, with per-pixel overrides.
fn bezel(overrides: &[((u32, u32), [u8; 4])]) -> PreparedBezel {
    let c = canvas();
    let s = screen();
    let mut rgba = Vec::with_capacity(c.rgba_len());
    for y in 0..c.height {
        for x in 0..c.width {
            let px = overrides
                .iter()
                .find(|(p, _)| *p == (x, y))
                .map(|(_, v)| *v)
                .unwrap_or(if s.contains(x, y) { [0; 4] } else { FRAME });
            rgba.extend_from_slice(&px);
        }
    }
    let image = PreparedImage::from_straight_rgba8(c.width, c.height, rgba).unwrap();
    let mask = build_mask(&image, c, s).unwrap();
    PreparedBezel {
        entry: BezelEntry {
            device_path: "Phone/Phone - Black - Portrait.png".to_string(),
            device: "Phone".to_string(),
            color: "Black".to_string(),
            orientation: Orientation::Portrait,
            canvas: c,
            screen: s,
        },
        image: Arc::new(image),
        mask: Arc::new(mask),
    }
}

fn solid(width: u32, height: u32, px: [u8; 4]) -> Vec<u8> {
    px.repeat((width * height) as usize)
}

fn close(a: [u8; 4], b: [u8; 4]) -> bool {
    a.iter().zip(b.iter()).all(|(x, y)| x.abs_diff(*y) <= 1)
}

#[test]
fn solid_shot_fills_screen_and_bezel_occludes() {
    let b = bezel(&[]);
    let red = solid(6, 8, [255, 0, 0, 255]);
    let src = SourceFrame {
        width: 6,
        height: 8,
        rgba8_premul: &red,
    };
    let out = FrameCompositor::new().compose(src, &b).unwrap();
    assert_eq!(out.canvas(), canvas());
    assert!(out.premultiplied);

    for y in 0..24 {
        for x in 0..20 {
            let px = out.pixel(x, y).unwrap();
            if screen().contains(x, y) {
                assert!(close(px, [255, 0, 0, 255]), "screen pixel ({x}, {y}) = {px:?}");
            } else {
                assert_eq!(px, FRAME, "bezel pixel ({x}, {y})");
            }
        }
    }
}

#[test]
fn translucent_bezel_edge_softens_the_shot() {
    let b = bezel(&[((4, 4), [0, 0, 0, 200])]);
    let red = solid(6, 8, [255, 0, 0, 255]);
    let src = SourceFrame {
        width: 6,
        height: 8,
        rgba8_premul: &red,
    };
    let out = FrameCompositor::new().compose(src, &b).unwrap();
    // Mask alpha 255 - 200 = 55 scales the shot, then the bezel edge goes over it.
    let shot = mul_div255_u8(255, 55);
    let under = mul_div255_u8(u16::from(shot), 55);
    let expected = [under, 0, 0, 200 + under];
    let px = out.pixel(4, 4).unwrap();
    assert!(close(px, expected), "edge pixel {px:?} vs {expected:?}");
}

#[test]
fn small_shot_is_upscaled_and_center_cropped() {
    let b = bezel(&[]);
    // Columns: red, red, blue, blue.
    let mut shot = Vec::new();
    for _ in 0..2 {
        shot.extend_from_slice(&[255, 0, 0, 255, 255, 0, 0, 255]);
        shot.extend_from_slice(&[0, 0, 255, 255, 0, 0, 255, 255]);
    }
    let fit = screen().cover_fit(4, 2).unwrap();
    assert!(fit.scale > 1.0);
    assert!(fit.target_w >= 12.0 && fit.target_h >= 16.0);

    let src = SourceFrame {
        width: 4,
        height: 2,
        rgba8_premul: &shot,
    };
    let out = FrameCompositor::new().compose(src, &b).unwrap();
    for y in 4..20 {
        for x in 4..16 {
            assert_eq!(out.pixel(x, y).unwrap()[3], 255, "letterbox gap at ({x}, {y})");
        }
        let left = out.pixel(4, y).unwrap();
        let right = out.pixel(15, y).unwrap();
        assert!(left[0] > 200 && left[2] < 55, "left edge {left:?}");
        assert!(right[2] > 200 && right[0] < 55, "right edge {right:?}");
    }
}

#[test]
fn disconnected_island_stays_transparent() {
    // Opaque pixels at (10, 6) and (12, 6) and (11, 5), (11, 7) wall in a transparent pixel at
    // (11, 6), which is then not reachable from the seed.
    let wall = [200, 200, 200, 255];
    let b = bezel(&[
        ((10, 6), wall),
        ((12, 6), wall),
        ((11, 5), wall),
        ((11, 7), wall),
    ]);
    let red = solid(6, 8, [255, 0, 0, 255]);
    let src = SourceFrame {
        width: 6,
        height: 8,
        rgba8_premul: &red,
    };
    let out = FrameCompositor::new().compose(src, &b).unwrap();
    assert_eq!(out.pixel(11, 6).unwrap(), [0, 0, 0, 0]);
    assert_eq!(out.pixel(10, 6).unwrap(), wall);
}

#[test]
fn compose_is_deterministic_across_arena_reuse() {
    let b = bezel(&[]);
    let shot: Vec<u8> = (0..(7 * 9)).flat_map(|i| [i as u8 * 3, 90, 200, 255]).collect();
    let src = SourceFrame {
        width: 7,
        height: 9,
        rgba8_premul: &shot,
    };
    let mut reused = FrameCompositor::new();
    let a = reused.compose(src, &b).unwrap();
    let mut into = FrameRGBA::transparent(Canvas {
        width: 1,
        height: 1,
    });
    reused.compose_into(src, &b, &mut into).unwrap();
    let fresh = FrameCompositor::new().compose(src, &b).unwrap();
    assert_eq!(a, into);
    assert_eq!(a, fresh);
    assert_eq!(reused.frames_composed(), 2);
}

#[test]
fn stale_mask_geometry_is_rejected() {
    let mut b = bezel(&[]);
    b.entry.screen = ScreenRect {
        x: 5,
        y: 4,
        width: 10,
        height: 16,
    };
    let red = solid(2, 2, [255, 0, 0, 255]);
    let src = SourceFrame {
        width: 2,
        height: 2,
        rgba8_premul: &red,
    };
    let err = FrameCompositor::new().compose(src, &b).unwrap_err();
    assert!(matches!(err, BezelError::Data(_)));
}

#[test]
fn straight_alpha_frames_are_not_sources() {
    let frame = FrameRGBA {
        width: 1,
        height: 1,
        data: vec![1, 2, 3, 4],
        premultiplied: false,
    };
    assert!(SourceFrame::from_frame(&frame).is_err());
}

#[test]
fn empty_source_is_data_error() {
    let b = bezel(&[]);
    let src = SourceFrame {
        width: 0,
        height: 3,
        rgba8_premul: &[],
    };
    assert!(FrameCompositor::new().compose(src, &b).is_err());
}
