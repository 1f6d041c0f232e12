use super::*;
use crate::gif::decode::read_patches;
use crate::gif::quantize::{apply_palette, build_palette};

fn canvas() -> Canvas {
    Canvas {
        width: 2,
        height: 2,
    }
}

#[test]
fn delay_rounding_and_floor() {
    assert_eq!(delay_to_centis(0), 2);
    assert_eq!(delay_to_centis(20), 2);
    assert_eq!(delay_to_centis(100), 10);
    assert_eq!(delay_to_centis(25), 3);
    assert_eq!(delay_to_centis(u32::MAX), u16::MAX);
}

#[test]
fn frames_and_delays_survive_encoding() {
    let a = [255u8, 0, 0, 255].repeat(4);
    let b = [0u8, 0, 255, 255].repeat(4);
    let palette = build_palette(&[&a, &b], 256).unwrap();
    let frames = vec![
        IndexedFrame {
            indices: apply_palette(&a, &palette),
            delay_ms: 100,
        },
        IndexedFrame {
            indices: apply_palette(&b, &palette),
            delay_ms: 40,
        },
    ];
    let bytes = encode_gif(canvas(), &frames, &palette).unwrap();
    assert!(bytes.starts_with(b"GIF89a"));
    assert!(bytes.windows(11).any(|w| w == b"NETSCAPE2.0"));

    let (c, patches) = read_patches(&bytes).unwrap();
    assert_eq!(c, canvas());
    assert_eq!(patches.len(), 2);
    assert_eq!(patches[0].delay_ms, 100);
    assert_eq!(patches[1].delay_ms, 40);
    assert_eq!(&patches[0].rgba[..4], &[255, 0, 0, 255]);
    assert_eq!(&patches[1].rgba[..4], &[0, 0, 255, 255]);
}

#[test]
fn transparent_index_decodes_as_clear_pixels() {
    let mut px = [0u8, 255, 0, 255].repeat(4);
    px[12..16].copy_from_slice(&[0, 0, 0, 0]);
    let palette = build_palette(&[&px], 256).unwrap();
    assert!(palette.transparent_index().is_some());
    let frames = vec![IndexedFrame {
        indices: apply_palette(&px, &palette),
        delay_ms: 20,
    }];
    let bytes = encode_gif(canvas(), &frames, &palette).unwrap();
    let (_, patches) = read_patches(&bytes).unwrap();
    assert_eq!(patches[0].rgba[15], 0);
    assert_eq!(patches[0].rgba[3], 255);
}

#[test]
fn wrong_index_count_is_rejected() {
    let px = [1u8, 2, 3, 255];
    let palette = build_palette(&[&px], 256).unwrap();
    let frames = vec![IndexedFrame {
        indices: vec![0],
        delay_ms: 20,
    }];
    assert!(encode_gif(canvas(), &frames, &palette).is_err());
    assert!(encode_gif(canvas(), &[], &palette).is_err());
}
