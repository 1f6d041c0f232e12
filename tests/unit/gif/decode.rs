use std::borrow::Cow;

use super::*;

const PALETTE: [u8; 12] = [0, 0, 0, 255, 0, 0, 0, 255, 0, 0, 0, 255];
const RED: [u8; 4] = [255, 0, 0, 255];
const GREEN: [u8; 4] = [0, 255, 0, 255];
const BLUE: [u8; 4] = [0, 0, 255, 255];

struct RawFrame {
    left: u16,
    indices: Vec<u8>,
    delay_cs: u16,
    dispose: gif::DisposalMethod,
}

fn gif_bytes(width: u16, frames: &[RawFrame]) -> Vec<u8> {
    let mut buf = Vec::new();
    {
        let mut enc = gif::Encoder::new(&mut buf, width, 1, &PALETTE).unwrap();
        for f in frames {
            let frame = gif::Frame {
                left: f.left,
                top: 0,
                width: f.indices.len() as u16,
                height: 1,
                delay: f.delay_cs,
                dispose: f.dispose,
                buffer: Cow::Borrowed(&f.indices),
                ..gif::Frame::default()
            };
            enc.write_frame(&frame).unwrap();
        }
    }
    buf
}

fn px(frame: &DecodedGifFrame, x: u32) -> [u8; 4] {
    frame.frame.pixel(x, 0).unwrap()
}

#[test]
fn restore_to_previous_reproduces_pre_frame_canvas() {
    let bytes = gif_bytes(
        2,
        &[
            RawFrame {
                left: 0,
                indices: vec![1, 1],
                delay_cs: 10,
                dispose: gif::DisposalMethod::Keep,
            },
            RawFrame {
                left: 1,
                indices: vec![2],
                delay_cs: 10,
                dispose: gif::DisposalMethod::Previous,
            },
            RawFrame {
                left: 0,
                indices: vec![3],
                delay_cs: 10,
                dispose: gif::DisposalMethod::Keep,
            },
        ],
    );
    assert!(is_gif(&bytes));
    let decoded = decode_gif(&bytes, 20).unwrap();
    assert_eq!(
        decoded.canvas,
        Canvas {
            width: 2,
            height: 1
        }
    );
    assert_eq!(decoded.frames.len(), 3);
    assert_eq!((px(&decoded.frames[0], 0), px(&decoded.frames[0], 1)), (RED, RED));
    assert_eq!((px(&decoded.frames[1], 0), px(&decoded.frames[1], 1)), (RED, GREEN));
    assert_eq!((px(&decoded.frames[2], 0), px(&decoded.frames[2], 1)), (BLUE, RED));
}

#[test]
fn restore_to_background_clears_the_previous_rect() {
    let bytes = gif_bytes(
        2,
        &[
            RawFrame {
                left: 0,
                indices: vec![1, 1],
                delay_cs: 5,
                dispose: gif::DisposalMethod::Background,
            },
            RawFrame {
                left: 1,
                indices: vec![3],
                delay_cs: 5,
                dispose: gif::DisposalMethod::Keep,
            },
        ],
    );
    let decoded = decode_gif(&bytes, 20).unwrap();
    assert_eq!(px(&decoded.frames[1], 0), [0, 0, 0, 0]);
    assert_eq!(px(&decoded.frames[1], 1), BLUE);
    assert_eq!(decoded.frames[0].delay_ms, 50);
}

#[test]
fn zero_delay_uses_default_frame_time() {
    let bytes = gif_bytes(
        1,
        &[RawFrame {
            left: 0,
            indices: vec![1],
            delay_cs: 0,
            dispose: gif::DisposalMethod::Keep,
        }],
    );
    let decoded = decode_gif(&bytes, 20).unwrap();
    assert_eq!(decoded.frames[0].delay_ms, DEFAULT_FRAME_DELAY_MS);
}

#[test]
fn short_delay_is_clamped_to_minimum() {
    let bytes = gif_bytes(
        1,
        &[RawFrame {
            left: 0,
            indices: vec![2],
            delay_cs: 1,
            dispose: gif::DisposalMethod::Keep,
        }],
    );
    let decoded = decode_gif(&bytes, 20).unwrap();
    assert_eq!(decoded.frames[0].delay_ms, 20);
    assert_eq!(effective_delay_ms(0, 150), 150);
    assert_eq!(effective_delay_ms(40, 20), 40);
}

#[test]
fn zero_area_patch_keeps_disposal_bookkeeping() {
    let canvas = Canvas {
        width: 1,
        height: 1,
    };
    let patch = |rgba: Vec<u8>, width, disposal| GifPatch {
        left: 0,
        top: 0,
        width,
        height: 1,
        rgba,
        delay_ms: 100,
        disposal,
    };
    let frames = reconstruct_frames(
        canvas,
        vec![
            patch(RED.to_vec(), 1, Disposal::Keep),
            patch(Vec::new(), 0, Disposal::Previous),
            patch(GREEN.to_vec(), 1, Disposal::Previous),
            patch(vec![0, 0, 0, 0], 1, Disposal::Keep),
        ],
        20,
    )
    .unwrap();
    assert_eq!(frames.len(), 3);
    assert_eq!(px(&frames[1], 0), GREEN);
    // The green frame restores to the red canvas it was drawn on.
    assert_eq!(px(&frames[2], 0), RED);
}

#[test]
fn gif_without_frames_is_data_error() {
    let bytes = gif_bytes(1, &[]);
    let err = decode_gif(&bytes, 20).unwrap_err();
    assert!(matches!(err, BezelError::Data(_)));
    assert!(!is_gif(b"\x89PNG\r\n"));
}

#[test]
fn garbage_is_data_error() {
    assert!(matches!(
        decode_gif(b"GIF89a garbage", 20).unwrap_err(),
        BezelError::Data(_)
    ));
}
