use std::io::Cursor;
use std::path::PathBuf;

use super::*;

fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "bezelkit_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

fn png_bytes(w: u32, h: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba([10, 20, 30, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn gif_bytes(w: u16, h: u16, frames: usize) -> Vec<u8> {
    let mut buf = Vec::new();
    {
        let mut enc = gif::Encoder::new(&mut buf, w, h, &[0, 0, 0, 255, 255, 255]).unwrap();
        for i in 0..frames {
            let frame = gif::Frame {
                width: w,
                height: h,
                delay: 0,
                buffer: std::borrow::Cow::Owned(vec![(i % 2) as u8; usize::from(w) * usize::from(h)]),
                ..Default::default()
            };
            enc.write_frame(&frame).unwrap();
        }
    }
    buf
}

#[test]
fn png_bytes_become_image_source() {
    let src = ScreenshotSource::from_bytes(&png_bytes(8, 5), 20).unwrap();
    assert_eq!(src.kind(), SourceKind::Image);
    assert_eq!((src.width(), src.height()), (8, 5));
    assert_eq!(src.orientation(), Orientation::Landscape);
    assert!(src.is_ready());
}

#[test]
fn gif_signature_selects_animation_decoder() {
    let src = ScreenshotSource::from_bytes(&gif_bytes(4, 6, 3), 20).unwrap();
    assert_eq!(src.kind(), SourceKind::Gif);
    assert_eq!((src.width(), src.height()), (4, 6));
    assert_eq!(src.orientation(), Orientation::Portrait);
    match &src {
        ScreenshotSource::GifFrames(gif) => {
            assert_eq!(gif.frames.len(), 3);
            assert!(gif.frames.iter().all(|f| f.delay_ms == 100));
        }
        other => panic!("unexpected source {other:?}"),
    }
}

#[test]
fn undecodable_bytes_are_data_errors() {
    let err = ScreenshotSource::from_bytes(b"definitely not an image", 20).unwrap_err();
    assert!(matches!(err, BezelError::Data(_)));
}

#[test]
fn from_path_sniffs_content_not_extension() {
    let dir = temp_dir("source_sniff");
    std::fs::create_dir_all(&dir).unwrap();
    let misnamed = dir.join("shot.dat");
    std::fs::write(&misnamed, gif_bytes(2, 2, 2)).unwrap();
    let src = ScreenshotSource::from_path(&misnamed, 20).unwrap();
    assert_eq!(src.kind(), SourceKind::Gif);

    let png = dir.join("shot.gif");
    std::fs::write(&png, png_bytes(3, 3)).unwrap();
    let src = ScreenshotSource::from_path(&png, 20).unwrap();
    assert_eq!(src.kind(), SourceKind::Image);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn missing_file_is_io_error() {
    let err = ScreenshotSource::from_path(&temp_dir("source_missing").join("nope.png"), 20)
        .unwrap_err();
    assert!(matches!(err, BezelError::Io(_)));
}

#[test]
fn still_extensions() {
    assert_eq!(SourceKind::Image.still_extension(), Some("png"));
    assert_eq!(SourceKind::Gif.still_extension(), Some("gif"));
    assert_eq!(SourceKind::Video.still_extension(), None);
}
