use std::io::Cursor;

use super::*;
use crate::foundation::core::{Canvas, Orientation, ScreenRect};

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

fn write_bezel_png(path: &Path, w: u32, h: u32, hole: ScreenRect) {
    let img = image::RgbaImage::from_fn(w, h, |x, y| {
        if hole.contains(x, y) {
            image::Rgba([0, 0, 0, 0])
        } else {
            image::Rgba([30, 30, 30, 255])
        }
    });
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, &buf).unwrap();
}

fn entry(path: &str, screen: ScreenRect) -> BezelEntry {
    BezelEntry {
        device_path: path.to_string(),
        device: "Phone".to_string(),
        color: "Black".to_string(),
        orientation: Orientation::Portrait,
        canvas: Canvas {
            width: 10,
            height: 12,
        },
        screen,
    }
}

#[test]
fn normalize_rel_path_rules() {
    assert_eq!(
        normalize_rel_path("./Phone\\Phone - Black - Portrait.png").unwrap(),
        "Phone/Phone - Black - Portrait.png"
    );
    assert!(normalize_rel_path("/abs.png").is_err());
    assert!(normalize_rel_path("a/../b.png").is_err());
    assert!(normalize_rel_path("").is_err());
    assert!(normalize_rel_path("./").is_err());
}

#[test]
fn prepare_loads_image_and_mask_once() {
    let tmp = temp_dir("store_prepare_once");
    let screen = ScreenRect {
        x: 2,
        y: 2,
        width: 6,
        height: 8,
    };
    let rel = "Phone/Phone - Black - Portrait.png";
    write_bezel_png(&tmp.join(rel), 10, 12, screen);

    let mut assets = BezelAssets::new(&tmp);
    let e = entry(rel, screen);
    let a = assets.prepare(&e).unwrap();
    let b = assets.prepare(&e).unwrap();
    assert!(Arc::ptr_eq(&a.image, &b.image));
    assert!(Arc::ptr_eq(&a.mask, &b.mask));
    assert_eq!(assets.cached_counts(), (1, 1));
    assert_eq!(a.mask.alpha_at(4, 4), 255);
    assert_eq!(a.mask.alpha_at(0, 0), 0);

    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn stale_mask_geometry_is_rebuilt() {
    let tmp = temp_dir("store_stale_mask");
    let hole = ScreenRect {
        x: 1,
        y: 1,
        width: 8,
        height: 10,
    };
    let rel = "p.png";
    write_bezel_png(&tmp.join(rel), 10, 12, hole);

    let mut assets = BezelAssets::new(&tmp);
    let first = assets.prepare(&entry(rel, hole)).unwrap();
    let smaller = ScreenRect {
        x: 3,
        y: 3,
        width: 4,
        height: 4,
    };
    let second = assets.prepare(&entry(rel, smaller)).unwrap();
    assert!(!Arc::ptr_eq(&first.mask, &second.mask));
    assert!(second.mask.matches_geometry(second.entry.canvas, smaller));
    assert_eq!(second.mask.alpha_at(1, 1), 0);
    assert_eq!(assets.cached_counts(), (1, 1));

    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn missing_bezel_is_io_error_and_not_cached() {
    let tmp = temp_dir("store_missing");
    let mut assets = BezelAssets::new(&tmp);
    let e = entry(
        "nope.png",
        ScreenRect {
            x: 0,
            y: 0,
            width: 1,
            height: 1,
        },
    );
    let err = assets.prepare(&e).unwrap_err();
    assert!(err.is_transient());
    assert_eq!(assets.cached_counts(), (0, 0));
}

#[test]
fn injected_caches_are_used() {
    let tmp = temp_dir("store_injected");
    let screen = ScreenRect {
        x: 2,
        y: 2,
        width: 6,
        height: 8,
    };
    write_bezel_png(&tmp.join("b.png"), 10, 12, screen);

    let mut images: Box<dyn KeyedCache<PreparedImage>> = Box::new(MemoryCache::new());
    let prepared = crate::assets::decode::load_image(&tmp.join("b.png")).unwrap();
    images.insert("b.png".to_string(), Arc::new(prepared));

    let mut assets = BezelAssets::with_caches(&tmp, images, Box::new(MemoryCache::new()));
    std::fs::remove_dir_all(&tmp).ok();

    // The file is gone; the pre-seeded cache still serves the raster.
    let out = assets.prepare(&entry("b.png", screen)).unwrap();
    assert_eq!(out.image.width, 10);
}
