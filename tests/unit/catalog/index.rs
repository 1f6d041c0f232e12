use super::*;

fn meta(width: u32, height: u32, sw: u32, sh: u32) -> BezelMeta {
    BezelMeta {
        width,
        height,
        screen: ScreenRect {
            x: 10,
            y: 10,
            width: sw,
            height: sh,
        },
    }
}

#[test]
fn parse_path_splits_device_color_orientation() {
    let parsed = parse_bezel_path("bezels/iPhone 15/iPhone 15 - Black - Portrait.png").unwrap();
    assert_eq!(
        parsed,
        ("iPhone 15".to_string(), "Black".to_string(), Orientation::Portrait)
    );
}

#[test]
fn parse_path_rejoins_device_names_containing_separator() {
    let parsed =
        parse_bezel_path("bezels/Pixel - Fold/Pixel - Fold - Obsidian - Landscape.png").unwrap();
    assert_eq!(parsed.0, "Pixel - Fold");
    assert_eq!(parsed.1, "Obsidian");
    assert_eq!(parsed.2, Orientation::Landscape);
}

#[test]
fn parse_path_skips_short_or_unknown_rows() {
    assert!(parse_bezel_path("bezels/x/Black - Portrait.png").is_none());
    assert!(parse_bezel_path("bezels/x/x - Black - Sideways.png").is_none());
}

#[test]
fn index_groups_and_orders_entries() {
    let idx = CatalogIndex::from_rows([
        ("b/Zeta/Zeta - Red - Landscape.png", meta(300, 200, 280, 180)),
        ("b/Zeta/Zeta - Red - Portrait.png", meta(200, 300, 180, 280)),
        ("b/Alpha/Alpha - Blue - Portrait.png", meta(200, 300, 180, 280)),
        ("b/broken.png", meta(1, 1, 1, 1)),
    ]);

    assert_eq!(idx.len(), 3);
    assert_eq!(idx.devices().collect::<Vec<_>>(), vec!["Alpha", "Zeta"]);
    assert_eq!(idx.colors("Zeta").collect::<Vec<_>>(), vec!["Red"]);
    assert_eq!(
        idx.orientations("Zeta", "Red").collect::<Vec<_>>(),
        vec![Orientation::Portrait, Orientation::Landscape]
    );

    let e = idx.get("Zeta", "Red", Orientation::Landscape).unwrap();
    assert_eq!(e.device_path, "b/Zeta/Zeta - Red - Landscape.png");
    assert_eq!(e.canvas, Canvas { width: 300, height: 200 });

    assert_eq!(
        idx.default_selection(),
        Some(BezelId::new("Alpha", "Blue", Orientation::Portrait))
    );
}

#[test]
fn json_table_skips_malformed_values() {
    let json = br#"{
        "b/A/A - Black - Portrait.png": {"width": 100, "height": 200, "screen": {"x": 5, "y": 5, "width": 90, "height": 190}},
        "b/A/A - White - Portrait.png": {"width": 100},
        "b/A/nope.png": {"width": 1, "height": 1, "screen": {"x": 0, "y": 0, "width": 1, "height": 1}}
    }"#;
    let idx = CatalogIndex::from_json_slice(json).unwrap();
    assert_eq!(idx.len(), 1);
    assert!(idx.get("A", "Black", Orientation::Portrait).is_some());
}

#[test]
fn json_table_rejects_non_object() {
    let err = CatalogIndex::from_json_slice(b"[1, 2]").unwrap_err();
    assert!(err.to_string().contains("serialization error:"));
}

#[test]
fn safe_file_stem_collapses_whitespace() {
    let id = BezelId::new("iPhone 15  Pro", "Natural Titanium", Orientation::Portrait);
    assert_eq!(id.safe_file_stem(), "iPhone-15-Pro-Natural-Titanium-Portrait");
}
