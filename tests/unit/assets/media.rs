use super::*;

#[test]
fn probe_json_with_audio() {
    let json = br#"{
        "streams": [
            {"codec_type": "video", "width": 886, "height": 1920, "r_frame_rate": "60000/1001"},
            {"codec_type": "audio"}
        ],
        "format": {"duration": "12.480000"}
    }"#;
    let info = parse_probe_json(Path::new("rec.mov"), json).unwrap();
    assert_eq!((info.width, info.height), (886, 1920));
    assert_eq!((info.fps_num, info.fps_den), (60000, 1001));
    assert!((info.source_fps() - 59.94).abs() < 0.01);
    assert!((info.duration_sec - 12.48).abs() < 1e-9);
    assert!(info.has_audio);
}

#[test]
fn probe_json_without_video_is_data_error() {
    let json = br#"{"streams": [{"codec_type": "audio"}], "format": {}}"#;
    let err = parse_probe_json(Path::new("a.m4a"), json).unwrap_err();
    assert!(matches!(err, BezelError::Data(_)));
}

#[test]
fn probe_json_tolerates_missing_rate_and_duration() {
    let json = br#"{"streams": [{"codec_type": "video", "width": 2, "height": 4}]}"#;
    let info = parse_probe_json(Path::new("v.webm"), json).unwrap();
    assert_eq!(info.source_fps(), 0.0);
    assert_eq!(info.duration_sec, 0.0);
    assert!(!info.has_audio);
}

#[test]
fn malformed_probe_output_is_serde_error() {
    let err = parse_probe_json(Path::new("v.mp4"), b"not json").unwrap_err();
    assert!(matches!(err, BezelError::Serde(_)));
}

#[test]
fn rotated_stream_reports_display_dimensions() {
    let json = br#"{"streams": [{"codec_type": "video", "width": 1920, "height": 886,
        "side_data_list": [{"side_data_type": "Display Matrix", "rotation": -90}]}]}"#;
    let info = parse_probe_json(Path::new("r.mov"), json).unwrap();
    assert_eq!((info.width, info.height), (886, 1920));

    let legacy = br#"{"streams": [{"codec_type": "video", "width": 1920, "height": 886,
        "tags": {"rotate": "270"}}]}"#;
    let info = parse_probe_json(Path::new("r.mp4"), legacy).unwrap();
    assert_eq!((info.width, info.height), (886, 1920));
}
