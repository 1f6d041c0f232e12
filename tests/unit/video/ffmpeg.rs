use std::path::PathBuf;

use super::*;
use crate::foundation::core::Canvas;

fn recorder(mime: &str) -> FfmpegRecorder {
    FfmpegRecorder::new(
        "ffmpeg",
        RecorderConfig {
            canvas: Canvas {
                width: 11,
                height: 20,
            },
            fps: Fps { num: 30, den: 1 },
            mime_type: mime.to_string(),
        },
        *profile_for_mime(mime).unwrap(),
    )
    .unwrap()
}

fn platform_with(encoders: &str) -> FfmpegPlatform {
    FfmpegPlatform {
        program: "ffmpeg".to_string(),
        encoders: Some(encoders.to_string()),
    }
}

#[test]
fn flatten_transparent_becomes_black() {
    let src = vec![0u8, 0, 0, 0];
    let mut dst = vec![7u8; 4];
    flatten_premul_over_black(&mut dst, &src).unwrap();
    assert_eq!(dst, vec![0, 0, 0, 255]);
}

#[test]
fn flatten_opaque_is_identity() {
    let src = vec![1u8, 2, 3, 255, 64, 0, 0, 128];
    let mut dst = vec![0u8; 8];
    flatten_premul_over_black(&mut dst, &src).unwrap();
    assert_eq!(dst, vec![1, 2, 3, 255, 64, 0, 0, 255]);
    assert!(flatten_premul_over_black(&mut dst, &src[..4]).is_err());
}

#[test]
fn profiles_cover_default_formats() {
    for mime in crate::video::platform::DEFAULT_FORMATS {
        assert!(profile_for_mime(mime).is_some(), "{mime}");
    }
    assert!(profile_for_mime("video/x-matroska").is_none());
}

#[test]
fn encoder_listing_drives_type_support() {
    let listing = " V....D libx264              libx264 H.264 / AVC\n V....D libvpx               libvpx VP8\n A....D aac                  AAC\n";
    let p = platform_with(listing);
    assert!(p.supports_capture());
    assert!(p.is_type_supported("video/mp4;codecs=avc1"));
    assert!(!p.is_type_supported("video/webm;codecs=vp9"));
    assert!(p.is_type_supported("video/webm;codecs=vp8"));

    let none = FfmpegPlatform {
        program: "ffmpeg".to_string(),
        encoders: None,
    };
    assert!(!none.supports_capture());
    assert!(!none.is_type_supported("video/mp4;codecs=avc1"));
}

#[test]
fn mp4_args_stream_fragmented_mp4_with_audio() {
    let mut rec = recorder("video/mp4;codecs=avc1");
    rec.add_audio_track(AudioTrack {
        id: "audio:0".to_string(),
        source: PathBuf::from("shot.mov"),
    })
    .unwrap();
    let args = rec.command_args().join(" ");
    assert!(args.contains("-s 11x20 -r 30/1 -i pipe:0 -i shot.mov"));
    assert!(args.contains("-map 0:v:0 -map 1:a:0?"));
    assert!(args.contains("pad=ceil(iw/2)*2:ceil(ih/2)*2"));
    assert!(args.contains("-c:v libx264"));
    assert!(args.contains("-c:a aac -shortest"));
    assert!(args.contains("frag_keyframe+empty_moov"));
    assert!(args.ends_with("-f mp4 pipe:1"));
}

#[test]
fn webm_args_without_audio() {
    let rec = recorder("video/webm;codecs=vp9");
    let args = rec.command_args();
    assert!(args.contains(&"-an".to_string()));
    assert!(args.contains(&"libvpx-vp9".to_string()));
    assert_eq!(args.last().map(String::as_str), Some("pipe:1"));
}

#[test]
fn write_before_start_fails() {
    let mut rec = recorder("video/mp4;codecs=avc1");
    let frame = FrameRGBA::transparent(Canvas {
        width: 11,
        height: 20,
    });
    assert!(rec.write_frame(&frame).is_err());
    let wrong = FrameRGBA::transparent(Canvas {
        width: 2,
        height: 2,
    });
    assert!(matches!(
        rec.write_frame(&wrong).unwrap_err(),
        BezelError::Data(_)
    ));
}

#[test]
fn playback_requires_play_before_frames() {
    let handle = VideoHandle::from_info(MediaInfo {
        source_path: PathBuf::from("missing.mp4"),
        width: 4,
        height: 4,
        fps_num: 30,
        fps_den: 1,
        duration_sec: 1.0,
        has_audio: false,
    });
    let mut playback = FfmpegPlayback::new("ffmpeg", &handle, Fps { num: 30, den: 1 }).unwrap();
    assert!(playback.next_frame().is_err());
    assert!(playback.audio_tracks().is_empty());
    playback.release();
    playback.release();
}
