use std::path::{Path, PathBuf};

use crate::foundation::error::{BezelError, BezelResult};

/// Stream facts about a playable media file.
#[derive(Clone, Debug, PartialEq)]
pub struct MediaInfo {
    /// Source file.
    pub source_path: PathBuf,
    /// Video width in pixels.
    pub width: u32,
    /// Video height in pixels.
    pub height: u32,
    /// Native frame rate numerator (0 when unknown).
    pub fps_num: u32,
    /// Native frame rate denominator.
    pub fps_den: u32,
    /// Container duration in seconds (0 when unknown).
    pub duration_sec: f64,
    /// Whether the container carries at least one audio stream.
    pub has_audio: bool,
}

impl MediaInfo {
    /// Native frame rate as a float, 0 when unknown.
    pub fn source_fps(&self) -> f64 {
        if self.fps_den == 0 {
            0.0
        } else {
            f64::from(self.fps_num) / f64::from(self.fps_den)
        }
    }
}

/// Probe a media file with `ffprobe`.
#[cfg(feature = "media-ffmpeg")]
#[tracing::instrument]
pub fn probe_video(source_path: &Path) -> BezelResult<MediaInfo> {
    let out = std::process::Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(source_path)
        .output()
        .map_err(|e| BezelError::capability(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(BezelError::io(format!(
            "ffprobe failed for '{}': {}",
            source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    parse_probe_json(source_path, &out.stdout)
}

/// Probe a media file with `ffprobe`.
#[cfg(not(feature = "media-ffmpeg"))]
pub fn probe_video(_source_path: &Path) -> BezelResult<MediaInfo> {
    Err(BezelError::capability(
        "video sources require the 'media-ffmpeg' feature",
    ))
}

/// Interpret `ffprobe -print_format json -show_streams -show_format` output.
pub fn parse_probe_json(source_path: &Path, json: &[u8]) -> BezelResult<MediaInfo> {
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
        r_frame_rate: Option<String>,
        #[serde(default)]
        side_data_list: Vec<ProbeSideData>,
        #[serde(default)]
        tags: std::collections::HashMap<String, String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeSideData {
        rotation: Option<f64>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        #[serde(default)]
        streams: Vec<ProbeStream>,
        format: Option<ProbeFormat>,
    }

    let parsed: ProbeOut = serde_json::from_slice(json)
        .map_err(|e| BezelError::serde(format!("ffprobe json parse failed: {e}")))?;
    let video_stream = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| {
            BezelError::data(format!(
                "no video stream found in '{}'",
                source_path.display()
            ))
        })?;
    let (mut width, mut height) = match (video_stream.width, video_stream.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
        _ => return Err(BezelError::data("video stream has no usable dimensions")),
    };
    // ffmpeg autorotates on decode, so report display dimensions.
    let rotation = video_stream
        .side_data_list
        .iter()
        .find_map(|d| d.rotation)
        .or_else(|| video_stream.tags.get("rotate").and_then(|r| r.parse().ok()))
        .unwrap_or(0.0);
    if (rotation.abs().round() as i64) % 180 == 90 {
        std::mem::swap(&mut width, &mut height);
    }
    let (fps_num, fps_den) =
        parse_ff_ratio(video_stream.r_frame_rate.as_deref().unwrap_or("0/1")).unwrap_or((0, 1));
    let duration_sec = parsed
        .format
        .as_ref()
        .and_then(|f| f.duration.as_ref())
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(0.0);
    let has_audio = parsed
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio"));

    Ok(MediaInfo {
        source_path: source_path.to_path_buf(),
        width,
        height,
        fps_num,
        fps_den,
        duration_sec,
        has_audio,
    })
}

fn parse_ff_ratio(s: &str) -> Option<(u32, u32)> {
    let mut parts = s.split('/');
    let a = parts.next()?.parse::<u32>().ok()?;
    let b = parts.next()?.parse::<u32>().ok()?;
    if b == 0 {
        return None;
    }
    Some((a, b))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/media.rs"]
mod tests;
