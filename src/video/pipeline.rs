use crate::assets::store::PreparedBezel;
use crate::foundation::core::Fps;
use crate::foundation::error::{BezelError, BezelResult};
use crate::render::compositor::{FrameCompositor, SourceFrame};
use crate::render::frame::FrameRGBA;
use crate::video::abort::AbortSignal;
use crate::video::platform::{
    CapturePlatform, DEFAULT_FORMATS, MediaPlayback, MediaRecorder, PlaybackEvent,
    RecorderConfig, VideoHandle, negotiate_format,
};

/// Video capture knobs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VideoOpts {
    /// Capture frame rate.
    pub fps: Fps,
    /// Container/codec strings in preference order.
    pub formats: Vec<String>,
    /// `ffmpeg` executable used by the native platform.
    pub ffmpeg_program: String,
    /// Overwrite existing output files.
    pub overwrite: bool,
}

impl Default for VideoOpts {
    fn default() -> Self {
        Self {
            fps: Fps { num: 30, den: 1 },
            formats: DEFAULT_FORMATS.iter().map(|s| s.to_string()).collect(),
            ffmpeg_program: "ffmpeg".to_string(),
            overwrite: true,
        }
    }
}

/// Recorded output of a video composite.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComposedVideo {
    /// Recorded container bytes.
    pub bytes: Vec<u8>,
    /// Negotiated container/codec string.
    pub mime_type: String,
    /// Frames rendered into the capture.
    pub frame_count: u64,
    /// Whether source audio was attached.
    pub has_audio: bool,
}

/// Owns the recorder and playback for one capture and releases each exactly once.
///
/// [`CaptureResources::finish`] stops the recorder normally; dropping the guard without finishing
/// aborts the recording instead. Either way tracks are stopped and playback is released.
#[derive(Default)]
pub struct CaptureResources {
    recorder: Option<Box<dyn MediaRecorder>>,
    playback: Option<Box<dyn MediaPlayback>>,
}

impl CaptureResources {
    fn parts(
        &mut self,
    ) -> BezelResult<(&mut Box<dyn MediaPlayback>, &mut Box<dyn MediaRecorder>)> {
        match (self.playback.as_mut(), self.recorder.as_mut()) {
            (Some(p), Some(r)) => Ok((p, r)),
            _ => Err(BezelError::io("capture resources already released")),
        }
    }

    /// Stop recording and release everything, returning the recorded chunks.
    pub fn finish(&mut self) -> BezelResult<Vec<Vec<u8>>> {
        let out = match self.recorder.take() {
            Some(mut rec) => {
                let chunks = rec.stop();
                rec.stop_tracks();
                chunks
            }
            None => Err(BezelError::io("recorder already released")),
        };
        if let Some(mut playback) = self.playback.take() {
            playback.release();
        }
        out
    }
}

impl Drop for CaptureResources {
    fn drop(&mut self) {
        if let Some(mut rec) = self.recorder.take() {
            tracing::debug!("aborting unfinished recording");
            rec.abort();
            rec.stop_tracks();
        }
        if let Some(mut playback) = self.playback.take() {
            playback.release();
        }
    }
}

/// Play `video` through the compositor into a recorder, frame by frame.
///
/// Every exit path (end of playback, playback or recorder error, abort) releases the recorder,
/// its tracks, and the playback before returning.
#[tracing::instrument(skip_all, fields(bezel = %bezel.entry.id(), src_w = video.width(), src_h = video.height()))]
pub fn compose_video(
    platform: &dyn CapturePlatform,
    video: &VideoHandle,
    bezel: &PreparedBezel,
    compositor: &mut FrameCompositor,
    opts: &VideoOpts,
    abort: &AbortSignal,
) -> BezelResult<ComposedVideo> {
    if !platform.supports_capture() {
        return Err(BezelError::capability(
            "video compositing needs a capture stream and a recorder",
        ));
    }
    let fps = Fps::new(opts.fps.num, opts.fps.den)?;
    let mime_type = negotiate_format(platform, opts.formats.as_slice())?;
    abort.check()?;

    let mut res = CaptureResources::default();
    res.playback = Some(platform.open_playback(video, fps)?);
    res.recorder = Some(platform.create_recorder(RecorderConfig {
        canvas: bezel.entry.canvas,
        fps,
        mime_type: mime_type.clone(),
    })?);

    let (playback, recorder) = res.parts()?;
    playback.play()?;
    let tracks = playback.audio_tracks();
    let has_audio = !tracks.is_empty();
    for track in tracks {
        recorder.add_audio_track(track)?;
    }
    recorder.start()?;

    let mut out = FrameRGBA::transparent(bezel.entry.canvas);
    let mut frame_count = 0u64;
    loop {
        abort.check()?;
        match playback.next_frame()? {
            PlaybackEvent::Frame(src) => {
                compositor.compose_into(SourceFrame::from_frame(&src)?, bezel, &mut out)?;
                recorder.write_frame(&out)?;
                frame_count += 1;
            }
            PlaybackEvent::Ended => break,
        }
    }
    if frame_count == 0 {
        return Err(BezelError::data("video produced no frames"));
    }

    let chunks = res.finish()?;
    let bytes = chunks.concat();
    tracing::info!(
        frame_count,
        fps = fps.as_f64(),
        bytes = bytes.len(),
        mime_type = %mime_type,
        "recorded video"
    );
    Ok(ComposedVideo {
        bytes,
        mime_type,
        frame_count,
        has_audio,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/video/pipeline.rs"]
mod tests;
