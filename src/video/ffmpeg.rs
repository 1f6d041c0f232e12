use std::io::{Read, Write as _};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc;
use std::thread::JoinHandle;

use crate::assets::media::MediaInfo;
use crate::foundation::core::Fps;
use crate::foundation::error::{BezelError, BezelResult};
use crate::foundation::math::premultiply_rgba8_in_place;
use crate::render::frame::FrameRGBA;
use crate::video::platform::{
    AudioTrack, CapturePlatform, MediaPlayback, MediaRecorder, PlaybackEvent, RecorderConfig,
    VideoHandle,
};

const STDOUT_CHUNK: usize = 64 * 1024;

/// How a container/codec string maps onto `ffmpeg` encoder arguments.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncoderProfile {
    /// Container/codec string.
    pub mime_type: &'static str,
    /// `ffmpeg` muxer name.
    pub muxer: &'static str,
    /// Video encoder.
    pub video_codec: &'static str,
    /// Audio encoder for passthrough tracks.
    pub audio_codec: &'static str,
    /// Extra output arguments.
    pub extra_args: &'static [&'static str],
}

/// Profiles for the supported recording formats.
pub const ENCODER_PROFILES: [EncoderProfile; 3] = [
    EncoderProfile {
        mime_type: "video/mp4;codecs=avc1",
        muxer: "mp4",
        video_codec: "libx264",
        audio_codec: "aac",
        // Streamable mp4 so the muxer can write to a pipe.
        extra_args: &["-movflags", "frag_keyframe+empty_moov"],
    },
    EncoderProfile {
        mime_type: "video/webm;codecs=vp9",
        muxer: "webm",
        video_codec: "libvpx-vp9",
        audio_codec: "libopus",
        extra_args: &["-b:v", "0", "-crf", "32"],
    },
    EncoderProfile {
        mime_type: "video/webm;codecs=vp8",
        muxer: "webm",
        video_codec: "libvpx",
        audio_codec: "libopus",
        extra_args: &["-b:v", "2M"],
    },
];

/// Profile for `mime_type`, if it is one of [`ENCODER_PROFILES`].
pub fn profile_for_mime(mime_type: &str) -> Option<&'static EncoderProfile> {
    ENCODER_PROFILES.iter().find(|p| p.mime_type == mime_type)
}

/// Capture platform backed by the system `ffmpeg`.
#[derive(Clone, Debug)]
pub struct FfmpegPlatform {
    program: String,
    encoders: Option<String>,
}

impl FfmpegPlatform {
    /// Probe `program` once for availability and its encoder list.
    pub fn new(program: impl Into<String>) -> Self {
        let program = program.into();
        let encoders = Command::new(&program)
            .args(["-hide_banner", "-encoders"])
            .stderr(Stdio::null())
            .output()
            .ok()
            .filter(|out| out.status.success())
            .map(|out| String::from_utf8_lossy(&out.stdout).into_owned());
        if encoders.is_none() {
            tracing::warn!(program = %program, "ffmpeg not available; video compositing disabled");
        }
        Self { program, encoders }
    }

    fn has_encoder(&self, name: &str) -> bool {
        self.encoders.as_deref().is_some_and(|list| {
            list.lines()
                .any(|line| line.split_whitespace().nth(1) == Some(name))
        })
    }
}

impl CapturePlatform for FfmpegPlatform {
    fn supports_capture(&self) -> bool {
        self.encoders.is_some()
    }

    fn is_type_supported(&self, mime_type: &str) -> bool {
        profile_for_mime(mime_type).is_some_and(|p| self.has_encoder(p.video_codec))
    }

    fn create_recorder(&self, cfg: RecorderConfig) -> BezelResult<Box<dyn MediaRecorder>> {
        let profile = profile_for_mime(&cfg.mime_type).ok_or_else(|| {
            BezelError::capability(format!("unsupported recording format '{}'", cfg.mime_type))
        })?;
        Ok(Box::new(FfmpegRecorder::new(&self.program, cfg, *profile)?))
    }

    fn open_playback(&self, handle: &VideoHandle, fps: Fps) -> BezelResult<Box<dyn MediaPlayback>> {
        Ok(Box::new(FfmpegPlayback::new(&self.program, handle, fps)?))
    }
}

fn drain_to_end<R: Read + Send + 'static>(mut r: R) -> JoinHandle<std::io::Result<Vec<u8>>> {
    std::thread::spawn(move || {
        let mut bytes = Vec::new();
        r.read_to_end(&mut bytes)?;
        Ok(bytes)
    })
}

fn join_bytes(handle: Option<JoinHandle<std::io::Result<Vec<u8>>>>) -> Vec<u8> {
    handle
        .and_then(|h| h.join().ok())
        .and_then(Result::ok)
        .unwrap_or_default()
}

/// Decodes a source video to premultiplied RGBA frames resampled to the capture rate.
pub struct FfmpegPlayback {
    program: String,
    info: MediaInfo,
    fps: Fps,
    child: Option<Child>,
    frames: Option<mpsc::Receiver<BezelResult<Vec<u8>>>>,
    reader: Option<JoinHandle<()>>,
    stderr_drain: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
    ended: bool,
}

impl FfmpegPlayback {
    /// Prepare playback of `handle`; decoding starts on [`MediaPlayback::play`].
    pub fn new(program: &str, handle: &VideoHandle, fps: Fps) -> BezelResult<Self> {
        if handle.width() == 0 || handle.height() == 0 {
            return Err(BezelError::data("video has no pixel dimensions"));
        }
        Ok(Self {
            program: program.to_string(),
            info: handle.info().clone(),
            fps,
            child: None,
            frames: None,
            reader: None,
            stderr_drain: None,
            ended: false,
        })
    }

    fn frame_len(&self) -> usize {
        (self.info.width as usize) * (self.info.height as usize) * 4
    }

    fn finish_child(&mut self) -> BezelResult<()> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        let status = child
            .wait()
            .map_err(|e| BezelError::io(format!("failed to wait for ffmpeg decoder: {e}")))?;
        if let Some(reader) = self.reader.take() {
            let _ = reader.join();
        }
        let stderr = join_bytes(self.stderr_drain.take());
        if !status.success() {
            return Err(BezelError::io(format!(
                "ffmpeg decoder exited with status {status}: {}",
                String::from_utf8_lossy(&stderr).trim()
            )));
        }
        Ok(())
    }
}

impl MediaPlayback for FfmpegPlayback {
    fn info(&self) -> &MediaInfo {
        &self.info
    }

    fn play(&mut self) -> BezelResult<()> {
        if self.child.is_some() {
            return Ok(());
        }
        let mut child = Command::new(&self.program)
            .args(["-hide_banner", "-loglevel", "error", "-i"])
            .arg(&self.info.source_path)
            .args([
                "-an",
                "-vf",
                &format!("fps={}/{}", self.fps.num, self.fps.den),
                "-f",
                "rawvideo",
                "-pix_fmt",
                "rgba",
                "pipe:1",
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                BezelError::capability(format!(
                    "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
                ))
            })?;

        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| BezelError::io("failed to open ffmpeg stdout (unexpected)"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| BezelError::io("failed to open ffmpeg stderr (unexpected)"))?;

        let frame_len = self.frame_len();
        let (sender, receiver) = mpsc::sync_channel::<BezelResult<Vec<u8>>>(4);
        let reader = std::thread::Builder::new()
            .name("bezelkit-ffmpeg-decoder".to_owned())
            .spawn(move || {
                loop {
                    let mut buffer = vec![0u8; frame_len];
                    let msg = match stdout.read_exact(&mut buffer) {
                        Ok(()) => Ok(buffer),
                        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
                        Err(e) => Err(BezelError::io(format!("failed to read from ffmpeg: {e}"))),
                    };
                    let failed = msg.is_err();
                    if sender.send(msg).is_err() || failed {
                        break;
                    }
                }
            })
            .map_err(|e| BezelError::io(format!("failed to spawn decoder thread: {e}")))?;

        tracing::debug!(path = %self.info.source_path.display(), "started playback");
        self.child = Some(child);
        self.frames = Some(receiver);
        self.reader = Some(reader);
        self.stderr_drain = Some(drain_to_end(stderr));
        Ok(())
    }

    fn audio_tracks(&self) -> Vec<AudioTrack> {
        if self.info.has_audio {
            vec![AudioTrack {
                id: "audio:0".to_string(),
                source: self.info.source_path.clone(),
            }]
        } else {
            Vec::new()
        }
    }

    fn next_frame(&mut self) -> BezelResult<PlaybackEvent> {
        if self.ended {
            return Ok(PlaybackEvent::Ended);
        }
        let frames = self
            .frames
            .as_ref()
            .ok_or_else(|| BezelError::io("playback has not started"))?;
        match frames.recv() {
            Ok(Ok(mut data)) => {
                premultiply_rgba8_in_place(&mut data);
                Ok(PlaybackEvent::Frame(FrameRGBA {
                    width: self.info.width,
                    height: self.info.height,
                    data,
                    premultiplied: true,
                }))
            }
            Ok(Err(e)) => Err(e),
            Err(mpsc::RecvError) => {
                self.ended = true;
                self.frames = None;
                self.finish_child()?;
                Ok(PlaybackEvent::Ended)
            }
        }
    }

    fn release(&mut self) {
        self.frames = None;
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        if let Some(reader) = self.reader.take() {
            let _ = reader.join();
        }
        let _ = join_bytes(self.stderr_drain.take());
    }
}

impl Drop for FfmpegPlayback {
    fn drop(&mut self) {
        self.release();
    }
}

/// Streams composed frames into an `ffmpeg` encoder and collects its output chunks.
pub struct FfmpegRecorder {
    program: String,
    cfg: RecorderConfig,
    profile: EncoderProfile,
    audio: Vec<AudioTrack>,

    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stdout_drain: Option<JoinHandle<std::io::Result<Vec<Vec<u8>>>>>,
    stderr_drain: Option<JoinHandle<std::io::Result<Vec<u8>>>>,

    scratch: Vec<u8>,
}

impl FfmpegRecorder {
    /// Create an idle recorder for `cfg`.
    pub fn new(program: &str, cfg: RecorderConfig, profile: EncoderProfile) -> BezelResult<Self> {
        Fps::new(cfg.fps.num, cfg.fps.den)?;
        if cfg.canvas.width == 0 || cfg.canvas.height == 0 {
            return Err(BezelError::data("recorder canvas must be non-empty"));
        }
        Ok(Self {
            program: program.to_string(),
            scratch: vec![0u8; cfg.canvas.rgba_len()],
            cfg,
            profile,
            audio: Vec::new(),
            child: None,
            stdin: None,
            stdout_drain: None,
            stderr_drain: None,
        })
    }

    /// Full `ffmpeg` argument list for the current configuration.
    pub fn command_args(&self) -> Vec<String> {
        let mut args: Vec<String> = [
            "-hide_banner",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        args.push(format!("{}x{}", self.cfg.canvas.width, self.cfg.canvas.height));
        // For rawvideo input, `-r` before `-i` sets the input frame rate.
        args.push("-r".to_string());
        args.push(format!("{}/{}", self.cfg.fps.num, self.cfg.fps.den));
        args.extend(["-i", "pipe:0"].map(String::from));

        for track in &self.audio {
            args.push("-i".to_string());
            args.push(track.source.display().to_string());
        }
        args.extend(["-map", "0:v:0"].map(String::from));
        for i in 0..self.audio.len() {
            args.push("-map".to_string());
            args.push(format!("{}:a:0?", i + 1));
        }

        // yuv420p needs even dimensions.
        args.extend(
            [
                "-vf",
                "pad=ceil(iw/2)*2:ceil(ih/2)*2",
                "-c:v",
                self.profile.video_codec,
                "-pix_fmt",
                "yuv420p",
            ]
            .map(String::from),
        );
        if self.audio.is_empty() {
            args.push("-an".to_string());
        } else {
            args.extend(["-c:a", self.profile.audio_codec, "-shortest"].map(String::from));
        }
        args.extend(self.profile.extra_args.iter().map(|s| s.to_string()));
        args.extend(["-f", self.profile.muxer, "pipe:1"].map(String::from));
        args
    }

    fn kill(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        if let Some(h) = self.stdout_drain.take() {
            let _ = h.join();
        }
        let _ = join_bytes(self.stderr_drain.take());
    }
}

impl MediaRecorder for FfmpegRecorder {
    fn add_audio_track(&mut self, track: AudioTrack) -> BezelResult<()> {
        if self.child.is_some() {
            return Err(BezelError::io("audio tracks must be attached before recording starts"));
        }
        self.audio.push(track);
        Ok(())
    }

    fn start(&mut self) -> BezelResult<()> {
        if self.child.is_some() {
            return Err(BezelError::io("recorder already started"));
        }
        let args = self.command_args();
        tracing::debug!(program = %self.program, ?args, "spawning ffmpeg encoder");
        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                BezelError::capability(format!(
                    "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
                ))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| BezelError::io("failed to open ffmpeg stdin (unexpected)"))?;
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| BezelError::io("failed to open ffmpeg stdout (unexpected)"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| BezelError::io("failed to open ffmpeg stderr (unexpected)"))?;

        let stdout_drain = std::thread::spawn(move || {
            let mut chunks = Vec::new();
            let mut buf = vec![0u8; STDOUT_CHUNK];
            loop {
                let n = stdout.read(&mut buf)?;
                if n == 0 {
                    break;
                }
                chunks.push(buf[..n].to_vec());
            }
            Ok(chunks)
        });

        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stdout_drain = Some(stdout_drain);
        self.stderr_drain = Some(drain_to_end(stderr));
        Ok(())
    }

    fn write_frame(&mut self, frame: &FrameRGBA) -> BezelResult<()> {
        if frame.width != self.cfg.canvas.width || frame.height != self.cfg.canvas.height {
            return Err(BezelError::data(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, self.cfg.canvas.width, self.cfg.canvas.height
            )));
        }
        let premul = if frame.premultiplied {
            std::borrow::Cow::Borrowed(&frame.data)
        } else {
            std::borrow::Cow::Owned(frame.to_premul_rgba8())
        };
        flatten_premul_over_black(&mut self.scratch, &premul)?;

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(BezelError::io("recorder is not running"));
        };
        stdin
            .write_all(&self.scratch)
            .map_err(|e| BezelError::io(format!("failed to write frame to ffmpeg stdin: {e}")))
    }

    fn stop(&mut self) -> BezelResult<Vec<Vec<u8>>> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| BezelError::io("recorder not started"))?;
        let status = child
            .wait()
            .map_err(|e| BezelError::io(format!("failed to wait for ffmpeg to finish: {e}")))?;
        let chunks = match self.stdout_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| BezelError::io("ffmpeg stdout drain thread panicked"))?
                .map_err(|e| BezelError::io(format!("ffmpeg stdout read failed: {e}")))?,
            None => Vec::new(),
        };
        let stderr = join_bytes(self.stderr_drain.take());
        if !status.success() {
            return Err(BezelError::io(format!(
                "ffmpeg exited with status {status}: {}",
                String::from_utf8_lossy(&stderr).trim()
            )));
        }
        Ok(chunks)
    }

    fn abort(&mut self) {
        self.kill();
    }

    fn stop_tracks(&mut self) {
        drop(self.stdin.take());
        self.audio.clear();
    }
}

impl Drop for FfmpegRecorder {
    fn drop(&mut self) {
        self.kill();
    }
}

/// Flatten premultiplied RGBA8 over opaque black.
fn flatten_premul_over_black(dst: &mut [u8], src_premul: &[u8]) -> BezelResult<()> {
    if dst.len() != src_premul.len() || !dst.len().is_multiple_of(4) {
        return Err(BezelError::data(
            "flatten expects equal-length rgba8 buffers",
        ));
    }
    // Premultiplied color over black is the color itself.
    for (d, s) in dst.chunks_exact_mut(4).zip(src_premul.chunks_exact(4)) {
        d[..3].copy_from_slice(&s[..3]);
        d[3] = 255;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/video/ffmpeg.rs"]
mod tests;
