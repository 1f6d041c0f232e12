use std::path::Path;

use crate::assets::store::BezelAssets;
use crate::catalog::index::{BezelEntry, BezelId, CatalogIndex};
use crate::catalog::matcher::find_best_match;
use crate::foundation::core::Orientation;
use crate::foundation::error::{BezelError, BezelResult};
use crate::gif::pipeline::compose_gif;
use crate::render::compositor::{FrameCompositor, SourceFrame};
use crate::render::frame::FrameRGBA;
use crate::session::opts::SessionOpts;
use crate::session::output::{BlobStore, ComposedOutput, OutputSlot};
use crate::session::source::{ScreenshotSource, SourceKind};
use crate::video::abort::AbortSignal;
use crate::video::pipeline::compose_video;
use crate::video::platform::{CapturePlatform, extension_for_mime};

/// Screenshot and bezel orientations disagree; the shot is center-cropped to fill the screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OrientationNotice {
    /// Orientation of the loaded screenshot.
    pub screenshot: Orientation,
    /// Orientation of the selected bezel.
    pub bezel: Orientation,
}

impl std::fmt::Display for OrientationNotice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "screenshot is {} but the bezel is {}; it will be center-cropped to fill the screen",
            self.screenshot, self.bezel
        )
    }
}

/// What changed when a screenshot was loaded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceUpdate {
    /// Kind of the new screenshot.
    pub kind: SourceKind,
    /// Screenshot width.
    pub width: u32,
    /// Screenshot height.
    pub height: u32,
    /// Bezel picked by auto-match, if the catalog had any candidate.
    pub auto_selected: Option<BezelId>,
    /// Orientation mismatch against the selected bezel.
    pub notice: Option<OrientationNotice>,
}

/// Summary of a successful compose.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComposeReport {
    /// Kind of screenshot that was composed.
    pub kind: SourceKind,
    /// Bezel used.
    pub bezel: BezelId,
    /// Output mime type.
    pub mime_type: String,
    /// Locator of the new output.
    pub locator: String,
    /// Suggested download file name.
    pub file_name: String,
    /// Frames composed into the output.
    pub frame_count: u64,
}

/// Host context tying the catalog, caches, compositor and output slot together.
///
/// At most one compose runs at a time; every method takes `&mut self`. A failed compose leaves the
/// previous output and the current screenshot untouched.
pub struct ComposeSession {
    catalog: CatalogIndex,
    assets: BezelAssets,
    compositor: FrameCompositor,
    opts: SessionOpts,

    selection: Option<BezelId>,
    source: Option<ScreenshotSource>,
    output: OutputSlot,
    blobs: BlobStore,
    preview: Option<FrameRGBA>,

    platform: Option<Box<dyn CapturePlatform>>,
    abort: AbortSignal,
}

impl std::fmt::Debug for ComposeSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComposeSession")
            .field("entries", &self.catalog.len())
            .field("selection", &self.selection)
            .field("source", &self.source.as_ref().map(ScreenshotSource::kind))
            .field("output", &self.output.current().map(|o| &o.locator))
            .field("platform", &self.platform.is_some())
            .finish()
    }
}

impl ComposeSession {
    /// Session over `catalog`, preselecting its first bezel.
    pub fn new(catalog: CatalogIndex, opts: SessionOpts) -> Self {
        let assets = BezelAssets::new(opts.assets_root.clone());
        Self::with_assets(catalog, assets, opts)
    }

    /// Session using a caller-built asset store.
    pub fn with_assets(catalog: CatalogIndex, assets: BezelAssets, opts: SessionOpts) -> Self {
        let selection = catalog.default_selection();
        Self {
            catalog,
            assets,
            compositor: FrameCompositor::new(),
            opts,
            selection,
            source: None,
            output: OutputSlot::new(),
            blobs: BlobStore::new(),
            preview: None,
            platform: None,
            abort: AbortSignal::new(),
        }
    }

    /// Enable video compositing through `platform`.
    pub fn set_platform(&mut self, platform: Box<dyn CapturePlatform>) {
        self.platform = Some(platform);
    }

    /// Enable video compositing through the system `ffmpeg` named in the video options.
    #[cfg(feature = "media-ffmpeg")]
    pub fn use_ffmpeg(&mut self) {
        let platform =
            crate::video::ffmpeg::FfmpegPlatform::new(self.opts.video.ffmpeg_program.clone());
        self.platform = Some(Box::new(platform));
    }

    /// Bezel catalog.
    pub fn catalog(&self) -> &CatalogIndex {
        &self.catalog
    }

    /// Session options.
    pub fn opts(&self) -> &SessionOpts {
        &self.opts
    }

    /// Current bezel selection.
    pub fn selection(&self) -> Option<&BezelId> {
        self.selection.as_ref()
    }

    /// Catalog entry of the current selection.
    pub fn selected_entry(&self) -> Option<&BezelEntry> {
        self.selection.as_ref().and_then(|id| self.catalog.lookup(id))
    }

    /// Current screenshot.
    pub fn source(&self) -> Option<&ScreenshotSource> {
        self.source.as_ref()
    }

    /// Current composed output.
    pub fn output(&self) -> Option<&ComposedOutput> {
        self.output.current()
    }

    /// Last composed still raster (straight alpha).
    pub fn preview(&self) -> Option<&FrameRGBA> {
        self.preview.as_ref()
    }

    /// Store backing transient output locators.
    pub fn blobs(&self) -> &BlobStore {
        &self.blobs
    }

    /// Signal that cancels a running or upcoming video compose.
    pub fn abort_signal(&self) -> AbortSignal {
        self.abort.clone()
    }

    /// Cached bezel rasters and masks.
    pub fn cached_counts(&self) -> (usize, usize) {
        self.assets.cached_counts()
    }

    /// `true` when both a bezel and a ready screenshot are present.
    pub fn is_ready(&self) -> bool {
        self.selected_entry().is_some() && self.source.as_ref().is_some_and(ScreenshotSource::is_ready)
    }

    /// Select a bezel by identity. Unknown ids are data errors and keep the old selection.
    pub fn select(&mut self, id: BezelId) -> BezelResult<&BezelEntry> {
        if self.catalog.lookup(&id).is_none() {
            return Err(BezelError::data(format!("no bezel '{id}' in the catalog")));
        }
        tracing::debug!(bezel = %id, "bezel selected");
        self.selection = Some(id);
        self.selected_entry()
            .ok_or_else(|| BezelError::data("selected bezel vanished from the catalog"))
    }

    /// Read and install a screenshot from `path`.
    ///
    /// Load failures leave the current screenshot and output in place.
    pub fn load_source(&mut self, path: &Path) -> BezelResult<SourceUpdate> {
        let source = ScreenshotSource::from_path(path, self.opts.gif.min_delay_ms)?;
        Ok(self.set_source(source))
    }

    /// Decode and install a screenshot from in-memory bytes (still image or GIF).
    pub fn load_source_bytes(&mut self, bytes: &[u8]) -> BezelResult<SourceUpdate> {
        let source = ScreenshotSource::from_bytes(bytes, self.opts.gif.min_delay_ms)?;
        Ok(self.set_source(source))
    }

    /// Install `source`, discarding the previous output and auto-selecting the best-fitting bezel.
    pub fn set_source(&mut self, source: ScreenshotSource) -> SourceUpdate {
        self.output.clear();
        self.preview = None;

        let (width, height) = (source.width(), source.height());
        let auto_selected = find_best_match(&self.catalog, width, height, self.selection.as_ref());
        if let Some(id) = &auto_selected {
            self.selection = Some(id.clone());
        }

        let screenshot = source.orientation();
        let notice = self
            .selected_entry()
            .filter(|entry| entry.orientation != screenshot)
            .map(|entry| OrientationNotice {
                screenshot,
                bezel: entry.orientation,
            });
        if let Some(n) = &notice {
            tracing::debug!("{n}");
        }

        let kind = source.kind();
        self.source = Some(source);
        SourceUpdate {
            kind,
            width,
            height,
            auto_selected,
            notice,
        }
    }

    /// Drop the screenshot and its output.
    pub fn clear_source(&mut self) {
        self.source = None;
        self.output.clear();
        self.preview = None;
    }

    /// Compose the current screenshot into the selected bezel and install the result.
    #[tracing::instrument(skip(self), fields(bezel = ?self.selection))]
    pub fn compose(&mut self) -> BezelResult<ComposeReport> {
        let entry = self.selected_entry().cloned();
        let ready_source = self.source.as_ref().filter(|s| s.is_ready());
        let (Some(entry), Some(source)) = (entry, ready_source) else {
            return Err(BezelError::data("bezel and screenshot must both be selected"));
        };
        let bezel = self.assets.prepare(&entry)?;
        let stem = entry.id().safe_file_stem();

        let (output, frame_count, preview) = match source {
            ScreenshotSource::Image(img) => {
                let frame = self.compositor.compose(SourceFrame::from(img.as_ref()), &bezel)?;
                let png = frame.encode_png()?;
                let preview = FrameRGBA {
                    width: frame.width,
                    height: frame.height,
                    data: frame.to_straight_rgba8(),
                    premultiplied: false,
                };
                let locator = format!("inline:{}", download_name(&stem, "png"));
                (ComposedOutput::inline(locator, "image/png", png), 1, Some(preview))
            }
            ScreenshotSource::GifFrames(gif) => {
                let composed = compose_gif(gif, &bezel, &mut self.compositor, &self.opts.gif)?;
                let output = ComposedOutput::transient(&self.blobs, "image/gif", composed.bytes);
                (output, composed.frame_count as u64, Some(composed.preview))
            }
            ScreenshotSource::Video(handle) => {
                let platform = self.platform.as_deref().ok_or_else(|| {
                    BezelError::capability("video compositing needs a capture platform")
                })?;
                let result = compose_video(
                    platform,
                    handle,
                    &bezel,
                    &mut self.compositor,
                    &self.opts.video,
                    &self.abort,
                );
                self.abort.reset();
                let video = result?;
                let output = ComposedOutput::transient(&self.blobs, video.mime_type, video.bytes);
                (output, video.frame_count, None)
            }
        };

        let kind = source.kind();
        let ext = match kind.still_extension() {
            Some(ext) => ext,
            None => extension_for_mime(&output.mime_type),
        };
        let report = ComposeReport {
            kind,
            bezel: entry.id(),
            mime_type: output.mime_type.clone(),
            locator: output.locator.clone(),
            file_name: download_name(&stem, ext),
            frame_count,
        };
        self.output.replace(output);
        self.preview = preview;
        tracing::info!(
            locator = %report.locator,
            frames = report.frame_count,
            mime = %report.mime_type,
            "composed"
        );
        Ok(report)
    }
}

/// `screenshot-<stem>.<ext>`.
pub fn download_name(stem: &str, ext: &str) -> String {
    format!("screenshot-{stem}.{ext}")
}

#[cfg(test)]
#[path = "../../tests/unit/session/compose.rs"]
mod tests;
