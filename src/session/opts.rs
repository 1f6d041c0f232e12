use std::path::PathBuf;

use crate::gif::pipeline::GifOpts;
use crate::video::pipeline::VideoOpts;

/// Knobs for a [`ComposeSession`](crate::session::compose::ComposeSession).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionOpts {
    /// Directory catalog asset paths are resolved against.
    pub assets_root: PathBuf,
    /// Animated GIF settings.
    pub gif: GifOpts,
    /// Video capture settings.
    pub video: VideoOpts,
}

impl Default for SessionOpts {
    fn default() -> Self {
        Self {
            assets_root: PathBuf::from("."),
            gif: GifOpts::default(),
            video: VideoOpts::default(),
        }
    }
}

impl SessionOpts {
    /// Defaults rooted at `assets_root`.
    pub fn with_assets_root(assets_root: impl Into<PathBuf>) -> Self {
        Self {
            assets_root: assets_root.into(),
            ..Self::default()
        }
    }
}
