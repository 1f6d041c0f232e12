use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::assets::cache::{KeyedCache, MemoryCache};
use crate::assets::decode::{PreparedImage, load_image};
use crate::catalog::index::BezelEntry;
use crate::foundation::error::{BezelError, BezelResult};
use crate::mask::engine::{Mask, build_mask};

/// Normalize and validate catalog-relative asset paths.
///
/// The result uses `/` separators, drops `.` segments, and rejects absolute paths or parent
/// traversals (`..`).
pub fn normalize_rel_path(source: &str) -> BezelResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(BezelError::data("bezel asset paths must be relative"));
    }
    if s.is_empty() {
        return Err(BezelError::data("bezel asset path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(BezelError::data("bezel asset paths must not contain '..'"));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(BezelError::data("bezel asset path must contain a file name"));
    }

    Ok(out.join("/"))
}

/// Everything the compositor needs for one bezel.
#[derive(Clone, Debug)]
pub struct PreparedBezel {
    /// Catalog entry (geometry and identity).
    pub entry: BezelEntry,
    /// Decoded bezel raster.
    pub image: Arc<PreparedImage>,
    /// Screen mask built for `entry`'s geometry.
    pub mask: Arc<Mask>,
}

/// Loads bezel rasters from disk and derives their masks, memoizing both by asset path.
pub struct BezelAssets {
    root: PathBuf,
    images: Box<dyn KeyedCache<PreparedImage>>,
    masks: Box<dyn KeyedCache<Mask>>,
}

impl std::fmt::Debug for BezelAssets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BezelAssets")
            .field("root", &self.root)
            .field("images", &self.images.len())
            .field("masks", &self.masks.len())
            .finish()
    }
}

impl BezelAssets {
    /// Store rooted at `root` with fresh in-memory caches.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_caches(
            root,
            Box::new(MemoryCache::new()),
            Box::new(MemoryCache::new()),
        )
    }

    /// Store rooted at `root` using caller-owned caches.
    pub fn with_caches(
        root: impl Into<PathBuf>,
        images: Box<dyn KeyedCache<PreparedImage>>,
        masks: Box<dyn KeyedCache<Mask>>,
    ) -> Self {
        Self {
            root: root.into(),
            images,
            masks,
        }
    }

    /// Directory catalog paths are resolved against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of a catalog asset path.
    pub fn resolve(&self, device_path: &str) -> BezelResult<PathBuf> {
        let norm = normalize_rel_path(device_path)?;
        Ok(self.root.join(Path::new(&norm)))
    }

    /// Decoded bezel raster for `entry`, loaded at most once per path.
    pub fn bezel_image(&mut self, entry: &BezelEntry) -> BezelResult<Arc<PreparedImage>> {
        let path = self.resolve(&entry.device_path)?;
        let image = self
            .images
            .get_or_try_insert_with(&entry.device_path, || load_image(&path))?;
        if image.canvas() != entry.canvas {
            tracing::warn!(
                path = %entry.device_path,
                image_w = image.width,
                image_h = image.height,
                canvas_w = entry.canvas.width,
                canvas_h = entry.canvas.height,
                "bezel raster size differs from catalog canvas"
            );
        }
        Ok(image)
    }

    /// Screen mask for `entry`, built at most once per path and geometry.
    pub fn mask(&mut self, entry: &BezelEntry, image: &PreparedImage) -> BezelResult<Arc<Mask>> {
        if let Some(mask) = self.masks.get(&entry.device_path) {
            if mask.matches_geometry(entry.canvas, entry.screen) {
                tracing::trace!(path = %entry.device_path, "mask cache hit");
                return Ok(mask);
            }
            tracing::debug!(path = %entry.device_path, "cached mask geometry is stale");
        }
        let mask = Arc::new(build_mask(image, entry.canvas, entry.screen)?);
        self.masks.insert(entry.device_path.clone(), mask.clone());
        Ok(mask)
    }

    /// Load the bezel raster and its mask.
    pub fn prepare(&mut self, entry: &BezelEntry) -> BezelResult<PreparedBezel> {
        let image = self.bezel_image(entry)?;
        let mask = self.mask(entry, &image)?;
        Ok(PreparedBezel {
            entry: entry.clone(),
            image,
            mask,
        })
    }

    /// Number of cached bezel rasters and masks.
    pub fn cached_counts(&self) -> (usize, usize) {
        (self.images.len(), self.masks.len())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/store.rs"]
mod tests;
