use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::Context as _;

use crate::foundation::error::{BezelError, BezelResult};

const BLOB_SCHEME: &str = "blob:bezelkit/";

#[derive(Debug, Default)]
struct BlobTable {
    next_id: u64,
    entries: HashMap<u64, Arc<[u8]>>,
}

/// In-memory registry of transient output bytes addressed by `blob:bezelkit/<n>` locators.
///
/// Clones share one table.
#[derive(Clone, Debug, Default)]
pub struct BlobStore {
    inner: Arc<Mutex<BlobTable>>,
}

impl BlobStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> std::sync::MutexGuard<'_, BlobTable> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register `bytes` and return the handle that owns the entry.
    pub fn create(&self, bytes: Arc<[u8]>) -> BlobHandle {
        let mut table = self.table();
        table.next_id += 1;
        let id = table.next_id;
        table.entries.insert(id, bytes);
        tracing::trace!(id, "blob created");
        BlobHandle {
            store: self.clone(),
            id,
            locator: format!("{BLOB_SCHEME}{id}"),
            revoked: false,
        }
    }

    /// Bytes behind a live locator.
    pub fn resolve(&self, locator: &str) -> Option<Arc<[u8]>> {
        let id = locator.strip_prefix(BLOB_SCHEME)?.parse::<u64>().ok()?;
        self.table().entries.get(&id).cloned()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.table().entries.len()
    }

    /// `true` when no entry is live.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn revoke(&self, id: u64) {
        if self.table().entries.remove(&id).is_some() {
            tracing::trace!(id, "blob revoked");
        }
    }
}

/// Owner of one [`BlobStore`] entry. The entry is revoked exactly once, on [`BlobHandle::revoke`]
/// or drop.
#[derive(Debug)]
pub struct BlobHandle {
    store: BlobStore,
    id: u64,
    locator: String,
    revoked: bool,
}

impl BlobHandle {
    /// Locator resolving to this entry while it is live.
    pub fn locator(&self) -> &str {
        &self.locator
    }

    /// Release the entry now.
    pub fn revoke(mut self) {
        self.revoke_once();
    }

    fn revoke_once(&mut self) {
        if !self.revoked {
            self.revoked = true;
            self.store.revoke(self.id);
        }
    }
}

impl Drop for BlobHandle {
    fn drop(&mut self) {
        self.revoke_once();
    }
}

/// A finished composite: locator, mime type, bytes, and the transient resource backing the
/// locator if there is one.
#[derive(Debug)]
pub struct ComposedOutput {
    /// Where the output can be fetched from.
    pub locator: String,
    /// Mime type, e.g. `image/png`.
    pub mime_type: String,
    /// Encoded output.
    pub bytes: Arc<[u8]>,
    transient: Option<BlobHandle>,
}

impl ComposedOutput {
    /// Output registered in `store`; its locator is revoked when the output is released.
    pub fn transient(store: &BlobStore, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        let bytes: Arc<[u8]> = bytes.into();
        let handle = store.create(bytes.clone());
        Self {
            locator: handle.locator().to_string(),
            mime_type: mime_type.into(),
            bytes,
            transient: Some(handle),
        }
    }

    /// Output addressed by a self-contained locator with no resource to release.
    pub fn inline(locator: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            locator: locator.into(),
            mime_type: mime_type.into(),
            bytes: bytes.into(),
            transient: None,
        }
    }

    /// `true` when dropping this output releases a store entry.
    pub fn is_transient(&self) -> bool {
        self.transient.is_some()
    }

    /// Release the transient resource, if any.
    pub fn release(mut self) {
        if let Some(handle) = self.transient.take() {
            handle.revoke();
        }
    }
}

/// Holds the current composed output.
#[derive(Debug, Default)]
pub struct OutputSlot {
    current: Option<ComposedOutput>,
}

impl OutputSlot {
    /// Empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `output`, releasing the previous one after the assignment.
    pub fn replace(&mut self, output: ComposedOutput) {
        if let Some(prev) = self.current.replace(output) {
            prev.release();
        }
    }

    /// Drop the current output, releasing its resource.
    pub fn clear(&mut self) {
        if let Some(prev) = self.current.take() {
            prev.release();
        }
    }

    /// Current output, if any.
    pub fn current(&self) -> Option<&ComposedOutput> {
        self.current.as_ref()
    }
}

/// Create `path`'s parent directory if needed.
pub fn ensure_parent_dir(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Write composed bytes to `path`, refusing to clobber an existing file unless `overwrite`.
pub fn write_output_file(path: &Path, bytes: &[u8], overwrite: bool) -> BezelResult<()> {
    if !overwrite && path.exists() {
        return Err(BezelError::io(format!(
            "output '{}' already exists",
            path.display()
        )));
    }
    ensure_parent_dir(path)?;
    std::fs::write(path, bytes)
        .with_context(|| format!("write output '{}'", path.display()))?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "wrote output");
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/session/output.rs"]
mod tests;
