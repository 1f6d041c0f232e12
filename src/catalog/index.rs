use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context as _;

use crate::foundation::core::{Canvas, Orientation, ScreenRect};
use crate::foundation::error::{BezelError, BezelResult};

/// One row of the flat bezel metadata table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BezelMeta {
    /// Bezel canvas width in pixels.
    pub width: u32,
    /// Bezel canvas height in pixels.
    pub height: u32,
    /// Transparent screen cutout.
    pub screen: ScreenRect,
}

/// Identity of a bezel: `(device, color, orientation)`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BezelId {
    /// Device name, e.g. `"iPhone 15 Pro"`.
    pub device: String,
    /// Color name, e.g. `"Natural Titanium"`.
    pub color: String,
    /// Bezel orientation.
    pub orientation: Orientation,
}

impl BezelId {
    /// Build an id from borrowed parts.
    pub fn new(device: impl Into<String>, color: impl Into<String>, orientation: Orientation) -> Self {
        Self {
            device: device.into(),
            color: color.into(),
            orientation,
        }
    }

    /// File-name friendly form: `"<device> <color> <orientation>"` with whitespace runs
    /// collapsed into `-`.
    pub fn safe_file_stem(&self) -> String {
        let joined = format!("{} {} {}", self.device, self.color, self.orientation);
        joined.split_whitespace().collect::<Vec<_>>().join("-")
    }
}

impl std::fmt::Display for BezelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} · {} · {}", self.device, self.color, self.orientation)
    }
}

/// Immutable catalog entry for one bezel asset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BezelEntry {
    /// Asset path exactly as it appears in the metadata table.
    pub device_path: String,
    /// Device name.
    pub device: String,
    /// Color name.
    pub color: String,
    /// Bezel orientation.
    pub orientation: Orientation,
    /// Bezel canvas size.
    pub canvas: Canvas,
    /// Screen cutout inside the canvas.
    pub screen: ScreenRect,
}

impl BezelEntry {
    /// Identity triple of this entry.
    pub fn id(&self) -> BezelId {
        BezelId::new(self.device.clone(), self.color.clone(), self.orientation)
    }
}

/// Parse `.../<device>/<device> - <color> - <orientation>.<ext>` into its parts.
///
/// The file name (without extension) is split on `" - "`: the last token is the orientation, the
/// one before it the color, and the remaining tokens re-joined form the device name. Returns
/// `None` for paths that do not yield at least three tokens or name an unknown orientation.
pub fn parse_bezel_path(path: &str) -> Option<(String, String, Orientation)> {
    let file_name = path.rsplit(['/', '\\']).next()?;
    let stem = match file_name.rfind('.') {
        Some(dot) if dot > 0 => &file_name[..dot],
        _ => file_name,
    };

    let mut parts: Vec<&str> = stem.split(" - ").collect();
    if parts.len() < 3 {
        return None;
    }
    let orientation = Orientation::parse(parts.pop()?)?;
    let color = parts.pop()?.to_string();
    let device = parts.join(" - ");
    Some((device, color, orientation))
}

/// Three-level lookup `device -> color -> orientation -> BezelEntry`.
///
/// Built once from the flat metadata table, read-only afterwards. Devices and colors iterate in
/// lexicographic order, orientations portrait-first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CatalogIndex {
    devices: BTreeMap<String, BTreeMap<String, BTreeMap<Orientation, BezelEntry>>>,
}

impl CatalogIndex {
    /// Build the index from `(asset path, metadata)` rows.
    ///
    /// Rows whose path does not parse are dropped without error.
    pub fn from_rows<'a>(rows: impl IntoIterator<Item = (&'a str, BezelMeta)>) -> Self {
        let mut devices: BTreeMap<String, BTreeMap<String, BTreeMap<Orientation, BezelEntry>>> =
            BTreeMap::new();
        for (path, meta) in rows {
            let Some((device, color, orientation)) = parse_bezel_path(path) else {
                tracing::warn!(path, "skipping catalog row with unparseable path");
                continue;
            };
            let entry = BezelEntry {
                device_path: path.to_string(),
                device: device.clone(),
                color: color.clone(),
                orientation,
                canvas: Canvas {
                    width: meta.width,
                    height: meta.height,
                },
                screen: meta.screen,
            };
            devices
                .entry(device)
                .or_default()
                .entry(color)
                .or_default()
                .insert(orientation, entry);
        }
        Self { devices }
    }

    /// Parse the JSON metadata table (`{ "<path>": {width, height, screen}, ... }`).
    ///
    /// Rows whose value does not match the metadata shape are skipped like malformed paths.
    pub fn from_json_slice(bytes: &[u8]) -> BezelResult<Self> {
        let raw: BTreeMap<String, serde_json::Value> = serde_json::from_slice(bytes)
            .map_err(|e| BezelError::serde(format!("catalog json parse failed: {e}")))?;

        let mut rows = Vec::with_capacity(raw.len());
        for (path, value) in &raw {
            match serde_json::from_value::<BezelMeta>(value.clone()) {
                Ok(meta) => rows.push((path.as_str(), meta)),
                Err(e) => tracing::warn!(path = %path, error = %e, "skipping malformed catalog row"),
            }
        }
        Ok(Self::from_rows(rows))
    }

    /// Read and parse a JSON metadata table from disk.
    pub fn from_path(path: &Path) -> BezelResult<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("read catalog '{}'", path.display()))?;
        Self::from_json_slice(&bytes)
    }

    /// Total number of entries.
    pub fn len(&self) -> usize {
        self.entries().count()
    }

    /// Return `true` when the index holds no entries.
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Device names in listing order.
    pub fn devices(&self) -> impl Iterator<Item = &str> {
        self.devices.keys().map(String::as_str)
    }

    /// Color names for `device` in listing order.
    pub fn colors<'a>(&'a self, device: &str) -> impl Iterator<Item = &'a str> + 'a {
        self.devices
            .get(device)
            .into_iter()
            .flat_map(|colors| colors.keys().map(String::as_str))
    }

    /// Orientations available for `device`/`color`, portrait first.
    pub fn orientations<'a>(
        &'a self,
        device: &str,
        color: &str,
    ) -> impl Iterator<Item = Orientation> + 'a {
        self.devices
            .get(device)
            .and_then(|colors| colors.get(color))
            .into_iter()
            .flat_map(|orientations| orientations.keys().copied())
    }

    /// Look up one entry.
    pub fn get(&self, device: &str, color: &str, orientation: Orientation) -> Option<&BezelEntry> {
        self.devices.get(device)?.get(color)?.get(&orientation)
    }

    /// Look up one entry by identity.
    pub fn lookup(&self, id: &BezelId) -> Option<&BezelEntry> {
        self.get(&id.device, &id.color, id.orientation)
    }

    /// All entries in listing order.
    pub fn entries(&self) -> impl Iterator<Item = &BezelEntry> {
        self.devices
            .values()
            .flat_map(|colors| colors.values())
            .flat_map(|orientations| orientations.values())
    }

    /// First device, its first color and that color's first orientation.
    pub fn default_selection(&self) -> Option<BezelId> {
        self.entries().next().map(BezelEntry::id)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/catalog/index.rs"]
mod tests;
