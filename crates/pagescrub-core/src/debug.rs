//! Debug image capture
//!
//! Processing stages can hand intermediate visualizations to a
//! [`DebugImages`] collection. A GUI or a diagnostic dump drains the
//! collection afterwards; the processing code itself never looks at what
//! it has captured.

/// An ARGB visualization snapshot (0xAARRGGBB words, row-major).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugImage {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Row-major 0xAARRGGBB pixels, `width * height` of them
    pub pixels: Vec<u32>,
}

/// An ordered collection of labeled debug images.
#[derive(Debug, Default)]
pub struct DebugImages {
    entries: Vec<(String, DebugImage)>,
}

impl DebugImages {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a labeled snapshot.
    pub fn add(&mut self, label: impl Into<String>, image: DebugImage) {
        self.entries.push((label.into(), image));
    }

    /// Number of captured snapshots.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether nothing has been captured.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over the captured snapshots in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DebugImage)> {
        self.entries.iter().map(|(label, image)| (label.as_str(), image))
    }
}
