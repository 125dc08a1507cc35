//! Image resolution descriptor

/// Horizontal and vertical resolution in dots per inch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dpi {
    horizontal: i32,
    vertical: i32,
}

impl Dpi {
    /// The 300x300 DPI most flatbed scans are calibrated against.
    pub const STANDARD: Dpi = Dpi {
        horizontal: 300,
        vertical: 300,
    };

    /// Create a resolution descriptor.
    pub const fn new(horizontal: i32, vertical: i32) -> Self {
        Dpi {
            horizontal,
            vertical,
        }
    }

    /// Get the horizontal resolution.
    #[inline]
    pub fn horizontal(self) -> i32 {
        self.horizontal
    }

    /// Get the vertical resolution.
    #[inline]
    pub fn vertical(self) -> i32 {
        self.vertical
    }

    /// Get the smaller of the two resolutions.
    #[inline]
    pub fn min(self) -> i32 {
        self.horizontal.min(self.vertical)
    }
}

impl Default for Dpi {
    fn default() -> Self {
        Dpi::STANDARD
    }
}
