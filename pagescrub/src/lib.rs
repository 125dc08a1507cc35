//! pagescrub - Post-processing of scanned page images
//!
//! # Overview
//!
//! pagescrub cleans up bi-level scans of printed pages. The current
//! surface centers on despeckling: removing small, isolated blobs that
//! binarization leaves behind, while keeping everything attached to the
//! page's actual content.
//!
//! # Example
//!
//! ```
//! use pagescrub::{BinaryImage, Dpi, Level, NeverCancelled, despeckle};
//!
//! let image = BinaryImage::from_fg_pixels(200, 200, &[(100, 100)]).unwrap();
//! let cleaned = despeckle(&image, Dpi::STANDARD, Level::Normal, &NeverCancelled, None).unwrap();
//! assert_eq!(cleaned.count_foreground(), 0);
//! ```

// Re-export the core and region surfaces
pub use pagescrub_core::{
    BinaryImage, BinaryImageMut, CancelFlag, Cancelled, DebugImage, DebugImages, Dpi, Error,
    NeverCancelled, Result, TaskStatus,
};
pub use pagescrub_region::{
    Connectivity, ConnectivityMap, Level, RegionError, RegionResult, Settings, Strength,
    despeckle, despeckle_in_place,
};
