//! pagescrub-region - Region processing for pagescrub
//!
//! This crate provides the region-level processing of scanned pages:
//!
//! - **Connectivity labeling** - Dense component label maps with a
//!   padded border for scan-based algorithms
//! - **Despeckling** - Removal of small, isolated blobs while keeping
//!   content attached to the page's text and figures
//!
//! # Examples
//!
//! ## Labeling connected components
//!
//! ```
//! use pagescrub_core::BinaryImage;
//! use pagescrub_region::{Connectivity, ConnectivityMap};
//!
//! let image = BinaryImage::from_fg_pixels(100, 100, &[(10, 10), (11, 10), (50, 50)]).unwrap();
//! let cmap = ConnectivityMap::new(&image, Connectivity::Eight);
//! assert_eq!(cmap.max_label(), 2);
//! ```
//!
//! ## Despeckling a page
//!
//! ```
//! use pagescrub_core::{BinaryImage, Dpi, NeverCancelled};
//! use pagescrub_region::{Level, despeckle};
//!
//! let mut pixels = vec![(190, 17)]; // a lone speck
//! for x in 20..60 {
//!     for y in 20..60 {
//!         pixels.push((x, y)); // a large blob
//!     }
//! }
//! let image = BinaryImage::from_fg_pixels(200, 100, &pixels).unwrap();
//!
//! let cleaned = despeckle(&image, Dpi::STANDARD, Level::Normal, &NeverCancelled, None).unwrap();
//! assert_eq!(cleaned.count_foreground(), 40 * 40);
//! ```

pub mod conncomp;
pub mod despeckle;
pub mod error;

// Re-export core types
pub use pagescrub_core;

// Re-export error types
pub use error::{RegionError, RegionResult};

// Re-export conncomp types
pub use conncomp::{Connectivity, ConnectivityMap};

// Re-export despeckle types and functions
pub use despeckle::{Level, Settings, Strength, despeckle, despeckle_in_place};
