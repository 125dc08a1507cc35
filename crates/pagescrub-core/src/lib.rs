//! pagescrub-core - Shared plumbing for scanned-page post-processing
//!
//! This crate holds the types the processing crates operate on:
//!
//! - **Binary images** - one-bit-per-pixel page rasters with word-packed rows
//! - **Resolution** - horizontal/vertical DPI descriptors
//! - **Task control** - cooperative cancellation probes
//! - **Debug capture** - labeled visualization snapshots of pipeline stages
//!
//! # Example
//!
//! ```
//! use pagescrub_core::BinaryImage;
//!
//! let image = BinaryImage::new(640, 480).unwrap();
//! assert_eq!(image.width(), 640);
//! assert_eq!(image.words_per_line(), 20);
//! assert_eq!(image.count_foreground(), 0);
//! ```

pub mod binary_image;
pub mod debug;
pub mod dpi;
pub mod error;
pub mod task;

pub use binary_image::{
    BinaryImage, BinaryImageMut, clear_data_bit, get_data_bit, set_data_bit,
};
pub use debug::{DebugImage, DebugImages};
pub use dpi::Dpi;
pub use error::{Error, Result};
pub use task::{CancelFlag, Cancelled, NeverCancelled, TaskStatus};
