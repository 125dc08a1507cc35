//! Error types for pagescrub-region

use thiserror::Error;

/// Errors that can occur during region processing operations
#[derive(Debug, Error)]
pub enum RegionError {
    /// Core library error
    #[error("core error: {0}")]
    Core(#[from] pagescrub_core::Error),

    /// The task was cancelled between pipeline phases
    #[error(transparent)]
    Cancelled(#[from] pagescrub_core::Cancelled),
}

/// Result type for region operations
pub type RegionResult<T> = Result<T, RegionError>;
