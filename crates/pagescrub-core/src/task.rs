//! Cooperative task cancellation
//!
//! Long-running pipelines poll a [`TaskStatus`] between phases and abort
//! with [`Cancelled`] when the caller has given up on the result. The
//! probe must be cheap and safe to call repeatedly.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

/// Error returned when a task observed a cancellation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("task cancelled")]
pub struct Cancelled;

/// Cancellation probe polled between pipeline phases.
pub trait TaskStatus {
    /// Check whether cancellation has been requested.
    fn is_cancelled(&self) -> bool;

    /// Abort with [`Cancelled`] if cancellation has been requested.
    fn throw_if_cancelled(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}

/// A task status that never cancels.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverCancelled;

impl TaskStatus for NeverCancelled {
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// A shared cancellation flag.
///
/// Clones share the same flag, so a GUI thread may keep one clone and
/// hand another to the worker running the pipeline.
///
/// # Examples
///
/// ```
/// use pagescrub_core::{CancelFlag, TaskStatus};
///
/// let flag = CancelFlag::new();
/// assert!(flag.throw_if_cancelled().is_ok());
///
/// flag.cancel();
/// assert!(flag.throw_if_cancelled().is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    flag: Arc<AtomicBool>,
}

impl CancelFlag {
    /// Create a flag with no cancellation requested.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }
}

impl TaskStatus for CancelFlag {
    fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
