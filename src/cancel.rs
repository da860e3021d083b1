//! Cooperative cancellation.
//!
//! Operations check a [`CancelToken`] at their entry point and a batch checks
//! it again before every item. Work is never interrupted mid-write.

use crate::error::{Error, ErrorCode, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cancellation flag. Clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    canceled: Arc<AtomicBool>,
}

/// Cause attached to errors produced by a canceled token.
#[derive(Debug, thiserror::Error)]
#[error("context canceled")]
pub struct Canceled;

impl CancelToken {
    /// Create a token that is not canceled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    pub fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::SeqCst)
    }

    /// Fail with `internal` "operation canceled" once canceled.
    pub fn check(&self) -> Result<()> {
        self.check_with("operation canceled")
    }

    /// Like [`check`](Self::check) with a caller-chosen message.
    pub fn check_with(&self, message: &str) -> Result<()> {
        if self.is_canceled() {
            return Err(Error::with_cause(ErrorCode::Internal, message, Canceled));
        }
        Ok(())
    }
}
