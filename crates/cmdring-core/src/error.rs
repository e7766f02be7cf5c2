//! Error types for the command history.

use std::collections::TryReserveError;

use thiserror::Error;

/// Errors surfaced by history operations.
///
/// Every variant is recoverable at the operation boundary: a failed
/// call leaves ring contents, pending buffers and cursors exactly as
/// they were before the call.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// Zero-length input where at least one byte is required.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// Allocation refused while growing a pending command buffer.
    #[error("out of memory while accumulating command data")]
    OutOfMemory,

    /// Seek target beyond the currently valid data.
    #[error("out of range: {0}")]
    OutOfRange(String),

    /// The wait for the exclusive section was aborted by shutdown.
    #[error("operation interrupted by shutdown")]
    Interrupted,
}

impl HistoryError {
    /// Create a new OutOfRange error.
    pub fn out_of_range(message: impl Into<String>) -> Self {
        Self::OutOfRange(message.into())
    }
}

impl From<TryReserveError> for HistoryError {
    fn from(_: TryReserveError) -> Self {
        HistoryError::OutOfMemory
    }
}
