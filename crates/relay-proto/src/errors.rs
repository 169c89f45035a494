//! Error types for the wire layer.
//!
//! The decoder is total and never fails; the only fallible boundary is the
//! optional pending-fragment ceiling on [`crate::LineBuffer`].

use thiserror::Error;

/// Errors raised by the wire layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Pending fragment exceeded the configured ceiling.
    ///
    /// Raised only when a `LineBuffer` was constructed with
    /// [`crate::LineBuffer::with_limit`] and a peer keeps sending bytes
    /// without a line terminator. The fragment is discarded before this is
    /// returned, so the buffer is usable afterwards.
    #[error("pending fragment of {size} bytes exceeds limit of {max} bytes")]
    PendingTooLarge {
        /// Fragment size that triggered the error.
        size: usize,
        /// Configured ceiling.
        max: usize,
    },
}

/// Result alias for wire-layer operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;
