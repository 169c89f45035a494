//! Stream reassembly.
//!
//! The transport delivers arbitrarily-fragmented chunks: a single read may
//! carry zero, one, or many lines, and a line may span several reads.
//! [`LineBuffer`] accumulates chunks and extracts complete CRLF-terminated
//! lines, keeping any trailing partial line for the next push.

use crate::errors::{ProtocolError, Result};

/// Line delimiter for the wire protocol.
const DELIMITER: &str = "\r\n";

/// Reassembles transport chunks into complete protocol lines.
///
/// # Invariants
///
/// - After a push completes, the pending fragment never contains a full
///   delimiter-terminated line; every such line has been extracted.
/// - Lines are emitted in exactly the order their bytes arrived.
///
/// The default buffer is unbounded: a peer that never sends a terminator
/// grows the fragment without limit. [`LineBuffer::with_limit`] opts into a
/// ceiling that turns runaway growth into a
/// [`ProtocolError::PendingTooLarge`] instead.
#[derive(Debug, Default, Clone)]
pub struct LineBuffer {
    /// Bytes received but not yet terminated into a line.
    pending: String,
    /// Optional ceiling on the pending fragment, in bytes.
    limit: Option<usize>,
}

impl LineBuffer {
    /// Create an unbounded buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a buffer that rejects pending fragments larger than `limit`
    /// bytes.
    pub fn with_limit(limit: usize) -> Self {
        Self { pending: String::new(), limit: Some(limit) }
    }

    /// Append a chunk and extract every complete line it unlocks.
    ///
    /// An empty chunk yields an empty vec. The remainder without a trailing
    /// delimiter stays buffered for the next call.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::PendingTooLarge`] if a configured limit is exceeded
    /// after extraction; the fragment is discarded so the buffer stays
    /// usable.
    pub fn push(&mut self, chunk: &str) -> Result<Vec<String>> {
        self.pending.push_str(chunk);

        let mut lines = Vec::new();
        while let Some(at) = self.pending.find(DELIMITER) {
            lines.push(self.pending[..at].to_owned());
            self.pending.drain(..at + DELIMITER.len());
        }

        debug_assert!(!self.pending.contains(DELIMITER));

        if let Some(max) = self.limit
            && self.pending.len() > max
        {
            let size = self.pending.len();
            self.pending.clear();
            return Err(ProtocolError::PendingTooLarge { size, max });
        }

        Ok(lines)
    }

    /// Discard the pending fragment unconditionally.
    ///
    /// Called on disconnect: buffered bytes of a partial line are never
    /// surfaced to a later connection.
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Current pending fragment (bytes awaiting a terminator).
    pub fn pending(&self) -> &str {
        &self.pending
    }
}
