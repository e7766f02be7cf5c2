//! Accumulation of chunked writes into terminator-delimited commands.

use tracing::trace;

use crate::entry::Entry;
use crate::error::HistoryError;

/// Default command terminator.
pub const DEFAULT_TERMINATOR: u8 = b'\n';

/// Accumulates written bytes until a terminator completes a command.
///
/// Writers may deliver a command in arbitrarily sized chunks; the
/// assembler owns the pending bytes from the first chunk until the
/// terminator arrives, then yields the whole accumulated buffer as one
/// committed [`Entry`].
///
/// Only the first terminator seen in an [`append`] call is honored:
/// the completed entry carries the entire accumulated buffer,
/// including any bytes that followed the terminator in the same chunk.
/// Those trailing bytes are not carried into a new pending command.
///
/// [`append`]: CommandAssembler::append
#[derive(Debug)]
pub struct CommandAssembler {
    terminator: u8,
    max_command_bytes: Option<usize>,
    pending: Option<Vec<u8>>,
}

impl Default for CommandAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_TERMINATOR)
    }
}

impl CommandAssembler {
    /// Create an assembler splitting on `terminator`, with no size cap.
    pub fn new(terminator: u8) -> Self {
        Self {
            terminator,
            max_command_bytes: None,
            pending: None,
        }
    }

    /// Create an assembler that refuses to grow a pending command past
    /// `max_command_bytes`.
    pub fn with_limit(terminator: u8, max_command_bytes: usize) -> Self {
        Self {
            terminator,
            max_command_bytes: Some(max_command_bytes),
            pending: None,
        }
    }

    /// Bytes currently accumulated toward an unfinished command.
    pub fn pending_len(&self) -> usize {
        self.pending.as_ref().map_or(0, Vec::len)
    }

    /// True while an unfinished command is buffered.
    pub fn is_accumulating(&self) -> bool {
        self.pending.is_some()
    }

    /// Append one chunk of command data.
    ///
    /// Returns the completed entry if this chunk finished the command,
    /// `Ok(None)` while accumulation continues. On any failure the
    /// pending buffer and its contents are left exactly as they were
    /// before the call.
    pub fn append(&mut self, chunk: &[u8]) -> Result<Option<Entry>, HistoryError> {
        if chunk.is_empty() {
            return Ok(None);
        }
        if let Some(limit) = self.max_command_bytes
            && self.pending_len().saturating_add(chunk.len()) > limit
        {
            return Err(HistoryError::OutOfMemory);
        }

        let mut buf = self.pending.take().unwrap_or_default();
        let scan_from = buf.len();
        if let Err(err) = buf.try_reserve(chunk.len()) {
            // Growth refused: the buffer is unchanged, put it back.
            self.pending = Some(buf);
            return Err(err.into());
        }
        buf.extend_from_slice(chunk);

        // Only the newly appended bytes can hold the terminator; the
        // rest was scanned by earlier calls.
        if buf[scan_from..].contains(&self.terminator) {
            trace!(size = buf.len(), "command complete");
            Ok(Some(Entry::from(buf)))
        } else {
            trace!(accumulated = buf.len(), "command still pending");
            self.pending = Some(buf);
            Ok(None)
        }
    }

    /// Drop any unfinished command, returning to idle.
    ///
    /// Returns how many buffered bytes were thrown away. Used when a
    /// writer disappears in the middle of a command.
    pub fn discard(&mut self) -> usize {
        let dropped = self.pending.take().map_or(0, |buf| buf.len());
        if dropped > 0 {
            trace!(dropped, "discarded partial command");
        }
        dropped
    }
}
