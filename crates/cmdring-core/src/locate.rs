//! Stream-offset resolution over the ring log.
//!
//! All valid entries, oldest to newest, form one logically
//! concatenated byte stream. The locator translates between absolute
//! positions in that stream and (command index, relative offset)
//! pairs.

use crate::entry::Entry;
use crate::error::HistoryError;
use crate::ring::RingLog;

/// Result of resolving an absolute stream position.
#[derive(Debug)]
pub struct Located<'a> {
    /// Entry containing the position.
    pub entry: &'a Entry,
    /// Zero-based index of that entry, counted from the oldest.
    pub command: usize,
    /// Byte offset of the position within the entry.
    pub offset: usize,
}

/// Read-only resolver over a ring snapshot.
///
/// Borrows the ring for its whole lifetime, so it can only exist while
/// the exclusive section protecting the ring is held and the ring
/// cannot change underneath it.
#[derive(Debug, Clone, Copy)]
pub struct Locator<'a, const N: usize> {
    ring: &'a RingLog<N>,
}

impl<'a, const N: usize> Locator<'a, N> {
    pub fn new(ring: &'a RingLog<N>) -> Self {
        Self { ring }
    }

    /// Find the entry containing `position`.
    ///
    /// A position exactly on an entry boundary belongs to the entry
    /// that starts there, not the one that just ended. `None` means
    /// the position is at or past the end of the stream; readers treat
    /// that as end-of-stream rather than an error.
    pub fn find(&self, position: u64) -> Option<Located<'a>> {
        let mut cumulative = 0u64;
        for (command, entry) in self.ring.iter().enumerate() {
            let size = entry.len() as u64;
            if position < cumulative + size {
                return Some(Located {
                    entry,
                    command,
                    offset: (position - cumulative) as usize,
                });
            }
            cumulative += size;
        }
        None
    }

    /// Absolute stream position of `offset` bytes into command
    /// `command`, counted zero-based from the oldest.
    ///
    /// Fails with `OutOfRange` when the command index or the offset
    /// within the command is beyond the currently valid data.
    pub fn resolve_seek(&self, command: usize, offset: u64) -> Result<u64, HistoryError> {
        let entry = self.ring.get(command).ok_or_else(|| {
            HistoryError::out_of_range(format!(
                "command {command} requested but only {} present",
                self.ring.len()
            ))
        })?;

        let size = entry.len() as u64;
        if offset >= size {
            return Err(HistoryError::out_of_range(format!(
                "offset {offset} beyond command of {size} bytes"
            )));
        }

        let preceding: u64 = self
            .ring
            .iter()
            .take(command)
            .map(|e| e.len() as u64)
            .sum();
        Ok(preceding + offset)
    }

    /// Total size of the logical stream.
    pub fn total_size(&self) -> u64 {
        self.ring.total_size()
    }
}
