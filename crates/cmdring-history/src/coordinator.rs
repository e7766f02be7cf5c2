//! Serialized access to the shared command history.

use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use tokio::sync::{Mutex, MutexGuard, watch};
use tracing::{debug, trace};

use cmdring_core::{CommandAssembler, Entry, HISTORY_DEPTH, HistoryError, Locator, RingLog};

use crate::config::HistoryConfig;

/// Bytes handed back by a read, plus the advanced cursor.
#[derive(Debug, Clone)]
pub struct ReadChunk {
    /// Copied bytes; empty at end-of-stream.
    pub data: Bytes,
    /// Cursor advanced past the copied bytes.
    pub next_cursor: u64,
}

impl ReadChunk {
    /// True when the cursor was at or past the end of the stream.
    pub fn is_end_of_stream(&self) -> bool {
        self.data.is_empty()
    }
}

/// Lock-free snapshot of coordinator counters.
#[derive(Debug, Clone, Copy, Default)]
pub struct HistoryStats {
    /// Commands committed to the ring since startup.
    pub committed_entries: u64,
    /// Commands displaced to make room for newer ones.
    pub evicted_entries: u64,
    /// Payload bytes accepted by write calls.
    pub bytes_written: u64,
}

/// Everything the exclusive section protects.
#[derive(Debug)]
struct CoordinatorState<const N: usize> {
    ring: RingLog<N>,
    /// Accumulator for callers writing through the coordinator
    /// directly, in the style of a shared device node. Sessions carry
    /// their own.
    assembler: CommandAssembler,
}

/// The single entry point for the shared command history.
///
/// One exclusive section guards the ring and the shared assembler, so
/// concurrent writers cannot interleave their commits and readers
/// always observe a consistent stream. Constructed once at startup,
/// shared via `Arc` (see [`Session::open`]); dropping the coordinator
/// releases every entry it still owns.
///
/// Capacity is the const parameter `N`, defaulting to
/// [`HISTORY_DEPTH`].
///
/// [`Session::open`]: crate::session::Session::open
#[derive(Debug)]
pub struct AccessCoordinator<const N: usize = HISTORY_DEPTH> {
    state: Mutex<CoordinatorState<N>>,
    config: HistoryConfig,
    /// Shutdown flag; waiters race it against lock acquisition.
    shutdown: watch::Sender<bool>,
    committed: AtomicU64,
    evicted: AtomicU64,
    bytes_written: AtomicU64,
    next_session_id: AtomicU64,
}

impl<const N: usize> Default for AccessCoordinator<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> AccessCoordinator<N> {
    /// Create a coordinator with the default configuration.
    pub fn new() -> Self {
        Self::with_config(HistoryConfig::default())
    }

    /// Create a coordinator with a custom configuration.
    pub fn with_config(config: HistoryConfig) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            state: Mutex::new(CoordinatorState {
                ring: RingLog::new(),
                assembler: config.assembler(),
            }),
            config,
            shutdown,
            committed: AtomicU64::new(0),
            evicted: AtomicU64::new(0),
            bytes_written: AtomicU64::new(0),
            next_session_id: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    /// Signal shutdown.
    ///
    /// Callers blocked waiting for the exclusive section receive
    /// `Interrupted`, and subsequent operations fail fast with the
    /// same error. Ring contents stay in place until the coordinator
    /// is dropped.
    pub fn shutdown(&self) {
        debug!("history coordinator shutting down");
        let _ = self.shutdown.send(true);
    }

    pub fn is_shutdown(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Snapshot of the lock-free counters.
    pub fn stats(&self) -> HistoryStats {
        HistoryStats {
            committed_entries: self.committed.load(Ordering::SeqCst),
            evicted_entries: self.evicted.load(Ordering::SeqCst),
            bytes_written: self.bytes_written.load(Ordering::SeqCst),
        }
    }

    /// Accept one chunk of command data through the shared assembler.
    ///
    /// Fails with `InvalidArgument` on empty input, before any state
    /// is touched. Returns the number of bytes consumed.
    pub async fn write(&self, bytes: &[u8]) -> Result<usize, HistoryError> {
        if bytes.is_empty() {
            return Err(HistoryError::InvalidArgument("empty write"));
        }

        let mut state = self.lock_state().await?;
        if let Some(entry) = state.assembler.append(bytes)? {
            self.commit_locked(&mut state, entry);
        }
        drop(state);

        self.record_written_bytes(bytes.len());
        Ok(bytes.len())
    }

    /// Copy up to `max_len` bytes starting at `cursor`.
    ///
    /// The copy continues across entry boundaries, oldest to newest,
    /// until the budget is spent or the stream ends. A cursor at or
    /// past the end of the stream yields an empty chunk with the
    /// cursor unchanged; that is end-of-stream, not an error.
    pub async fn read(&self, cursor: u64, max_len: usize) -> Result<ReadChunk, HistoryError> {
        if max_len == 0 {
            return Err(HistoryError::InvalidArgument("zero-length read"));
        }

        let state = self.lock_state().await?;
        Self::read_locked(&state, cursor, max_len)
    }

    /// Absolute stream position of `offset` bytes into command
    /// `command`, counted zero-based from the oldest.
    ///
    /// Validates both coordinates against the current history and
    /// returns `OutOfRange` without side effects when either is
    /// beyond the valid data. Moves no caller-held cursor; the caller
    /// adopts the returned position.
    pub async fn seek_to_command(&self, command: usize, offset: u64) -> Result<u64, HistoryError> {
        let state = self.lock_state().await?;
        let position = Locator::new(&state.ring).resolve_seek(command, offset)?;
        trace!(command, offset, position, "resolved command seek");
        Ok(position)
    }

    /// Validate an absolute cursor position.
    ///
    /// Positions from zero through `total_size` inclusive are
    /// accepted; the one-past-end position is a valid cursor whose
    /// next read reports end-of-stream.
    pub async fn seek_absolute(&self, position: u64) -> Result<u64, HistoryError> {
        let state = self.lock_state().await?;
        let total = state.ring.total_size();
        if position > total {
            return Err(HistoryError::out_of_range(format!(
                "position {position} beyond stream of {total} bytes"
            )));
        }
        Ok(position)
    }

    /// Total size of the logical stream in bytes.
    pub async fn total_size(&self) -> Result<u64, HistoryError> {
        let state = self.lock_state().await?;
        Ok(state.ring.total_size())
    }

    /// Number of currently valid commands.
    pub async fn entry_count(&self) -> Result<usize, HistoryError> {
        let state = self.lock_state().await?;
        Ok(state.ring.len())
    }

    /// Cheap clones of every valid entry, oldest to newest.
    pub async fn snapshot(&self) -> Result<Vec<Entry>, HistoryError> {
        let state = self.lock_state().await?;
        Ok(state.ring.iter().cloned().collect())
    }

    /// Commit one completed entry from a session's private assembler.
    pub(crate) async fn commit(&self, entry: Entry) -> Result<(), HistoryError> {
        let mut state = self.lock_state().await?;
        self.commit_locked(&mut state, entry);
        Ok(())
    }

    pub(crate) fn record_written_bytes(&self, len: usize) {
        self.bytes_written.fetch_add(len as u64, Ordering::SeqCst);
    }

    pub(crate) fn allocate_session_id(&self) -> u64 {
        self.next_session_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Acquire the exclusive section, racing the shutdown flag.
    ///
    /// A caller still waiting when shutdown fires gets `Interrupted`
    /// without having touched any shared state.
    async fn lock_state(&self) -> Result<MutexGuard<'_, CoordinatorState<N>>, HistoryError> {
        let mut shutdown_rx = self.shutdown.subscribe();
        if *shutdown_rx.borrow() {
            return Err(HistoryError::Interrupted);
        }
        tokio::select! {
            guard = self.state.lock() => Ok(guard),
            _ = shutdown_rx.changed() => Err(HistoryError::Interrupted),
        }
    }

    fn commit_locked(&self, state: &mut CoordinatorState<N>, entry: Entry) {
        let size = entry.len();
        let evicted = state.ring.add(entry);
        self.committed.fetch_add(1, Ordering::SeqCst);

        match evicted {
            Some(old) => {
                self.evicted.fetch_add(1, Ordering::SeqCst);
                debug!(
                    size,
                    displaced = old.len(),
                    entries = state.ring.len(),
                    "committed entry, displaced oldest"
                );
            }
            None => {
                debug!(size, entries = state.ring.len(), "committed entry");
            }
        }
    }

    fn read_locked(
        state: &CoordinatorState<N>,
        cursor: u64,
        max_len: usize,
    ) -> Result<ReadChunk, HistoryError> {
        let locator = Locator::new(&state.ring);
        let Some(located) = locator.find(cursor) else {
            trace!(cursor, "read at end of stream");
            return Ok(ReadChunk {
                data: Bytes::new(),
                next_cursor: cursor,
            });
        };

        let remaining = state.ring.total_size() - cursor;
        let budget = (max_len as u64).min(remaining) as usize;
        let mut out = Vec::new();
        out.try_reserve(budget)?;

        let mut offset = located.offset;
        for entry in state.ring.iter().skip(located.command) {
            if out.len() == budget {
                break;
            }
            let take = (budget - out.len()).min(entry.len() - offset);
            out.extend_from_slice(&entry.as_bytes()[offset..offset + take]);
            offset = 0;
        }

        let copied = out.len() as u64;
        trace!(cursor, copied, "read");
        Ok(ReadChunk {
            data: Bytes::from(out),
            next_cursor: cursor + copied,
        })
    }
}
