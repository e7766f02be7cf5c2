//! Per-caller session handles.

use std::io::SeekFrom;
use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, trace};

use cmdring_core::{CommandAssembler, HistoryError};

use crate::coordinator::AccessCoordinator;

/// One caller's view of the shared history.
///
/// Each session accumulates its own partial command, so interleaved
/// chunks from concurrent sessions never mix inside one pending
/// buffer, and keeps its own cursor into the logical stream. Completed
/// commands are committed to the shared ring under the coordinator's
/// exclusive section.
#[derive(Debug)]
pub struct Session<const N: usize> {
    coordinator: Arc<AccessCoordinator<N>>,
    assembler: CommandAssembler,
    cursor: u64,
    id: u64,
}

impl<const N: usize> Session<N> {
    /// Open a session against a shared coordinator.
    ///
    /// The cursor starts at the beginning of the stream and the
    /// session's private assembler starts idle.
    pub fn open(coordinator: Arc<AccessCoordinator<N>>) -> Self {
        let id = coordinator.allocate_session_id();
        let assembler = coordinator.config().assembler();
        debug!(session = id, "session opened");
        Self {
            coordinator,
            assembler,
            cursor: 0,
            id,
        }
    }

    /// Session identifier, carried in log fields.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Current absolute read position.
    pub fn position(&self) -> u64 {
        self.cursor
    }

    /// Bytes buffered toward this session's unfinished command.
    pub fn pending_len(&self) -> usize {
        self.assembler.pending_len()
    }

    /// Accept one chunk of command data.
    ///
    /// Accumulation stays private to this session until a terminator
    /// completes the command, which is then committed to the shared
    /// ring. After shutdown the chunk is refused with `Interrupted`;
    /// a command whose commit loses the race with shutdown is
    /// discarded along with the rest of the session.
    pub async fn write(&mut self, bytes: &[u8]) -> Result<usize, HistoryError> {
        if bytes.is_empty() {
            return Err(HistoryError::InvalidArgument("empty write"));
        }
        if self.coordinator.is_shutdown() {
            return Err(HistoryError::Interrupted);
        }

        if let Some(entry) = self.assembler.append(bytes)? {
            self.coordinator.commit(entry).await?;
        }

        self.coordinator.record_written_bytes(bytes.len());
        trace!(session = self.id, len = bytes.len(), "session write");
        Ok(bytes.len())
    }

    /// Read up to `max_len` bytes at the session cursor, advancing it
    /// past whatever was copied.
    pub async fn read(&mut self, max_len: usize) -> Result<Bytes, HistoryError> {
        let chunk = self.coordinator.read(self.cursor, max_len).await?;
        self.cursor = chunk.next_cursor;
        Ok(chunk.data)
    }

    /// Drain the stream from the cursor to its end.
    pub async fn read_to_end(&mut self) -> Result<Bytes, HistoryError> {
        self.read(usize::MAX).await
    }

    /// Move the cursor to `offset` bytes into command `command`.
    pub async fn seek_to_command(&mut self, command: usize, offset: u64) -> Result<u64, HistoryError> {
        let position = self.coordinator.seek_to_command(command, offset).await?;
        self.cursor = position;
        trace!(session = self.id, command, offset, position, "session seek");
        Ok(position)
    }

    /// Move the cursor to an absolute stream position.
    pub async fn seek_absolute(&mut self, position: u64) -> Result<u64, HistoryError> {
        let accepted = self.coordinator.seek_absolute(position).await?;
        self.cursor = accepted;
        Ok(accepted)
    }

    /// `std::io`-style seek over the logical stream.
    ///
    /// `Current` and `End` displacements are computed here; the final
    /// position is validated against the stream under the exclusive
    /// section, so a concurrent eviction can still surface as
    /// `OutOfRange`.
    pub async fn seek(&mut self, target: SeekFrom) -> Result<u64, HistoryError> {
        let position = match target {
            SeekFrom::Start(position) => position,
            SeekFrom::Current(delta) => Self::displace(self.cursor, delta)?,
            SeekFrom::End(delta) => {
                let total = self.coordinator.total_size().await?;
                Self::displace(total, delta)?
            }
        };
        self.seek_absolute(position).await
    }

    /// Drop any partial command this session was accumulating and
    /// return how many bytes were thrown away.
    pub fn discard_pending(&mut self) -> usize {
        self.assembler.discard()
    }

    fn displace(base: u64, delta: i64) -> Result<u64, HistoryError> {
        base.checked_add_signed(delta).ok_or_else(|| {
            HistoryError::out_of_range(format!("displacing position {base} by {delta}"))
        })
    }
}

impl<const N: usize> Drop for Session<N> {
    fn drop(&mut self) {
        let dropped = self.assembler.discard();
        if dropped > 0 {
            debug!(
                session = self.id,
                dropped, "session closed with partial command"
            );
        } else {
            trace!(session = self.id, "session closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coordinator() -> Arc<AccessCoordinator<10>> {
        Arc::new(AccessCoordinator::new())
    }

    #[tokio::test]
    async fn test_session_write_and_read_back() {
        let coordinator = coordinator();
        let mut session = Session::open(Arc::clone(&coordinator));

        session.write(b"hello\n").await.unwrap();

        let history = session.read_to_end().await.unwrap();
        assert_eq!(&history[..], b"hello\n");
        assert_eq!(session.position(), 6);

        // Cursor sits at end-of-stream until new data arrives.
        assert!(session.read(64).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sessions_accumulate_independently() {
        let coordinator = coordinator();
        let mut alpha = Session::open(Arc::clone(&coordinator));
        let mut beta = Session::open(Arc::clone(&coordinator));

        // Interleaved partial writes from two sessions.
        alpha.write(b"alpha ").await.unwrap();
        beta.write(b"beta ").await.unwrap();
        alpha.write(b"one\n").await.unwrap();
        beta.write(b"two\n").await.unwrap();

        let entries = coordinator.snapshot().await.unwrap();
        let contents: Vec<&[u8]> = entries.iter().map(|e| e.as_bytes()).collect();
        assert_eq!(contents, vec![b"alpha one\n" as &[u8], b"beta two\n"]);
    }

    #[tokio::test]
    async fn test_session_sees_other_sessions_commits() {
        let coordinator = coordinator();
        let mut writer = Session::open(Arc::clone(&coordinator));
        let mut reader = Session::open(Arc::clone(&coordinator));

        writer.write(b"shared\n").await.unwrap();

        let seen = reader.read_to_end().await.unwrap();
        assert_eq!(&seen[..], b"shared\n");
    }

    #[tokio::test]
    async fn test_seek_to_command_moves_cursor() {
        let coordinator = coordinator();
        let mut session = Session::open(Arc::clone(&coordinator));
        session.write(b"abc\n").await.unwrap();
        session.write(b"def\n").await.unwrap();

        let position = session.seek_to_command(1, 1).await.unwrap();
        assert_eq!(position, 5);
        assert_eq!(session.position(), 5);

        let rest = session.read_to_end().await.unwrap();
        assert_eq!(&rest[..], b"ef\n");
    }

    #[tokio::test]
    async fn test_failed_seek_leaves_cursor_unchanged() {
        let coordinator = coordinator();
        let mut session = Session::open(Arc::clone(&coordinator));
        session.write(b"abc\n").await.unwrap();
        session.seek_absolute(2).await.unwrap();

        assert!(session.seek_to_command(5, 0).await.is_err());
        assert_eq!(session.position(), 2);

        assert!(session.seek_absolute(99).await.is_err());
        assert_eq!(session.position(), 2);
    }

    #[tokio::test]
    async fn test_seek_from_variants() {
        let coordinator = coordinator();
        let mut session = Session::open(Arc::clone(&coordinator));
        session.write(b"abcdefg\n").await.unwrap();

        assert_eq!(session.seek(SeekFrom::Start(3)).await.unwrap(), 3);
        assert_eq!(session.seek(SeekFrom::Current(2)).await.unwrap(), 5);
        assert_eq!(session.seek(SeekFrom::Current(-4)).await.unwrap(), 1);
        assert_eq!(session.seek(SeekFrom::End(0)).await.unwrap(), 8);
        assert_eq!(session.seek(SeekFrom::End(-8)).await.unwrap(), 0);

        // Displacing below zero is rejected before validation.
        assert!(session.seek(SeekFrom::Current(-1)).await.is_err());
        assert_eq!(session.position(), 0);
    }

    #[tokio::test]
    async fn test_discard_pending_abandons_partial_command() {
        let coordinator = coordinator();
        let mut session = Session::open(Arc::clone(&coordinator));

        session.write(b"never finished").await.unwrap();
        assert_eq!(session.pending_len(), 14);

        assert_eq!(session.discard_pending(), 14);
        assert_eq!(session.pending_len(), 0);
        assert_eq!(coordinator.entry_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_dropped_session_leaves_no_trace() {
        let coordinator = coordinator();
        {
            let mut session = Session::open(Arc::clone(&coordinator));
            session.write(b"half a command").await.unwrap();
        }

        assert_eq!(coordinator.entry_count().await.unwrap(), 0);
        assert_eq!(coordinator.total_size().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_session_write_after_shutdown() {
        let coordinator = coordinator();
        let mut session = Session::open(Arc::clone(&coordinator));
        session.write(b"kept\n").await.unwrap();

        coordinator.shutdown();

        let err = session.write(b"refused\n").await.unwrap_err();
        assert!(matches!(err, HistoryError::Interrupted));
    }
}
