//! # cmdring History
//!
//! Concurrency-safe access to a bounded, in-memory history of
//! terminator-delimited commands.
//!
//! The history retains the most recent `N` commands (ten by default)
//! and presents them as one logically concatenated byte stream.
//! Callers address the stream by absolute offset, or indirectly by
//! (command index, offset within that command). Many sessions write
//! and read the shared history concurrently; one exclusive section
//! serializes every mutation and observation of the ring.
//!
//! History is deliberately volatile: nothing is persisted, and the
//! stream is lost when the process exits.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use cmdring_history::{AccessCoordinator, Session};
//!
//! #[tokio::main]
//! async fn main() {
//!     let coordinator: Arc<AccessCoordinator> = Arc::new(AccessCoordinator::new());
//!
//!     let mut session = Session::open(Arc::clone(&coordinator));
//!     session.write(b"first command\n").await.unwrap();
//!
//!     let history = session.read_to_end().await.unwrap();
//!     assert_eq!(&history[..], b"first command\n");
//!
//!     // Byte 0 of command 0 is stream position 0.
//!     let position = session.seek_to_command(0, 0).await.unwrap();
//!     assert_eq!(position, 0);
//! }
//! ```

pub mod config;
pub mod coordinator;
pub mod session;

pub use config::HistoryConfig;
pub use coordinator::{AccessCoordinator, HistoryStats, ReadChunk};
pub use session::Session;

// Re-export the core building blocks for adapters and tests.
pub use cmdring_core::{
    CommandAssembler, DEFAULT_TERMINATOR, Entry, HISTORY_DEPTH, HistoryError, Located, Locator,
    RingLog,
};
