//! # cmdring Core
//!
//! Single-threaded building blocks for the cmdring bounded command
//! history: a fixed-capacity ring of committed commands, stream-offset
//! resolution over it, and accumulation of chunked writes into
//! terminator-delimited commands.
//!
//! The types here hold no locks and perform no I/O; the
//! `cmdring-history` crate wraps them in the exclusive section that
//! makes them safe to share between sessions.
//!
//! ## Key Types
//!
//! - [`RingLog`]: overwrite-oldest storage of the `N` most recent commands
//! - [`Locator`]: absolute stream offset ⇄ (command index, relative offset)
//! - [`CommandAssembler`]: chunked writes → whole terminator-delimited commands
//! - [`Entry`]: one committed command record
//! - [`HistoryError`]: the error taxonomy shared by every operation

pub mod assemble;
pub mod entry;
pub mod error;
pub mod locate;
pub mod ring;

pub use assemble::{CommandAssembler, DEFAULT_TERMINATOR};
pub use entry::Entry;
pub use error::HistoryError;
pub use locate::{Located, Locator};
pub use ring::{HISTORY_DEPTH, RingLog};
