//! Committed command records.

use bytes::Bytes;

/// One complete terminator-delimited command, immutable once committed.
///
/// The buffer is owned by whichever ring slot currently holds the
/// entry. Cloning is cheap (reference-counted) and is how snapshots
/// hand entries out without copying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    data: Bytes,
}

impl Entry {
    /// Create an entry from an owned buffer.
    pub fn new(data: Bytes) -> Self {
        Self { data }
    }

    /// Number of bytes in the command, terminator included.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Borrow the command contents.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Cheap owned handle to the contents.
    pub fn data(&self) -> Bytes {
        self.data.clone()
    }
}

impl From<Vec<u8>> for Entry {
    fn from(buf: Vec<u8>) -> Self {
        Self {
            data: Bytes::from(buf),
        }
    }
}

impl AsRef<[u8]> for Entry {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}
