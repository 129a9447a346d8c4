//! Error types for storage operations.

use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors raised by a storage backend.
///
/// Every variant means the medium could not serve or commit the request;
/// callers above this crate surface them as storage faults.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A read reached past the committed end of the log.
    #[error("read beyond end of storage: offset {offset}, len {len}, size {size}")]
    ReadPastEnd {
        /// The requested read offset.
        offset: u64,
        /// The requested read length.
        len: usize,
        /// The committed size at the time of the read.
        size: u64,
    },

    /// A truncation asked to grow the log instead of shrinking it.
    #[error("cannot truncate to {requested} bytes, log holds only {size}")]
    TruncateBeyondEnd {
        /// The requested new size.
        requested: u64,
        /// The current size.
        size: u64,
    },

    /// The backend has been closed and accepts no more operations.
    #[error("storage is closed")]
    Closed,
}
