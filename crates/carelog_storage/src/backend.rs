//! Storage backend trait definition.

use crate::error::StorageResult;

/// An append-only byte store holding one collection log.
///
/// # Invariants
///
/// - `append` returns the offset the bytes landed at and never rewrites
///   earlier bytes
/// - `read_at` returns exactly the bytes previously appended at that offset
/// - after `sync` returns `Ok`, every appended byte survives process exit
/// - `truncate` only shrinks; it exists to drop a torn tail during recovery
///
/// Backends must be `Send + Sync`: the store moves them into blocking tasks.
pub trait StorageBackend: Send + Sync {
    /// Reads `len` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::ReadPastEnd`](crate::StorageError::ReadPastEnd)
    /// if the range is not fully committed, or an I/O error.
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>>;

    /// Appends `data` at the end of the log and returns its offset.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes could not be written.
    fn append(&mut self, data: &[u8]) -> StorageResult<u64>;

    /// Pushes buffered writes to the operating system.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush fails.
    fn flush(&mut self) -> StorageResult<()>;

    /// Flushes and forces all data and metadata onto the medium.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync fails.
    fn sync(&mut self) -> StorageResult<()>;

    /// Returns the committed size in bytes (the offset of the next append).
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be determined.
    fn size(&self) -> StorageResult<u64>;

    /// Shrinks the log to `new_size` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::TruncateBeyondEnd`](crate::StorageError::TruncateBeyondEnd)
    /// if `new_size` exceeds the current size, or an I/O error.
    fn truncate(&mut self, new_size: u64) -> StorageResult<()>;

    /// Reads the whole log.
    ///
    /// Used once per collection when a store is opened and its log replayed.
    ///
    /// # Errors
    ///
    /// Returns an error if the size or the bytes cannot be read.
    fn read_all(&self) -> StorageResult<Vec<u8>> {
        let size = self.size()?;
        let len = usize::try_from(size).map_err(|_| {
            crate::StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("log of {size} bytes does not fit in memory"),
            ))
        })?;
        self.read_at(0, len)
    }
}
