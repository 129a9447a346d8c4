//! Error types for CareLog core.

use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in CareLog core operations.
///
/// Failures are returned to the immediate caller and never retried here.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The storage medium is unavailable or a write could not be committed.
    #[error("storage fault: {0}")]
    Storage(#[from] carelog_storage::StorageError),

    /// I/O error outside a collection log (manifest, lock file, backup file).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// An operation needing a passphrase was called without one.
    #[error("a passphrase is required")]
    PassphraseRequired,

    /// Authenticated decryption failed.
    ///
    /// Deliberately carries no detail: a wrong passphrase and a damaged file
    /// must be indistinguishable.
    #[error("wrong passphrase or corrupt data")]
    WrongPassphraseOrCorruptData,

    /// A payload, envelope or log frame is malformed.
    #[error("format error: {message}")]
    Format {
        /// Description of the problem.
        message: String,
    },

    /// A record cannot be stored under its collection's key policy.
    #[error("invalid record for {collection}: {message}")]
    InvalidRecord {
        /// The collection that rejected the record.
        collection: &'static str,
        /// Why it was rejected.
        message: String,
    },

    /// The on-disk schema is newer than this build understands.
    #[error("schema version {found} is newer than supported version {supported}")]
    SchemaMismatch {
        /// Version found in the manifest.
        found: u32,
        /// Highest version this build supports.
        supported: u32,
    },

    /// Another handle already holds the store directory.
    #[error("store locked: another process has exclusive access")]
    StoreLocked,

    /// Invalid key size.
    #[error("invalid key size: expected {expected} bytes, got {actual}")]
    InvalidKeySize {
        /// Expected size in bytes.
        expected: usize,
        /// Actual size in bytes.
        actual: usize,
    },

    /// A blocking task panicked or was cancelled before completing.
    #[error("background task failed: {message}")]
    TaskFailed {
        /// Description from the runtime.
        message: String,
    },
}

impl CoreError {
    /// Creates a format error.
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format {
            message: message.into(),
        }
    }

    /// Creates an invalid record error.
    pub fn invalid_record(collection: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidRecord {
            collection,
            message: message.into(),
        }
    }

    /// Creates an invalid key size error.
    pub fn invalid_key_size(actual: usize, expected: usize) -> Self {
        Self::InvalidKeySize { expected, actual }
    }

    /// Returns true for failures of the underlying medium.
    #[must_use]
    pub fn is_storage_fault(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Io(_))
    }

    /// A message safe to show to the person holding the device.
    ///
    /// Wrong passphrases and corrupted files produce the same text.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Storage(_) | Self::Io(_) | Self::TaskFailed { .. } => {
                "The data could not be read or saved. Check available storage and try again."
            }
            Self::PassphraseRequired => "Please enter a passphrase.",
            Self::WrongPassphraseOrCorruptData => {
                "The backup could not be opened. Check the passphrase and the file."
            }
            Self::Format { .. } => "The backup file is not in a recognized format.",
            Self::InvalidRecord { .. } => "The entry is missing required information.",
            Self::SchemaMismatch { .. } => {
                "This data was written by a newer version of the app. Please update."
            }
            Self::StoreLocked => "The data store is already open elsewhere.",
            Self::InvalidKeySize { .. } => "The backup could not be opened.",
        }
    }
}

impl From<tokio::task::JoinError> for CoreError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::TaskFailed {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decryption_failure_message_does_not_leak_cause() {
        let err = CoreError::WrongPassphraseOrCorruptData;
        assert_eq!(err.to_string(), "wrong passphrase or corrupt data");
        assert!(!err.user_message().to_lowercase().contains("wrong"));
    }

    #[test]
    fn storage_errors_are_storage_faults() {
        let err: CoreError = carelog_storage::StorageError::Closed.into();
        assert!(err.is_storage_fault());
        assert!(!CoreError::PassphraseRequired.is_storage_fault());
    }
}
