//! Store and backup configuration.

use crate::crypto::DEFAULT_KDF_ITERATIONS;

/// Configuration for opening a store.
#[derive(Debug, Clone)]
pub struct Config {
    /// Whether to create the store directory if it doesn't exist.
    pub create_if_missing: bool,

    /// Whether every put fsyncs its collection log before returning.
    ///
    /// With `false` a put only flushes to the OS; a power cut may lose it.
    pub sync_on_commit: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            sync_on_commit: true,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to create the store if missing.
    #[must_use]
    pub const fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Sets whether to fsync on every put.
    #[must_use]
    pub const fn sync_on_commit(mut self, value: bool) -> Self {
        self.sync_on_commit = value;
        self
    }
}

/// How an export reads the five collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SnapshotMode {
    /// One independent read per collection.
    ///
    /// Writes landing between the reads can leave the collections mutually
    /// inconsistent inside the backup.
    #[default]
    Independent,
    /// Hold every collection lock for the duration of the read.
    Consistent,
}

/// Configuration for backup export and import.
#[derive(Debug, Clone)]
pub struct BackupConfig {
    /// PBKDF2 iteration count used for new exports.
    pub kdf_iterations: u32,
    /// How collections are read during export.
    pub snapshot_mode: SnapshotMode,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            kdf_iterations: DEFAULT_KDF_ITERATIONS,
            snapshot_mode: SnapshotMode::Independent,
        }
    }
}

impl BackupConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the PBKDF2 iteration count for new exports.
    #[must_use]
    pub const fn kdf_iterations(mut self, iterations: u32) -> Self {
        self.kdf_iterations = iterations;
        self
    }

    /// Sets the export snapshot mode.
    #[must_use]
    pub const fn snapshot_mode(mut self, mode: SnapshotMode) -> Self {
        self.snapshot_mode = mode;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert!(config.create_if_missing);
        assert!(config.sync_on_commit);

        let backup = BackupConfig::default();
        assert_eq!(backup.kdf_iterations, 100_000);
        assert_eq!(backup.snapshot_mode, SnapshotMode::Independent);
    }

    #[test]
    fn builder_pattern() {
        let config = Config::new().create_if_missing(false).sync_on_commit(false);
        assert!(!config.create_if_missing);
        assert!(!config.sync_on_commit);

        let backup = BackupConfig::new()
            .kdf_iterations(1_000)
            .snapshot_mode(SnapshotMode::Consistent);
        assert_eq!(backup.kdf_iterations, 1_000);
        assert_eq!(backup.snapshot_mode, SnapshotMode::Consistent);
    }
}
