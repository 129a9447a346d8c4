//! Test fixtures and store helpers.

use carelog_core::{
    BackupConfig, BackupService, Config, CycleRecord, MedicationLog, Profile, ProgressLog, Store,
    SymptomLog,
};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// PBKDF2 cost used by test backups; the production default is far slower.
pub const TEST_KDF_ITERATIONS: u32 = 1_000;

/// A test store with automatic cleanup.
pub struct TestStore {
    /// The store handle.
    pub store: Store,
    temp_dir: Option<TempDir>,
}

impl TestStore {
    /// Creates a new in-memory test store.
    pub fn memory() -> Self {
        Self {
            store: Store::open_in_memory().expect("Failed to open in-memory store"),
            temp_dir: None,
        }
    }

    /// Creates a new file-based test store in a temporary directory.
    pub async fn file() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = Store::open(temp_dir.path().join("store"), Config::default())
            .await
            .expect("Failed to open file store");
        Self {
            store,
            temp_dir: Some(temp_dir),
        }
    }

    /// Returns the store directory if file-based, None if in-memory.
    pub fn path(&self) -> Option<PathBuf> {
        self.temp_dir.as_ref().map(|d| d.path().join("store"))
    }

    /// Drops the handle and opens the same directory again.
    ///
    /// # Panics
    ///
    /// Panics for in-memory stores.
    pub async fn reopen(self) -> Self {
        let temp_dir = self.temp_dir.expect("Only file stores can be reopened");
        drop(self.store);
        let store = Store::open(temp_dir.path().join("store"), Config::default())
            .await
            .expect("Failed to reopen store");
        Self {
            store,
            temp_dir: Some(temp_dir),
        }
    }

    /// Drops the handle and returns the directory, kept alive by the guard.
    ///
    /// # Panics
    ///
    /// Panics for in-memory stores.
    pub fn close(self) -> (TempDir, PathBuf) {
        let temp_dir = self.temp_dir.expect("Only file stores can be closed");
        drop(self.store);
        let path = temp_dir.path().join("store");
        (temp_dir, path)
    }

    /// A backup service over this store with a cheap key derivation.
    pub fn backups(&self) -> BackupService {
        BackupService::new(self.store.clone(), fast_backup_config())
    }
}

impl std::ops::Deref for TestStore {
    type Target = Store;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

/// Backup configuration with [`TEST_KDF_ITERATIONS`].
pub fn fast_backup_config() -> BackupConfig {
    BackupConfig::default().kdf_iterations(TEST_KDF_ITERATIONS)
}

/// Opens a store at `path`, panicking on failure.
pub async fn open_store(path: &Path) -> Store {
    Store::open(path, Config::default())
        .await
        .expect("Failed to open store")
}

/// A profile with fixed values.
pub fn sample_profile() -> Profile {
    Profile {
        name: "Ana".to_string(),
        age: 34,
        height: 168.5,
        weight: 61.2,
    }
}

/// A symptom log at `timestamp`.
pub fn sample_symptom(timestamp: u64) -> SymptomLog {
    SymptomLog {
        timestamp,
        symptom: format!("symptom-{timestamp}"),
        severity: (timestamp % 11) as u8,
        notes: String::new(),
    }
}

/// A medication log at `timestamp`.
pub fn sample_medication(timestamp: u64) -> MedicationLog {
    MedicationLog {
        timestamp,
        medication: "ibuprofen".to_string(),
        dosage: "200mg".to_string(),
        taken: timestamp % 2 == 0,
    }
}

/// A progress log at `timestamp`.
pub fn sample_progress(timestamp: u64) -> ProgressLog {
    ProgressLog {
        timestamp,
        weight: 60.0 + (timestamp % 10) as f64 / 2.0,
        notes: "weekly".to_string(),
    }
}

/// An open cycle without an id.
pub fn sample_cycle(start: &str) -> CycleRecord {
    CycleRecord::open(start, "")
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;

    /// One profile and symptom logs at 100 and 200; everything else empty.
    pub async fn profile_and_two_symptoms(store: &Store) {
        store.put(sample_profile()).await.expect("Failed to put profile");
        for timestamp in [100, 200] {
            store
                .put(sample_symptom(timestamp))
                .await
                .expect("Failed to put symptom");
        }
    }

    /// Fills every collection with `per_collection` records.
    pub async fn populate(store: &Store, per_collection: u64) {
        store.put(sample_profile()).await.expect("Failed to put profile");
        for i in 1..=per_collection {
            let timestamp = i * 1_000;
            store.put(sample_symptom(timestamp)).await.expect("put symptom");
            store
                .put(sample_medication(timestamp))
                .await
                .expect("put medication");
            store
                .put(sample_progress(timestamp))
                .await
                .expect("put progress");
            store
                .put(sample_cycle(&format!("2024-01-{:02}", i.min(28))))
                .await
                .expect("put cycle");
        }
    }
}
