//! Encrypted backup export and import.
//!
//! ## Export
//!
//! 1. read the five collections (see [`SnapshotMode`])
//! 2. serialize them into one payload ([`codec`])
//! 3. draw a fresh salt and derive a key from the passphrase
//! 4. seal the payload with AES-256-GCM into a [`BackupEnvelope`]
//!
//! ## Import
//!
//! The envelope is decrypted and decoded in full before anything is written,
//! so a wrong passphrase or a damaged file leaves the store untouched. The
//! records are then merged: each is put at its own key, replacing a match
//! and inserting otherwise. Importing the same backup twice changes nothing
//! the second time.
//!
//! A storage fault during the merge stops it; records merged before the
//! fault stay in the store.

pub mod codec;
mod envelope;

pub use envelope::BackupEnvelope;

use crate::config::{BackupConfig, SnapshotMode};
use crate::crypto::{check_iterations, derive_key, generate_salt, Cipher};
use crate::error::{CoreError, CoreResult};
use crate::record::Record;
use crate::snapshot::Snapshot;
use crate::store::Store;
use tracing::{debug, info, instrument};

/// Number of records merged per collection by an import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportStats {
    /// Whether a profile was written.
    pub profile: bool,
    /// Symptom logs written.
    pub symptom_logs: usize,
    /// Medication logs written.
    pub medication_logs: usize,
    /// Cycles written.
    pub cycles: usize,
    /// Progress logs written.
    pub progress_logs: usize,
}

impl ImportStats {
    /// Total records written.
    #[must_use]
    pub fn total(&self) -> usize {
        usize::from(self.profile)
            + self.symptom_logs
            + self.medication_logs
            + self.cycles
            + self.progress_logs
    }
}

/// Exports the store into encrypted envelopes and merges them back.
///
/// # Example
///
/// ```rust
/// # async fn demo() -> carelog_core::CoreResult<()> {
/// use carelog_core::{BackupConfig, BackupService, Store};
///
/// let store = Store::open_in_memory()?;
/// let backups = BackupService::new(store, BackupConfig::default());
///
/// let envelope = backups.export(Some("abc123")).await?;
/// let stats = backups.import(&envelope, Some("abc123")).await?;
/// assert_eq!(stats.total(), 0);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct BackupService {
    store: Store,
    config: BackupConfig,
}

impl BackupService {
    /// Creates a backup service over `store`.
    #[must_use]
    pub fn new(store: Store, config: BackupConfig) -> Self {
        Self { store, config }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &BackupConfig {
        &self.config
    }

    /// Exports every collection into a new encrypted envelope.
    ///
    /// # Errors
    ///
    /// - [`CoreError::PassphraseRequired`] if `passphrase` is absent or empty
    /// - a storage or format error if the collections cannot be read
    #[instrument(skip(self, passphrase), fields(mode = ?self.config.snapshot_mode))]
    pub async fn export(&self, passphrase: Option<&str>) -> CoreResult<BackupEnvelope> {
        let passphrase = require_passphrase(passphrase)?;

        let snapshot = match self.config.snapshot_mode {
            SnapshotMode::Independent => self.store.read_independently().await?,
            SnapshotMode::Consistent => self.store.snapshot().await?,
        };
        let payload = codec::serialize(&snapshot)?;
        debug!(payload_len = payload.len(), "serialized snapshot");

        let salt = generate_salt();
        let key = derive_key(passphrase, &salt, self.config.kdf_iterations).await?;
        let sealed = Cipher::new(&key).encrypt(&payload)?;

        info!(records = snapshot.record_count(), "exported backup");
        Ok(BackupEnvelope {
            ciphertext: sealed.ciphertext,
            nonce: sealed.nonce,
            salt: Some(salt.to_vec()),
            iterations: self.config.kdf_iterations,
        })
    }

    /// Decrypts `envelope` and merges its records into the store.
    ///
    /// # Errors
    ///
    /// - [`CoreError::PassphraseRequired`] if `passphrase` is absent or empty
    /// - [`CoreError::WrongPassphraseOrCorruptData`] if authentication fails
    /// - a format error if the decrypted payload is malformed or the envelope
    ///   asks for more than [`MAX_KDF_ITERATIONS`](crate::crypto::MAX_KDF_ITERATIONS)
    /// - [`CoreError::InvalidRecord`] if any backed-up record is out of range;
    ///   the store is left untouched
    /// - a storage fault if a put fails
    #[instrument(skip(self, envelope, passphrase), fields(legacy = envelope.is_legacy()))]
    pub async fn import(
        &self,
        envelope: &BackupEnvelope,
        passphrase: Option<&str>,
    ) -> CoreResult<ImportStats> {
        let passphrase = require_passphrase(passphrase)?;

        let snapshot = self.open_envelope(envelope, passphrase).await?;
        // an invalid record anywhere aborts before the first put
        snapshot.validate()?;
        let stats = self.merge(snapshot).await?;

        info!(records = stats.total(), "imported backup");
        Ok(stats)
    }

    /// Decrypts and decodes `envelope` without touching the store.
    ///
    /// # Errors
    ///
    /// Same as [`import`](Self::import), minus storage faults.
    pub async fn decrypt(
        &self,
        envelope: &BackupEnvelope,
        passphrase: Option<&str>,
    ) -> CoreResult<Snapshot> {
        let passphrase = require_passphrase(passphrase)?;
        self.open_envelope(envelope, passphrase).await
    }

    async fn open_envelope(
        &self,
        envelope: &BackupEnvelope,
        passphrase: &str,
    ) -> CoreResult<Snapshot> {
        // envelopes built in code skip from_json, so the cost is checked again here
        check_iterations(envelope.iterations)?;
        let key = derive_key(passphrase, envelope.effective_salt(), envelope.iterations).await?;
        let payload = Cipher::new(&key).decrypt(&envelope.ciphertext, &envelope.nonce)?;
        codec::deserialize(&payload)
    }

    async fn merge(&self, snapshot: Snapshot) -> CoreResult<ImportStats> {
        let mut stats = ImportStats::default();

        if let Some(profile) = snapshot.profile {
            self.store.put(profile).await?;
            stats.profile = true;
        }
        stats.symptom_logs = self.put_each(snapshot.symptom_logs).await?;
        stats.medication_logs = self.put_each(snapshot.medication_logs).await?;
        stats.cycles = self.put_each(snapshot.cycles).await?;
        stats.progress_logs = self.put_each(snapshot.progress_logs).await?;

        Ok(stats)
    }

    async fn put_each<R: Record>(&self, records: Vec<R>) -> CoreResult<usize> {
        let count = records.len();
        for record in records {
            self.store.put(record).await?;
        }
        debug!(collection = %R::KIND, count, "merged records");
        Ok(count)
    }
}

fn require_passphrase(passphrase: Option<&str>) -> CoreResult<&str> {
    match passphrase {
        Some(p) if !p.is_empty() => Ok(p),
        _ => Err(CoreError::PassphraseRequired),
    }
}
