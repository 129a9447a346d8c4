//! The encrypted backup file.
//!
//! A backup is stored as JSON:
//!
//! ```json
//! { "ciphertext": [..], "nonce": [12 bytes], "salt": [16 bytes], "iterations": 100000 }
//! ```
//!
//! `salt` and `iterations` are absent from files written before salts were
//! stored per backup; those read back with [`LEGACY_SALT`] and the default
//! iteration count.

use crate::crypto::{check_iterations, DEFAULT_KDF_ITERATIONS, LEGACY_SALT, NONCE_SIZE};
use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

/// An encrypted, portable snapshot of the whole store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BackupEnvelope {
    /// Encrypted payload followed by the GCM tag.
    pub ciphertext: Vec<u8>,
    /// GCM nonce.
    pub nonce: [u8; NONCE_SIZE],
    /// PBKDF2 salt; `None` for legacy files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salt: Option<Vec<u8>>,
    /// PBKDF2 iteration count.
    #[serde(default = "default_iterations")]
    pub iterations: u32,
}

fn default_iterations() -> u32 {
    DEFAULT_KDF_ITERATIONS
}

impl BackupEnvelope {
    /// The salt to derive the decryption key with.
    #[must_use]
    pub fn effective_salt(&self) -> &[u8] {
        self.salt.as_deref().unwrap_or(LEGACY_SALT)
    }

    /// Returns true if the envelope predates per-backup salts.
    #[must_use]
    pub fn is_legacy(&self) -> bool {
        self.salt.is_none()
    }

    /// Renders the envelope as JSON.
    ///
    /// # Errors
    ///
    /// Returns a format error if serialization fails.
    pub fn to_json(&self) -> CoreResult<String> {
        serde_json::to_string(self)
            .map_err(|e| CoreError::format(format!("envelope encoding failed: {e}")))
    }

    /// Parses an envelope from JSON.
    ///
    /// # Errors
    ///
    /// Returns a format error for malformed JSON, unknown fields, a nonce of
    /// the wrong length, an empty salt, or an iteration count of zero or
    /// above [`MAX_KDF_ITERATIONS`](crate::crypto::MAX_KDF_ITERATIONS).
    pub fn from_json(json: &str) -> CoreResult<Self> {
        let envelope: Self = serde_json::from_str(json)
            .map_err(|e| CoreError::format(format!("malformed backup file: {e}")))?;
        if envelope.salt.as_ref().is_some_and(Vec::is_empty) {
            return Err(CoreError::format("malformed backup file: empty salt"));
        }
        check_iterations(envelope.iterations)?;
        Ok(envelope)
    }

    /// Writes the envelope to `path`, replacing any existing file.
    ///
    /// The file is written beside the target and renamed into place.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be written.
    pub fn write_to(&self, path: impl AsRef<Path>) -> CoreResult<()> {
        let path = path.as_ref();
        let json = self.to_json()?;

        let mut temp_name = path.file_name().unwrap_or_default().to_os_string();
        temp_name.push(".tmp");
        let temp_path = path.with_file_name(temp_name);

        let mut file = File::create(&temp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;
        drop(file);

        fs::rename(&temp_path, path)?;
        Ok(())
    }

    /// Reads an envelope from `path`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read and a format error if
    /// it is not a valid envelope.
    pub fn read_from(path: impl AsRef<Path>) -> CoreResult<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}
