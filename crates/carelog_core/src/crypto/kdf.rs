//! PBKDF2-HMAC-SHA256 key derivation.

use crate::error::{CoreError, CoreResult};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Size of the derived AES-256 key in bytes.
pub const KEY_SIZE: usize = 32;
/// Size of a per-backup salt in bytes.
pub const SALT_SIZE: usize = 16;
/// Default PBKDF2 iteration count.
pub const DEFAULT_KDF_ITERATIONS: u32 = 100_000;
/// Highest PBKDF2 iteration count accepted, ten times the default.
///
/// Backup files carry their own count; anything above this is refused
/// rather than run.
pub const MAX_KDF_ITERATIONS: u32 = 10 * DEFAULT_KDF_ITERATIONS;

/// Salt used by backups written before salts were stored per file.
///
/// Only ever used to read such files; new exports draw a random salt.
pub const LEGACY_SALT: &[u8] = b"carelog-backup-salt";

/// A 256-bit symmetric key.
///
/// The bytes are zeroized when the key is dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct EncryptionKey {
    bytes: [u8; KEY_SIZE],
}

impl EncryptionKey {
    /// Creates a key from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if `bytes` is not exactly 32 bytes.
    pub fn from_bytes(bytes: &[u8]) -> CoreResult<Self> {
        let bytes: [u8; KEY_SIZE] = bytes
            .try_into()
            .map_err(|_| CoreError::invalid_key_size(bytes.len(), KEY_SIZE))?;
        Ok(Self { bytes })
    }

    /// Returns the key bytes. Never log or persist them.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }

    /// Derives a key from `passphrase` and `salt`, blocking the caller.
    ///
    /// Deterministic: the same passphrase, salt and iteration count always
    /// produce the same key. Async callers should use [`derive_key`].
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::PassphraseRequired`] for an empty passphrase and
    /// a format error for an iteration count of zero or above
    /// [`MAX_KDF_ITERATIONS`].
    pub fn derive_from_passphrase(
        passphrase: &[u8],
        salt: &[u8],
        iterations: u32,
    ) -> CoreResult<Self> {
        if passphrase.is_empty() {
            return Err(CoreError::PassphraseRequired);
        }
        check_iterations(iterations)?;

        let mut bytes = [0u8; KEY_SIZE];
        pbkdf2::pbkdf2_hmac::<Sha256>(passphrase, salt, iterations, &mut bytes);
        Ok(Self { bytes })
    }
}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Checks an iteration count against `1..=MAX_KDF_ITERATIONS`.
///
/// # Errors
///
/// Returns a format error for a count outside that range.
pub fn check_iterations(iterations: u32) -> CoreResult<()> {
    if iterations == 0 {
        return Err(CoreError::format("key derivation needs at least one iteration"));
    }
    if iterations > MAX_KDF_ITERATIONS {
        return Err(CoreError::format(format!(
            "key derivation cost {iterations} exceeds the limit of {MAX_KDF_ITERATIONS}"
        )));
    }
    Ok(())
}

/// Derives a key on the blocking thread pool.
///
/// PBKDF2 is deliberately slow; running it here keeps the async executor
/// responsive while it works.
///
/// # Errors
///
/// See [`EncryptionKey::derive_from_passphrase`].
pub async fn derive_key(passphrase: &str, salt: &[u8], iterations: u32) -> CoreResult<EncryptionKey> {
    check_iterations(iterations)?;
    let passphrase = Zeroizing::new(passphrase.as_bytes().to_vec());
    let salt = salt.to_vec();
    tokio::task::spawn_blocking(move || {
        EncryptionKey::derive_from_passphrase(&passphrase, &salt, iterations)
    })
    .await?
}

/// Draws a fresh random salt from the operating system.
#[must_use]
pub fn generate_salt() -> [u8; SALT_SIZE] {
    let mut salt = [0u8; SALT_SIZE];
    OsRng.fill_bytes(&mut salt);
    salt
}
