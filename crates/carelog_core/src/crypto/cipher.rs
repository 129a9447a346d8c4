//! AES-256-GCM authenticated encryption.

use super::kdf::EncryptionKey;
use crate::error::{CoreError, CoreResult};
use aes_gcm::{
    aead::{generic_array::GenericArray, Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use rand::rngs::OsRng;
use rand::RngCore;

/// Size of the GCM nonce in bytes.
pub const NONCE_SIZE: usize = 12;
/// Size of the GCM authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

/// Output of [`Cipher::encrypt`].
///
/// The ciphertext carries the 16-byte tag at its end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sealed {
    /// Encrypted bytes followed by the authentication tag.
    pub ciphertext: Vec<u8>,
    /// Nonce the ciphertext was sealed under.
    pub nonce: [u8; NONCE_SIZE],
}

/// AES-256-GCM bound to one key.
pub struct Cipher {
    cipher: Aes256Gcm,
}

impl Cipher {
    /// Creates a cipher for `key`.
    #[must_use]
    pub fn new(key: &EncryptionKey) -> Self {
        let cipher = Aes256Gcm::new(GenericArray::from_slice(key.as_bytes()));
        Self { cipher }
    }

    /// Encrypts `plaintext` under a fresh random nonce.
    ///
    /// # Errors
    ///
    /// Fails only if the plaintext exceeds the GCM message limit.
    pub fn encrypt(&self, plaintext: &[u8]) -> CoreResult<Sealed> {
        let mut nonce = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce);

        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext)
            .map_err(|_| CoreError::format("payload too large to encrypt"))?;

        Ok(Sealed { ciphertext, nonce })
    }

    /// Decrypts and authenticates `ciphertext`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::WrongPassphraseOrCorruptData`] if the key or
    /// nonce is wrong or any byte was altered.
    pub fn decrypt(&self, ciphertext: &[u8], nonce: &[u8; NONCE_SIZE]) -> CoreResult<Vec<u8>> {
        if ciphertext.len() < TAG_SIZE {
            return Err(CoreError::WrongPassphraseOrCorruptData);
        }

        self.cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CoreError::WrongPassphraseOrCorruptData)
    }
}

impl std::fmt::Debug for Cipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cipher").finish_non_exhaustive()
    }
}
