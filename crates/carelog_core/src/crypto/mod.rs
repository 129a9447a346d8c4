//! Passphrase key derivation and authenticated encryption.
//!
//! ## Security Model
//!
//! - PBKDF2-HMAC-SHA256 turns a passphrase into a 256-bit key; the default
//!   cost is 100 000 iterations and counts above 1 000 000 are refused
//! - every backup gets its own random salt, stored next to the ciphertext
//! - AES-256-GCM provides authenticated encryption with a fresh random
//!   96-bit nonce per call
//! - decryption fails closed: a wrong key, a wrong nonce and tampered bytes
//!   all yield the same [`CoreError::WrongPassphraseOrCorruptData`]
//! - keys are zeroized on drop and redacted from `Debug`
//!
//! ## Usage
//!
//! ```rust
//! # async fn demo() -> carelog_core::CoreResult<()> {
//! use carelog_core::crypto::{derive_key, generate_salt, Cipher};
//!
//! let salt = generate_salt();
//! let key = derive_key("correct horse", &salt, 100_000).await?;
//! let cipher = Cipher::new(&key);
//!
//! let sealed = cipher.encrypt(b"payload")?;
//! let plaintext = cipher.decrypt(&sealed.ciphertext, &sealed.nonce)?;
//! assert_eq!(plaintext, b"payload");
//! # Ok(())
//! # }
//! ```
//!
//! [`CoreError::WrongPassphraseOrCorruptData`]: crate::CoreError::WrongPassphraseOrCorruptData

mod cipher;
mod kdf;

pub use cipher::{Cipher, Sealed, NONCE_SIZE, TAG_SIZE};
pub use kdf::{
    check_iterations, derive_key, generate_salt, EncryptionKey, DEFAULT_KDF_ITERATIONS, KEY_SIZE,
    LEGACY_SALT, MAX_KDF_ITERATIONS, SALT_SIZE,
};
