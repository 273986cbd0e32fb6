//! Cryptographic primitives behind the payload codec.
//!
//! Provides key derivation, the AES-256-GCM cipher and the read-only
//! legacy scheme used by version 1 payloads.

pub mod aead;
pub mod kdf;
pub mod legacy;

use getrandom::fill;
use zeroize::{Zeroize, Zeroizing};

use crate::error::{CipherError, EncryptionError};

/// Length of a derived key (32 bytes / 256 bits).
pub const KEY_LEN: usize = 32;
/// Length of the per-payload random salt used by version 3.
pub const SALT_LEN: usize = 32;
/// Length of the AES-GCM nonce.
pub const IV_LEN: usize = 12;
/// Length of the AES-GCM authentication tag appended to the ciphertext.
pub const TAG_LEN: usize = 16;
/// Length of the truncated integrity digest trailing a version 1 ciphertext.
pub const LEGACY_TAG_LEN: usize = 8;
/// PBKDF2-HMAC-SHA256 iteration count for versions 2 and 3.
pub const PBKDF2_ITERATIONS: u32 = 100_000;
/// Re-hash rounds of the version 1 derivation.
pub const LEGACY_ROUNDS: u32 = PBKDF2_ITERATIONS / 100;
/// Application-wide salt of versions 1 and 2.
pub const LEGACY_SALT: &str = "lightning-wallet-secure-salt-v1";

/// A 32-byte symmetric key, wiped on drop.
pub type DerivedKey = Zeroizing<[u8; KEY_LEN]>;

/// Fill buffer with cryptographically secure random bytes
fn secure_random(buf: &mut [u8]) -> Result<(), EncryptionError> {
    fill(buf).map_err(|_| EncryptionError::Entropy)
}

/// Generate a fresh version 3 salt
pub fn generate_salt() -> Result<[u8; SALT_LEN], EncryptionError> {
    let mut salt = [0u8; SALT_LEN];
    secure_random(&mut salt)?;
    Ok(salt)
}

/// Generate a fresh AES-GCM nonce
pub fn generate_iv() -> Result<[u8; IV_LEN], EncryptionError> {
    let mut iv = [0u8; IV_LEN];
    secure_random(&mut iv)?;
    Ok(iv)
}

/// Converts recovered plaintext into text without leaving copies behind.
pub(crate) fn into_text(mut bytes: Zeroizing<Vec<u8>>) -> Result<Zeroizing<String>, CipherError> {
    match String::from_utf8(std::mem::take(&mut *bytes)) {
        Ok(text) => Ok(Zeroizing::new(text)),
        Err(err) => {
            err.into_bytes().zeroize();
            Err(CipherError::Encoding)
        }
    }
}
