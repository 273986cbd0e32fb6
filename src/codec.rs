//! Version dispatch between payloads and the cipher schemes.

use chrono::Utc;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::crypto::{self, LEGACY_SALT, aead, kdf, legacy};
use crate::error::{CipherError, DecryptionError, EncryptionError, RekeyError};
use crate::payload::{EncryptedPayload, TimestampStatus, Version};

/// Encrypt `plaintext` under `pin` with the latest scheme.
///
/// # Errors
///
/// Only fails when the environment is broken (no secure randomness). Such
/// an error is fatal and must not be retried.
pub fn encrypt(plaintext: &str, pin: &str) -> Result<EncryptedPayload, EncryptionError> {
    let salt = crypto::generate_salt()?;
    let key = kdf::derive_latest(pin, &salt);
    let (ciphertext, iv) = aead::encrypt_latest(plaintext.as_bytes(), &key)?;

    Ok(EncryptedPayload::sealed(
        salt,
        iv,
        ciphertext,
        Utc::now().timestamp_millis(),
    ))
}

/// Decrypt a payload of any supported version.
///
/// # Errors
///
/// Returns [`DecryptionError`] for a wrong PIN, a tampered or malformed
/// payload alike.
pub fn decrypt(payload: &EncryptedPayload, pin: &str) -> Result<Zeroizing<String>, DecryptionError> {
    match payload.timestamp_status() {
        TimestampStatus::InFuture => warn!(
            timestamp = ?payload.timestamp(),
            "payload timestamp lies in the future"
        ),
        TimestampStatus::UnusuallyOld => warn!(
            timestamp = ?payload.timestamp(),
            "payload timestamp is unusually old"
        ),
        TimestampStatus::Unknown | TimestampStatus::Plausible => {}
    }

    let version = payload.version();
    debug!(version = u8::from(version), "decrypting payload");

    open(payload, pin).map_err(|_| {
        debug!(version = u8::from(version), "payload decryption failed");
        DecryptionError
    })
}

fn open(payload: &EncryptedPayload, pin: &str) -> Result<Zeroizing<String>, CipherError> {
    match payload.version() {
        Version::V1 => {
            let key = legacy::derive_legacy(pin);
            legacy::decrypt_legacy(payload.ciphertext(), payload.iv(), &key)
        }
        Version::V2 | Version::V3 => {
            let salt = payload.salt().unwrap_or(LEGACY_SALT.as_bytes());
            let key = kdf::derive_latest(pin, salt);
            let plaintext = aead::decrypt_latest(payload.ciphertext(), payload.iv(), &key)?;
            crypto::into_text(plaintext)
        }
    }
}

/// Whether `pin` opens `payload`.
pub fn verify_pin(payload: &EncryptedPayload, pin: &str) -> bool {
    decrypt(payload, pin).is_ok()
}

/// Re-encrypt a payload under `new_pin` with the latest scheme.
///
/// Used both to change the PIN and to move v1/v2 payloads forward. The
/// input payload is left as it is; the caller replaces it.
pub fn reencrypt(
    payload: &EncryptedPayload,
    old_pin: &str,
    new_pin: &str,
) -> Result<EncryptedPayload, RekeyError> {
    let plaintext = decrypt(payload, old_pin)?;
    let upgraded = encrypt(&plaintext, new_pin)?;

    debug!(
        from = u8::from(payload.version()),
        to = u8::from(upgraded.version()),
        "payload re-encrypted"
    );
    Ok(upgraded)
}
