use thiserror::Error;

/// A payload could not be decrypted.
///
/// Deliberately carries no detail: a wrong PIN, a tampered or truncated
/// payload and a mismatched version all look the same to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("failed to decrypt: invalid PIN or corrupted data")]
pub struct DecryptionError;

/// The environment could not provide what encryption needs.
///
/// Not a business condition. Callers should abort, not retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EncryptionError {
    #[error("OS random generator unavailable")]
    Entropy,
    #[error("cipher rejected the plaintext")]
    Cipher,
}

/// Failure while moving a secret to a new PIN or scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RekeyError {
    #[error(transparent)]
    Decryption(#[from] DecryptionError),
    #[error(transparent)]
    Encryption(#[from] EncryptionError),
}

/// Why a cipher refused a payload. Never leaves the crate.
#[derive(Debug, Error)]
pub(crate) enum CipherError {
    #[error("authentication tag mismatch")]
    Authentication,
    #[error("integrity digest mismatch")]
    Integrity,
    #[error("malformed payload")]
    Malformed,
    #[error("plaintext is not valid UTF-8")]
    Encoding,
}
