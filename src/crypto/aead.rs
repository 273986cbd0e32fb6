use aes_gcm::{
    Aes256Gcm, Key, Nonce,
    aead::{Aead, KeyInit},
};
use zeroize::Zeroizing;

use super::{IV_LEN, KEY_LEN, TAG_LEN, generate_iv};
use crate::error::{CipherError, EncryptionError};

/// Encrypt plaintext under a fresh random IV.
///
/// Returns the ciphertext with the 16-byte tag appended, and the IV.
pub fn encrypt_latest(
    plaintext: &[u8],
    key: &[u8; KEY_LEN],
) -> Result<(Vec<u8>, [u8; IV_LEN]), EncryptionError> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let iv = generate_iv()?;

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&iv), plaintext)
        .map_err(|_| EncryptionError::Cipher)?;

    Ok((ciphertext, iv))
}

/// Decrypt and authenticate ciphertext.
pub fn decrypt_latest(
    ciphertext: &[u8],
    iv: &[u8],
    key: &[u8; KEY_LEN],
) -> Result<Zeroizing<Vec<u8>>, CipherError> {
    if iv.len() != IV_LEN || ciphertext.len() < TAG_LEN {
        return Err(CipherError::Malformed);
    }

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));

    let plaintext = cipher
        .decrypt(Nonce::from_slice(iv), ciphertext)
        .map_err(|_| CipherError::Authentication)?;
    Ok(Zeroizing::new(plaintext))
}
