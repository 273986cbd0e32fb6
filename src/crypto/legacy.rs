//! Version 1 scheme: iterated SHA-256 key, XOR stream and a truncated
//! integrity digest.
//!
//! Read-only. Nothing in the crate can produce a version 1 payload; this
//! module only exists so payloads written by old app releases stay
//! decryptable. The construction is weak (64-bit tag, unsalted key) and must
//! stay byte-for-byte as it is.

use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use super::{DerivedKey, KEY_LEN, LEGACY_ROUNDS, LEGACY_SALT, LEGACY_TAG_LEN, into_text};
use crate::error::CipherError;

/// Derive the version 1 key.
///
/// `hex(sha256(pin || salt))`, then `LEGACY_ROUNDS` rounds of
/// `hex(sha256(digest || pin || salt))`. The key is the final digest.
pub fn derive_legacy(pin: &str) -> DerivedKey {
    let seed = Zeroizing::new(format!("{pin}{LEGACY_SALT}"));

    let mut raw = Sha256::digest(seed.as_bytes());
    let mut digest = Zeroizing::new(hex::encode(raw));

    for _ in 0..LEGACY_ROUNDS {
        let mut hasher = Sha256::new();
        hasher.update(digest.as_bytes());
        hasher.update(seed.as_bytes());
        raw = hasher.finalize();
        digest = Zeroizing::new(hex::encode(raw));
    }

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    key.copy_from_slice(&raw);
    raw.as_mut_slice().fill(0);
    key
}

/// Verify the integrity tag and undo the XOR stream.
pub fn decrypt_legacy(
    ciphertext: &[u8],
    iv: &[u8],
    key: &[u8; KEY_LEN],
) -> Result<Zeroizing<String>, CipherError> {
    if ciphertext.len() < LEGACY_TAG_LEN {
        return Err(CipherError::Malformed);
    }

    let (encrypted, tag) = ciphertext.split_at(ciphertext.len() - LEGACY_TAG_LEN);
    let key_hex = Zeroizing::new(hex::encode(key));

    let mut hasher = Sha256::new();
    hasher.update(hex::encode(encrypted).as_bytes());
    hasher.update(key_hex.as_bytes());
    let expected = hasher.finalize();

    // full-length comparison, no early exit
    let diff = expected[..LEGACY_TAG_LEN]
        .iter()
        .zip(tag)
        .fold(0u8, |acc, (a, b)| acc | (a ^ b));
    if diff != 0 {
        return Err(CipherError::Integrity);
    }

    let combined = combined_key(&key_hex, iv);
    let plaintext = Zeroizing::new(xor(encrypted, combined.as_slice()));

    into_text(plaintext)
}

/// Second-stage key: `sha256(hex(key) || hex(iv))`.
fn combined_key(key_hex: &str, iv: &[u8]) -> Zeroizing<[u8; 32]> {
    let mut hasher = Sha256::new();
    hasher.update(key_hex.as_bytes());
    hasher.update(hex::encode(iv).as_bytes());

    let mut combined = Zeroizing::new([0u8; 32]);
    combined.copy_from_slice(&hasher.finalize());
    combined
}

/// XOR against a repeating key. Self-inverse.
fn xor(data: &[u8], key: &[u8]) -> Vec<u8> {
    data.iter()
        .zip(key.iter().cycle())
        .map(|(d, k)| d ^ k)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds a version 1 ciphertext the way old releases did.
    fn seal_legacy(plaintext: &str, iv: &[u8], key: &[u8; KEY_LEN]) -> Vec<u8> {
        let key_hex = hex::encode(key);
        let combined = combined_key(&key_hex, iv);
        let mut out = xor(plaintext.as_bytes(), combined.as_slice());

        let digest = Sha256::digest(format!("{}{}", hex::encode(&out), key_hex).as_bytes());
        let tag = hex::decode(&hex::encode(digest)[..16]).unwrap();
        out.extend_from_slice(&tag);
        out
    }

    #[test]
    fn derive_legacy_runs_exactly_one_thousand_rounds() {
        let seed = format!("1234{LEGACY_SALT}");
        let mut digest = hex::encode(Sha256::digest(seed.as_bytes()));
        for _ in 0..1000 {
            digest = hex::encode(Sha256::digest(format!("{digest}{seed}").as_bytes()));
        }
        let expected = hex::decode(&digest[..64]).unwrap();

        assert_eq!(derive_legacy("1234").as_slice(), expected.as_slice());
    }

    #[test]
    fn derive_legacy_is_deterministic() {
        assert_eq!(*derive_legacy("0000"), *derive_legacy("0000"));
        assert_ne!(*derive_legacy("0000"), *derive_legacy("0001"));
    }

    #[test]
    fn empty_pin_still_derives() {
        let key = derive_legacy("");
        assert_ne!(*key, [0u8; KEY_LEN]);
    }

    #[test]
    fn roundtrip() {
        let key = derive_legacy("4321");
        let iv = [3u8; 16];
        let sealed = seal_legacy("abandon ability able", &iv, &key);

        let plaintext = decrypt_legacy(&sealed, &iv, &key).unwrap();
        assert_eq!(plaintext.as_str(), "abandon ability able");
    }

    #[test]
    fn plaintext_longer_than_key_cycles() {
        let key = derive_legacy("4321");
        let iv = [1u8; 16];
        let long = "word ".repeat(40);
        let sealed = seal_legacy(&long, &iv, &key);

        assert_eq!(decrypt_legacy(&sealed, &iv, &key).unwrap().as_str(), long);
    }

    #[test]
    fn wrong_key_fails_integrity() {
        let iv = [3u8; 16];
        let sealed = seal_legacy("secret", &iv, &derive_legacy("4321"));

        assert!(matches!(
            decrypt_legacy(&sealed, &iv, &derive_legacy("1234")),
            Err(CipherError::Integrity)
        ));
    }

    #[test]
    fn flipped_ciphertext_bit_fails() {
        let key = derive_legacy("4321");
        let iv = [3u8; 16];
        let sealed = seal_legacy("secret", &iv, &key);

        for i in 0..sealed.len() * 8 {
            let mut tampered = sealed.clone();
            tampered[i / 8] ^= 1 << (i % 8);
            assert!(decrypt_legacy(&tampered, &iv, &key).is_err());
        }
    }

    #[test]
    fn wrong_iv_does_not_yield_the_plaintext() {
        let key = derive_legacy("4321");
        let sealed = seal_legacy("secret", &[3u8; 16], &key);

        match decrypt_legacy(&sealed, &[4u8; 16], &key) {
            Ok(text) => assert_ne!(text.as_str(), "secret"),
            Err(err) => assert!(matches!(err, CipherError::Encoding)),
        }
    }

    #[test]
    fn too_short_is_malformed() {
        let key = derive_legacy("4321");
        assert!(matches!(
            decrypt_legacy(&[1, 2, 3], &[0u8; 16], &key),
            Err(CipherError::Malformed)
        ));
    }
}
