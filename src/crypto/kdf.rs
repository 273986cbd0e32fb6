use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::Zeroizing;

use super::{DerivedKey, KEY_LEN, PBKDF2_ITERATIONS};

/// Derive the version 2/3 key from a PIN.
///
/// Version 2 passes the legacy salt string, version 3 its per-payload random
/// salt. Any input yields a key; a wrong PIN only shows up as a failed
/// authentication tag during decryption.
pub fn derive_latest(pin: &str, salt: &[u8]) -> DerivedKey {
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2_hmac::<Sha256>(pin.as_bytes(), salt, PBKDF2_ITERATIONS, key.as_mut_slice());
    key
}
