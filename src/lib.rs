//! PIN-based encryption of wallet recovery material.
//!
//! New secrets are always sealed with PBKDF2-HMAC-SHA256 and AES-256-GCM
//! under a random per-payload salt (version 3). Payloads written by earlier
//! releases (version 1 and 2) remain decryptable forever but are never
//! produced again.
//!
//! ```no_run
//! let payload = pinseal::encrypt("correct horse battery staple", "1234")?;
//! assert_eq!(&*pinseal::decrypt(&payload, "1234")?, "correct horse battery staple");
//! assert!(!pinseal::verify_pin(&payload, "0000"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod codec;
mod crypto;
mod error;
pub mod format;
mod payload;
mod storage;

pub use crate::codec::{decrypt, encrypt, reencrypt, verify_pin};
pub use crate::error::{DecryptionError, EncryptionError, RekeyError};
pub use crate::payload::{
    EncryptedPayload, MAX_AGE_MS, MAX_FUTURE_SKEW_MS, TimestampStatus, Version,
};
pub use crate::storage::Storage;
use anyhow::{Context, Result};
use directories::ProjectDirs;

/// File name of the payload inside the platform data directory.
pub const DEFAULT_FILE_NAME: &str = "wallet-secret.json";

/// Storage at the platform's data directory for `pinseal`.
pub fn default_storage() -> Result<Storage> {
    let project_dirs =
        ProjectDirs::from("", "", "pinseal").context("could not determine platform directories")?;

    Ok(Storage::new(project_dirs.data_dir().join(DEFAULT_FILE_NAME)))
}
