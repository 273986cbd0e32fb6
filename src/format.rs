//! On-disk representation of an encrypted payload.
//!
//! Payload files are JSON objects:
//! ```text
//! { "version": 3, "data": [..], "iv": [..], "salt": [..], "timestamp": 1760000000000 }
//! ```
//! Byte fields are arrays of integers. `version` may be absent (legacy, read
//! as 1), `ciphertext` is accepted in place of `data`, and `salt` is only
//! written for version 3.

use anyhow::{Context, Result, bail};

use crate::EncryptedPayload;

/// Parses a payload file.
///
/// # Errors
///
/// Returns an error if:
/// - The file is empty
/// - The content is not a JSON payload object
/// - The version is unsupported
pub fn parse(data: &[u8]) -> Result<EncryptedPayload> {
    if data.iter().all(u8::is_ascii_whitespace) {
        bail!("payload file is empty");
    }

    serde_json::from_slice(data).context("invalid payload file")
}

/// Serializes a payload to pretty-printed JSON.
pub fn serialize(payload: &EncryptedPayload) -> Result<Vec<u8>> {
    serde_json::to_vec_pretty(payload).context("failed to serialize payload")
}
