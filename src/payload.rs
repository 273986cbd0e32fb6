//! The versioned encrypted payload.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::crypto::{IV_LEN, SALT_LEN};

/// Payloads stamped further ahead than this are reported as [`TimestampStatus::InFuture`].
pub const MAX_FUTURE_SKEW_MS: i64 = 5 * 60 * 1000;
/// Payloads older than this are reported as [`TimestampStatus::UnusuallyOld`].
pub const MAX_AGE_MS: i64 = 10 * 365 * 24 * 60 * 60 * 1000;

/// Encryption scheme a payload was written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Version {
    /// Iterated SHA-256 key, XOR stream, 8-byte integrity tag.
    V1 = 1,
    /// PBKDF2 over the fixed legacy salt, AES-256-GCM.
    V2 = 2,
    /// PBKDF2 over a random per-payload salt, AES-256-GCM.
    V3 = 3,
}

impl Version {
    /// The only version ever written.
    pub const LATEST: Version = Version::V3;

    /// Payloads written before versioning carry no version field.
    fn unversioned() -> Self {
        Version::V1
    }

    pub fn scheme(&self) -> &'static str {
        match self {
            Version::V1 => "sha256-iterated + xor (legacy)",
            Version::V2 => "pbkdf2-sha256 (fixed salt) + aes-256-gcm",
            Version::V3 => "pbkdf2-sha256 (random salt) + aes-256-gcm",
        }
    }
}

impl TryFrom<u8> for Version {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Version::V1),
            2 => Ok(Version::V2),
            3 => Ok(Version::V3),
            other => Err(format!("unsupported payload version: {other}")),
        }
    }
}

impl From<Version> for u8 {
    fn from(version: Version) -> Self {
        version as u8
    }
}

/// How believable a payload's encryption timestamp is.
///
/// Advisory only; decryption never depends on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampStatus {
    Unknown,
    Plausible,
    InFuture,
    UnusuallyOld,
}

/// An encrypted secret together with everything needed to decrypt it
/// except the PIN.
///
/// Immutable: changing the secret or the PIN means producing a new payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedPayload {
    #[serde(default = "Version::unversioned")]
    version: Version,
    #[serde(rename = "data", alias = "ciphertext")]
    ciphertext: Vec<u8>,
    iv: Vec<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    salt: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timestamp: Option<i64>,
}

impl EncryptedPayload {
    /// Assembles a freshly encrypted payload. Always the latest version.
    pub(crate) fn sealed(
        salt: [u8; SALT_LEN],
        iv: [u8; IV_LEN],
        ciphertext: Vec<u8>,
        timestamp: i64,
    ) -> Self {
        Self {
            version: Version::LATEST,
            ciphertext,
            iv: iv.to_vec(),
            salt: Some(salt.to_vec()),
            timestamp: Some(timestamp),
        }
    }

    /// Rebuilds a stored payload from its fields, for callers that keep
    /// payloads in their own format.
    pub fn from_parts(
        version: Version,
        ciphertext: Vec<u8>,
        iv: Vec<u8>,
        salt: Option<Vec<u8>>,
        timestamp: Option<i64>,
    ) -> Self {
        Self {
            version,
            ciphertext,
            iv,
            salt,
            timestamp,
        }
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    pub fn iv(&self) -> &[u8] {
        &self.iv
    }

    pub fn salt(&self) -> Option<&[u8]> {
        self.salt.as_deref()
    }

    /// Milliseconds since the Unix epoch at encryption time.
    pub fn timestamp(&self) -> Option<i64> {
        self.timestamp
    }

    /// Whether the payload should be re-encrypted with the latest scheme.
    pub fn needs_upgrade(&self) -> bool {
        self.version != Version::LATEST
    }

    pub fn timestamp_status(&self) -> TimestampStatus {
        self.timestamp_status_at(Utc::now().timestamp_millis())
    }

    pub fn timestamp_status_at(&self, now_ms: i64) -> TimestampStatus {
        match self.timestamp {
            None | Some(0) => TimestampStatus::Unknown,
            Some(ts) if ts > now_ms.saturating_add(MAX_FUTURE_SKEW_MS) => {
                TimestampStatus::InFuture
            }
            Some(ts) if now_ms.saturating_sub(ts) > MAX_AGE_MS => TimestampStatus::UnusuallyOld,
            Some(_) => TimestampStatus::Plausible,
        }
    }
}
