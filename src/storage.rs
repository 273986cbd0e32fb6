//! Payload file persistence.

use anyhow::{Context, Result};
use getrandom::fill;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::{EncryptedPayload, format};

/// A single encrypted payload kept in a file.
///
/// Writes are atomic: the payload is written to a temporary sibling file,
/// synced, and renamed over the target, so a crash leaves either the old or
/// the new payload and never a torn one.
#[derive(Debug, Clone)]
pub struct Storage {
    path: PathBuf,
}

impl Storage {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads and parses the stored payload.
    pub fn load_payload(&self) -> Result<EncryptedPayload> {
        let data = self.load()?;
        format::parse(&data).with_context(|| format!("in {}", self.path.display()))
    }

    /// Replaces the stored payload.
    pub fn save_payload(&self, payload: &EncryptedPayload) -> Result<()> {
        self.save(&format::serialize(payload)?)
    }

    pub fn load(&self) -> Result<Vec<u8>> {
        fs::read(&self.path).with_context(|| format!("failed to read {}", self.path.display()))
    }

    /// Atomically replaces the file content, creating parent directories.
    pub fn save(&self, data: &[u8]) -> Result<()> {
        let parent = self.parent_dir();
        fs::create_dir_all(parent)?;

        let tmp_path = self.random_tmp_path()?;

        let mut tmp_file = create_private(&tmp_path).context("failed to create temporary file")?;
        tmp_file.write_all(data)?;
        tmp_file.sync_all()?;
        drop(tmp_file);

        if let Err(e) = self.atomic_replace(&tmp_path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }

        File::open(parent)?.sync_all()?;

        Ok(())
    }

    /// Directory holding the payload; `.` for a bare file name.
    fn parent_dir(&self) -> &Path {
        self.path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
    }

    /// `<file name>.tmp.<16 random hex chars>` next to the target.
    fn random_tmp_path(&self) -> Result<PathBuf> {
        let mut buf = [0u8; 8];
        fill(&mut buf).context("OS random generator unavailable")?;

        let file_name = self
            .path
            .file_name()
            .context("payload path has no file name")?
            .to_string_lossy();

        Ok(self
            .path
            .with_file_name(format!("{}.tmp.{}", file_name, hex::encode(buf))))
    }

    #[cfg(target_os = "windows")]
    fn atomic_replace(&self, tmp_path: &Path) -> Result<()> {
        use std::ffi::OsStr;
        use std::os::windows::ffi::OsStrExt;
        use windows_sys::Win32::Storage::FileSystem::{REPLACEFILE_WRITE_THROUGH, ReplaceFileW};

        if !self.path.exists() {
            fs::rename(tmp_path, &self.path)?;
            return Ok(());
        }

        fn to_wide(s: &OsStr) -> Vec<u16> {
            s.encode_wide().chain(std::iter::once(0)).collect()
        }

        let target_w = to_wide(self.path.as_os_str());
        let tmp_w = to_wide(tmp_path.as_os_str());

        // SAFETY: both buffers are NUL-terminated UTF-16 and outlive the call.
        let result = unsafe {
            ReplaceFileW(
                target_w.as_ptr(),
                tmp_w.as_ptr(),
                std::ptr::null(),
                REPLACEFILE_WRITE_THROUGH,
                std::ptr::null(),
                std::ptr::null(),
            )
        };

        if result == 0 {
            let err = std::io::Error::last_os_error();
            return Err(err).context("atomic replace failed");
        }

        Ok(())
    }

    #[cfg(not(target_os = "windows"))]
    fn atomic_replace(&self, tmp_path: &Path) -> Result<()> {
        fs::rename(tmp_path, &self.path)?;
        Ok(())
    }
}

/// Creates a new file readable only by the owner where the platform allows.
fn create_private(path: &Path) -> std::io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    options.open(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Version, decrypt, encrypt};
    use tempfile::tempdir;

    #[test]
    fn payload_roundtrip_through_file() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(dir.path().join("wallet-secret.json"));

        let payload = encrypt("abandon abandon about", "1234").unwrap();
        storage.save_payload(&payload).unwrap();

        let loaded = storage.load_payload().unwrap();
        assert_eq!(loaded, payload);
        assert_eq!(decrypt(&loaded, "1234").unwrap().as_str(), "abandon abandon about");
    }

    #[test]
    fn loads_legacy_json_written_elsewhere() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("old.json");
        fs::write(&path, br#"{"data":[1,2,3,4,5,6,7,8],"iv":[0,0]}"#).unwrap();

        let loaded = Storage::new(path).load_payload().unwrap();
        assert_eq!(loaded.version(), Version::V1);
    }

    #[test]
    fn load_fails_if_file_does_not_exist() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(dir.path().join("missing.json"));

        assert!(!storage.exists());
        assert!(storage.load_payload().is_err());
    }

    #[test]
    fn load_fails_on_garbage() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(dir.path().join("garbage.json"));
        storage.save(b"not a payload").unwrap();

        assert!(storage.exists());
        assert!(storage.load_payload().is_err());
    }

    #[test]
    fn save_replaces_existing_payload() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(dir.path().join("wallet-secret.json"));

        let first = encrypt("first", "1234").unwrap();
        let second = encrypt("second", "1234").unwrap();
        storage.save_payload(&first).unwrap();
        storage.save_payload(&second).unwrap();

        assert_eq!(storage.load_payload().unwrap(), second);
    }

    #[test]
    fn tmp_file_is_removed_after_success() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(dir.path().join("wallet-secret.json"));
        storage.save(b"{}").unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();

        assert_eq!(entries, vec!["wallet-secret.json"]);
    }

    #[test]
    fn tmp_names_are_unique_siblings() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wallet-secret.json");
        let storage = Storage::new(path.clone());

        let a = storage.random_tmp_path().unwrap();
        let b = storage.random_tmp_path().unwrap();

        assert_ne!(a, b);
        assert_ne!(a, path);
        assert_eq!(a.parent(), path.parent());
    }

    #[test]
    fn parent_directory_is_created() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b").join("wallet-secret.json");

        Storage::new(nested.clone()).save(b"{}").unwrap();

        assert!(nested.exists());
    }

    #[test]
    fn bare_file_name_resolves_to_current_dir() {
        let storage = Storage::new(PathBuf::from("wallet-secret.json"));
        assert_eq!(storage.parent_dir(), Path::new("."));

        let nested = Storage::new(PathBuf::from("wallets/wallet-secret.json"));
        assert_eq!(nested.parent_dir(), Path::new("wallets"));
    }

    #[cfg(unix)]
    #[test]
    fn file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("wallet-secret.json");
        Storage::new(path.clone()).save(b"{}").unwrap();

        let mode = fs::metadata(path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
