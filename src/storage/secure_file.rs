//! Remote file records for the GitLab Secure Files backend.
//!
//! A `SecureFile` is one entry of the project's secure-files list as the
//! API reports it. `download` rebuilds the file locally: nested names
//! like `certs/distribution/cert.p12` recreate their directory chain
//! under the working directory, the sha256 checksum is verified before
//! the file lands at its final path, and the result is readable only by
//! the owner.

use std::fs;
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::errors::{MatchVaultError, Result};
use crate::storage::gitlab::GitLabClient;

fn default_checksum_algorithm() -> String {
    "sha256".to_string()
}

/// One file in a project's secure-files list.
#[derive(Debug, Clone, Deserialize)]
pub struct SecureFile {
    pub id: u64,

    /// Storage name, possibly nested (`certs/distribution/cert.p12`).
    pub name: String,

    /// Lowercase hex digest of the file contents.
    pub checksum: String,

    #[serde(default = "default_checksum_algorithm")]
    pub checksum_algorithm: String,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl SecureFile {
    /// Resolve the local path this file maps to under `working_directory`.
    ///
    /// Every component of the name must be a plain path segment; absolute
    /// names and `..` are rejected so a hostile name cannot escape the
    /// working directory.
    pub fn local_path(&self, working_directory: &Path) -> Result<PathBuf> {
        if self.name.is_empty() {
            return Err(MatchVaultError::UnsafeFileName {
                name: self.name.clone(),
            });
        }

        let relative = Path::new(&self.name);
        for component in relative.components() {
            match component {
                Component::Normal(_) => {}
                _ => {
                    return Err(MatchVaultError::UnsafeFileName {
                        name: self.name.clone(),
                    });
                }
            }
        }

        Ok(working_directory.join(relative))
    }

    /// Download this file into the working directory.
    ///
    /// The body is fetched to a temp sibling, checksummed, and only then
    /// renamed into place, so a corrupted transfer never leaves a
    /// plausible-looking file behind.
    pub fn download(&self, client: &GitLabClient, working_directory: &Path) -> Result<PathBuf> {
        let dest = self.local_path(working_directory)?;
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp = dest.with_file_name(format!(
            ".{}.download",
            dest.file_name().unwrap_or_default().to_string_lossy()
        ));

        client.download_to(self.id, &tmp)?;

        if let Err(e) = self.verify_checksum(&tmp) {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }

        fs::rename(&tmp, &dest)?;
        set_owner_only(&dest)?;

        Ok(dest)
    }

    /// Verify the stored checksum against the file at `path`.
    pub fn verify_checksum(&self, path: &Path) -> Result<()> {
        if !self.checksum_algorithm.eq_ignore_ascii_case("sha256") {
            return Err(MatchVaultError::UnsupportedChecksum {
                name: self.name.clone(),
                algorithm: self.checksum_algorithm.clone(),
            });
        }

        let contents = fs::read(path)?;
        let computed = hex::encode(Sha256::digest(&contents));
        if !computed.eq_ignore_ascii_case(&self.checksum) {
            return Err(MatchVaultError::ChecksumMismatch {
                name: self.name.clone(),
            });
        }

        Ok(())
    }
}

/// Restrict a downloaded secret to owner read/write.
fn set_owner_only(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(path)?.permissions();
        perms.set_mode(0o600);
        fs::set_permissions(path, perms)?;
    }

    #[cfg(not(unix))]
    let _ = path;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(name: &str, checksum: &str) -> SecureFile {
        SecureFile {
            id: 1,
            name: name.into(),
            checksum: checksum.into(),
            checksum_algorithm: "sha256".into(),
            created_at: None,
        }
    }

    #[test]
    fn deserializes_the_api_shape() {
        let json = r#"{
            "id": 42,
            "name": "certs/distribution/cert.p12",
            "checksum": "abc123",
            "checksum_algorithm": "sha256",
            "created_at": "2024-03-12T14:02:00.000Z"
        }"#;

        let file: SecureFile = serde_json::from_str(json).unwrap();
        assert_eq!(file.id, 42);
        assert_eq!(file.name, "certs/distribution/cert.p12");
        assert!(file.created_at.is_some());
    }

    #[test]
    fn nested_names_map_into_the_working_directory() {
        let file = sample("profiles/appstore/app.mobileprovision", "x");
        let path = file.local_path(Path::new("/work")).unwrap();
        assert_eq!(
            path,
            Path::new("/work/profiles/appstore/app.mobileprovision")
        );
    }

    #[test]
    fn traversal_names_are_rejected() {
        for name in ["../outside.p12", "/etc/passwd", "certs/../../x.cer", ""] {
            let file = sample(name, "x");
            assert!(file.local_path(Path::new("/work")).is_err(), "{name}");
        }
    }

    #[test]
    fn checksum_accepts_matching_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.cer");
        fs::write(&path, b"certificate bytes").unwrap();

        let digest = hex::encode(Sha256::digest(b"certificate bytes"));
        let file = sample("f.cer", &digest);
        assert!(file.verify_checksum(&path).is_ok());
    }

    #[test]
    fn checksum_mismatch_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.cer");
        fs::write(&path, b"tampered bytes").unwrap();

        let file = sample("f.cer", "deadbeef");
        let err = file.verify_checksum(&path).unwrap_err();
        assert!(matches!(err, MatchVaultError::ChecksumMismatch { .. }));
    }

    #[test]
    fn unknown_checksum_algorithms_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.cer");
        fs::write(&path, b"bytes").unwrap();

        let mut file = sample("f.cer", "whatever");
        file.checksum_algorithm = "crc32".into();

        let err = file.verify_checksum(&path).unwrap_err();
        assert!(matches!(err, MatchVaultError::UnsupportedChecksum { .. }));
    }
}
