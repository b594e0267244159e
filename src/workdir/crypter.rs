//! In-place encryption and decryption of a working directory.
//!
//! Both operations walk the managed secret files and rewrite each one
//! through a temp-file-then-rename so a crash never leaves a half-written
//! secret. Files already in the target state are skipped, which makes
//! both operations idempotent: running encrypt twice never double-wraps
//! a file, and decrypt leaves plaintext files alone.

use std::fs;
use std::path::{Path, PathBuf};

use crate::crypto::{self, envelope, EnvelopeVersion};
use crate::errors::{MatchVaultError, Result};
use crate::workdir;

/// Encrypt every managed file under `working_directory` in place.
///
/// Files already carrying an envelope marker are skipped. `force_legacy`
/// emits the V1 (OpenSSL-compatible) format instead of V2. Returns the
/// paths that were actually rewritten.
pub fn encrypt_files(
    working_directory: &Path,
    password: &str,
    force_legacy: bool,
) -> Result<Vec<PathBuf>> {
    ensure_password(password)?;

    let version = if force_legacy {
        EnvelopeVersion::V1
    } else {
        EnvelopeVersion::V2
    };

    let mut changed = Vec::new();
    for path in workdir::secret_files(working_directory)? {
        let data = fs::read(&path)
            .map_err(|e| file_error("encrypt", working_directory, &path, e.into()))?;

        if envelope::is_encrypted(&data) {
            continue;
        }

        let sealed = crypto::encrypt_with_version(&data, password, version)
            .map_err(|e| file_error("encrypt", working_directory, &path, e))?;
        write_in_place(&path, &sealed)
            .map_err(|e| file_error("encrypt", working_directory, &path, e))?;
        changed.push(path);
    }

    Ok(changed)
}

/// Decrypt every managed file under `working_directory` in place.
///
/// Files without an envelope marker are treated as already-plaintext and
/// skipped. Returns the paths that were actually rewritten.
pub fn decrypt_files(working_directory: &Path, password: &str) -> Result<Vec<PathBuf>> {
    ensure_password(password)?;

    let mut changed = Vec::new();
    for path in workdir::secret_files(working_directory)? {
        let data = fs::read(&path)
            .map_err(|e| file_error("decrypt", working_directory, &path, e.into()))?;

        if !envelope::is_encrypted(&data) {
            continue;
        }

        let plaintext = crypto::decrypt(&data, password)
            .map_err(|e| file_error("decrypt", working_directory, &path, e))?;
        write_in_place(&path, &plaintext)
            .map_err(|e| file_error("decrypt", working_directory, &path, e))?;
        changed.push(path);
    }

    Ok(changed)
}

/// Reject an empty password before reading or writing anything.
fn ensure_password(password: &str) -> Result<()> {
    if password.is_empty() {
        return Err(MatchVaultError::NoPassword);
    }
    Ok(())
}

/// Rewrite `path` via a temp file in the same directory, then rename.
pub(crate) fn write_in_place(path: &Path, data: &[u8]) -> Result<()> {
    let parent = path.parent().unwrap_or(Path::new("."));
    let tmp_path = parent.join(format!(
        ".{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy()
    ));

    fs::write(&tmp_path, data)?;
    fs::rename(&tmp_path, path)?;

    Ok(())
}

/// Attach the failing file's storage name to a per-file error.
fn file_error(
    operation: &'static str,
    working_directory: &Path,
    path: &Path,
    source: MatchVaultError,
) -> MatchVaultError {
    let file = workdir::relative_name(working_directory, path)
        .unwrap_or_else(|_| path.display().to_string());

    MatchVaultError::FileCrypto {
        operation,
        file,
        source: Box::new(source),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    const PASSWORD: &str = "testpassword";

    fn workdir_with_files() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("certs/distribution")).unwrap();
        fs::create_dir_all(dir.path().join("profiles/appstore")).unwrap();
        fs::write(
            dir.path().join("certs/distribution/cert.p12"),
            b"p12 contents",
        )
        .unwrap();
        fs::write(
            dir.path().join("profiles/appstore/app.mobileprovision"),
            b"<plist>profile</plist>",
        )
        .unwrap();
        fs::write(dir.path().join("README.md"), b"unmanaged").unwrap();
        dir
    }

    #[test]
    fn encrypt_then_decrypt_restores_contents() {
        let dir = workdir_with_files();

        let encrypted = encrypt_files(dir.path(), PASSWORD, false).unwrap();
        assert_eq!(encrypted.len(), 2);

        let cert = fs::read(dir.path().join("certs/distribution/cert.p12")).unwrap();
        assert!(envelope::is_encrypted(&cert));

        let decrypted = decrypt_files(dir.path(), PASSWORD).unwrap();
        assert_eq!(decrypted.len(), 2);

        let cert = fs::read(dir.path().join("certs/distribution/cert.p12")).unwrap();
        assert_eq!(cert, b"p12 contents");
    }

    #[test]
    fn encrypt_is_idempotent() {
        let dir = workdir_with_files();

        let first = encrypt_files(dir.path(), PASSWORD, false).unwrap();
        assert_eq!(first.len(), 2);
        let snapshot = fs::read(dir.path().join("certs/distribution/cert.p12")).unwrap();

        // Second pass sees the markers and rewrites nothing.
        let second = encrypt_files(dir.path(), PASSWORD, false).unwrap();
        assert!(second.is_empty());
        let after = fs::read(dir.path().join("certs/distribution/cert.p12")).unwrap();
        assert_eq!(snapshot, after);
    }

    #[test]
    fn decrypt_skips_plaintext_files() {
        let dir = workdir_with_files();

        let changed = decrypt_files(dir.path(), PASSWORD).unwrap();
        assert!(changed.is_empty());

        let cert = fs::read(dir.path().join("certs/distribution/cert.p12")).unwrap();
        assert_eq!(cert, b"p12 contents");
    }

    #[test]
    fn force_legacy_writes_openssl_markers() {
        let dir = workdir_with_files();

        encrypt_files(dir.path(), PASSWORD, true).unwrap();

        let cert = fs::read(dir.path().join("certs/distribution/cert.p12")).unwrap();
        assert!(cert.starts_with(envelope::V1_MARKER));
    }

    #[test]
    fn empty_password_fails_before_touching_files() {
        let dir = workdir_with_files();

        let err = encrypt_files(dir.path(), "", false).unwrap_err();
        assert!(matches!(err, MatchVaultError::NoPassword));

        // Nothing was rewritten.
        let cert = fs::read(dir.path().join("certs/distribution/cert.p12")).unwrap();
        assert_eq!(cert, b"p12 contents");
    }

    #[test]
    fn unmanaged_files_are_never_rewritten() {
        let dir = workdir_with_files();

        encrypt_files(dir.path(), PASSWORD, false).unwrap();

        let readme = fs::read(dir.path().join("README.md")).unwrap();
        assert_eq!(readme, b"unmanaged");
    }

    #[test]
    fn wrong_password_error_names_the_file() {
        let dir = workdir_with_files();
        encrypt_files(dir.path(), PASSWORD, false).unwrap();

        let err = decrypt_files(dir.path(), "wrong-password").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Crypto);
        assert!(err.to_string().contains("decrypt"));
        assert!(err.to_string().contains(".p12") || err.to_string().contains(".mobileprovision"));
    }
}
