//! Working-directory layout and traversal.
//!
//! The working directory is a throwaway checkout of the secret store:
//! certificates under `certs/<type>/` and provisioning profiles under
//! `profiles/<type>/`. Only files with a managed extension are ever
//! encrypted, decrypted, uploaded, or deleted; everything else in the
//! checkout (README, git metadata) is left alone.

pub mod crypter;

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::errors::{MatchVaultError, Result};

pub use crypter::{decrypt_files, encrypt_files};

/// File extensions of the signing secrets under management.
pub const SECRET_FILE_EXTENSIONS: &[&str] = &[
    "cer",
    "p12",
    "mobileprovision",
    "provisionprofile",
    "p8",
];

/// True if the path carries one of the managed extensions.
pub fn is_secret_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SECRET_FILE_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}

/// Collect every managed secret file under `root`, recursively.
///
/// The walk skips `.git` and returns paths in sorted order so that
/// multi-file operations behave deterministically.
pub fn secret_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.file_name() != ".git");

    for entry in walker {
        let entry = entry.map_err(|e| MatchVaultError::Io(e.into()))?;
        if entry.file_type().is_file() && is_secret_file(entry.path()) {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}

/// Turn an absolute path inside `root` into a storage name with `/`
/// separators (e.g. `certs/distribution/cert.p12`).
pub fn relative_name(root: &Path, path: &Path) -> Result<String> {
    let rel = path.strip_prefix(root).map_err(|_| {
        MatchVaultError::CommandFailed(format!(
            "'{}' is outside the working directory",
            path.display()
        ))
    })?;

    let mut parts = Vec::new();
    for component in rel.components() {
        let part = component.as_os_str().to_str().ok_or_else(|| {
            MatchVaultError::CommandFailed(format!(
                "'{}' is not valid UTF-8",
                path.display()
            ))
        })?;
        parts.push(part);
    }

    Ok(parts.join("/"))
}
