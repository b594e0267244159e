//! Storage backends for the encrypted secret store.
//!
//! This module provides:
//! - Git-repository storage shelling out to `git` (`git`)
//! - GitLab Secure Files REST storage (`gitlab`)
//! - The remote file model with checksum enforcement (`secure_file`)
//!
//! The active backend is a `Backend` value selected once at startup;
//! every operation dispatches on the variant with a `match`.

pub mod git;
pub mod gitlab;
pub mod secure_file;

use std::path::{Path, PathBuf};

use crate::errors::{MatchVaultError, Result};
use crate::workdir;

// Re-export the most commonly used items.
pub use git::{GitConfig, GitStorage};
pub use gitlab::{GitLabClient, GitLabConfig, GitLabSecureFiles, UploadOutcome};
pub use secure_file::SecureFile;

/// Which backend a run talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMode {
    Git,
    GitLab,
}

impl StorageMode {
    /// Parse the `storage` config value.
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "git" => Ok(Self::Git),
            "gitlab" | "gitlab_secure_files" => Ok(Self::GitLab),
            other => Err(MatchVaultError::ConfigError(format!(
                "unknown storage mode '{other}' — expected 'git' or 'gitlab'"
            ))),
        }
    }
}

/// Per-file outcomes of one upload pass.
#[derive(Debug, Default)]
pub struct UploadReport {
    pub uploaded: Vec<String>,
    /// Names the remote already had (duplicate uploads, not errors).
    pub already_present: Vec<String>,
}

/// The selected storage backend.
pub enum Backend {
    Git(GitStorage),
    GitLab(GitLabSecureFiles),
}

// Manual impl: a derive would require `Debug` on the backend internals,
// and the GitLab client's HTTP agent does not implement it.
impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::Git(_) => f.write_str("Backend::Git"),
            Backend::GitLab(_) => f.write_str("Backend::GitLab"),
        }
    }
}

impl Backend {
    /// Populate `working_directory` with the remote file set.
    pub fn download(&self, working_directory: &Path) -> Result<()> {
        match self {
            Backend::Git(storage) => storage.download(working_directory),
            Backend::GitLab(storage) => storage.download(working_directory).map(|_| ()),
        }
    }

    /// Push the given workdir files to the remote.
    pub fn upload_files(
        &self,
        working_directory: &Path,
        files: &[PathBuf],
        message: &str,
    ) -> Result<UploadReport> {
        match self {
            Backend::Git(storage) => {
                let uploaded = storage.upload_files(working_directory, files, message)?;
                Ok(UploadReport {
                    uploaded,
                    already_present: Vec::new(),
                })
            }
            Backend::GitLab(storage) => storage.upload_files(working_directory, files),
        }
    }

    /// Remove the given files from the remote. The local copies must
    /// already be gone (the git variant commits the staged deletions).
    ///
    /// Returns the storage names that were removed.
    pub fn delete_files(
        &self,
        working_directory: &Path,
        files: &[PathBuf],
        message: &str,
    ) -> Result<Vec<String>> {
        match self {
            Backend::Git(storage) => {
                let mut names = Vec::new();
                for file in files {
                    names.push(workdir::relative_name(working_directory, file)?);
                }
                storage.delete_files(working_directory, message)?;
                Ok(names)
            }
            Backend::GitLab(storage) => storage.delete_files(working_directory, files),
        }
    }

    /// Human-readable backend description for status messages.
    pub fn description(&self) -> String {
        match self {
            Backend::Git(storage) => {
                format!("git repo [{}] (branch '{}')", storage.url(), storage.branch())
            }
            Backend::GitLab(storage) => {
                format!(
                    "GitLab Secure Files project [{}]",
                    storage.client().project()
                )
            }
        }
    }
}
