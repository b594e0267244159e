//! `matchvault push` — encrypt local signing files and upload them.
//!
//! The user's plaintext copies are never touched: the managed files are
//! staged into a scratch directory, encrypted there, and uploaded from
//! there.

use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::output;
use crate::cli::{build_backend, load_settings, resolve_password, Cli};
use crate::errors::{MatchVaultError, Result};
use crate::storage::Backend;
use crate::workdir::{self, crypter};

/// Commit message for the git backend when `--message` is not given.
const DEFAULT_MESSAGE: &str = "[matchvault] Updated signing files";

/// Execute the `push` command.
pub fn execute(
    cli: &Cli,
    dir: &str,
    password: Option<&str>,
    message: Option<&str>,
    legacy: bool,
) -> Result<()> {
    let source = Path::new(dir);
    if !source.is_dir() {
        return Err(MatchVaultError::CommandFailed(format!(
            "'{dir}' is not a directory"
        )));
    }

    let files = workdir::secret_files(source)?;
    if files.is_empty() {
        output::info(&format!(
            "No signing files found under '{dir}', nothing to push"
        ));
        return Ok(());
    }

    let settings = load_settings()?;
    let backend = build_backend(cli, &settings)?;
    let password = resolve_password(password)?;

    let staging = tempfile::tempdir()?;
    if let Backend::Git(_) = backend {
        // Committing needs the existing history underneath.
        output::info(&format!("Fetching {}", backend.description()));
        backend.download(staging.path())?;
    }

    let staged = stage_files(source, &files, staging.path())?;
    crypter::encrypt_files(staging.path(), &password, legacy)?;

    output::info(&format!(
        "Uploading {} file(s) to {}",
        staged.len(),
        backend.description()
    ));
    let report = backend.upload_files(
        staging.path(),
        &staged,
        message.unwrap_or(DEFAULT_MESSAGE),
    )?;

    for name in &report.already_present {
        output::warning(&format!(
            "'{name}' already exists in the project — delete it first to replace it"
        ));
    }
    output::success(&format!("Uploaded {} file(s)", report.uploaded.len()));
    Ok(())
}

/// Copy the managed files into the staging directory, preserving their
/// store-relative paths. Returns the staged paths.
fn stage_files(source: &Path, files: &[PathBuf], staging: &Path) -> Result<Vec<PathBuf>> {
    let mut staged = Vec::new();
    for file in files {
        let name = workdir::relative_name(source, file)?;
        let dest = staging.join(&name);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(file, &dest)?;
        staged.push(dest);
    }
    Ok(staged)
}
