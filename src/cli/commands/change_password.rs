//! `matchvault change-password` — re-encrypt the whole store under a new
//! password.
//!
//! Downloads everything, decrypts with the current password, encrypts with
//! the new one, and uploads the result. Nothing is written back unless the
//! decryption of the full store succeeded.

use crate::cli::output;
use crate::cli::{build_backend, load_settings, prompt_new_password, resolve_password, Cli};
use crate::errors::Result;
use crate::storage::Backend;
use crate::workdir::{self, crypter};

/// Commit message used for the re-encrypted files.
const MESSAGE: &str = "[matchvault] Changed password";

/// Execute the `change-password` command.
pub fn execute(cli: &Cli, password: Option<&str>, new_password: Option<&str>) -> Result<()> {
    let settings = load_settings()?;
    let backend = build_backend(cli, &settings)?;

    let old_password = resolve_password(password)?;
    let new_password = prompt_new_password(new_password)?;

    let staging = tempfile::tempdir()?;
    output::info(&format!(
        "Downloading secrets from {}",
        backend.description()
    ));
    backend.download(staging.path())?;

    if workdir::secret_files(staging.path())?.is_empty() {
        output::info("The store has no files yet, nothing to do");
        return Ok(());
    }

    crypter::decrypt_files(staging.path(), &old_password)?;
    let files = crypter::encrypt_files(staging.path(), &new_password, false)?;

    // The Secure Files API has no overwrite, so replacing means delete
    // then upload.
    if let Backend::GitLab(_) = backend {
        backend.delete_files(staging.path(), &files, MESSAGE)?;
    }

    output::info(&format!(
        "Uploading {} file(s) to {}",
        files.len(),
        backend.description()
    ));
    backend.upload_files(staging.path(), &files, MESSAGE)?;

    output::success(&format!(
        "Re-encrypted {} file(s) under the new password",
        files.len()
    ));
    Ok(())
}
