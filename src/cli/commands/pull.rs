//! `matchvault pull` — download the remote store and decrypt it locally.
//!
//! Without `--dir` the files land in a fresh temp directory that is kept
//! around after exit, so the caller can pick the secrets up from there.

use std::fs;
use std::path::PathBuf;

use crate::cli::output;
use crate::cli::{build_backend, load_settings, resolve_password, Cli};
use crate::errors::Result;
use crate::workdir::crypter;

/// Execute the `pull` command.
pub fn execute(cli: &Cli, dir: Option<&str>, password: Option<&str>) -> Result<()> {
    let settings = load_settings()?;
    let backend = build_backend(cli, &settings)?;
    let password = resolve_password(password)?;

    let target = match dir {
        Some(dir) => {
            let path = PathBuf::from(dir);
            fs::create_dir_all(&path)?;
            path
        }
        None => tempfile::tempdir()?.keep(),
    };

    output::info(&format!(
        "Downloading secrets from {}",
        backend.description()
    ));
    backend.download(&target)?;

    let changed = crypter::decrypt_files(&target, &password)?;
    output::success(&format!("Decrypted {} file(s)", changed.len()));
    output::info(&format!("Files are available in {}", target.display()));
    if dir.is_none() {
        output::tip("Remember to delete this directory when you are done.");
    }
    Ok(())
}
