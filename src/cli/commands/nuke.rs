//! `matchvault nuke` — delete all stored files for a certificate type.
//!
//! Works on the encrypted envelopes directly, so no password is needed.
//! Shows the matching files and asks for confirmation unless `--force`.

use std::fs;

use dialoguer::Confirm;

use crate::cli::output;
use crate::cli::{build_backend, load_settings, Cli};
use crate::errors::{MatchVaultError, Result};
use crate::workdir;

/// Execute the `nuke` command.
pub fn execute(cli: &Cli, nuke_type: &str, force: bool, message: Option<&str>) -> Result<()> {
    let prefixes = type_prefixes(nuke_type)?;

    let settings = load_settings()?;
    let backend = build_backend(cli, &settings)?;

    let staging = tempfile::tempdir()?;
    output::info(&format!(
        "Downloading secrets from {}",
        backend.description()
    ));
    backend.download(staging.path())?;

    let mut targets = Vec::new();
    let mut names = Vec::new();
    for path in workdir::secret_files(staging.path())? {
        let name = workdir::relative_name(staging.path(), &path)?;
        if prefixes.iter().any(|p| name.starts_with(p)) {
            targets.push(path);
            names.push(name);
        }
    }

    if targets.is_empty() {
        output::info(&format!("No stored files for type '{nuke_type}'"));
        return Ok(());
    }

    output::warning(&format!(
        "The following {} file(s) will be deleted from {}:",
        names.len(),
        backend.description()
    ));
    output::print_file_names_table("File", &names);

    if !force {
        let confirmed = Confirm::new()
            .with_prompt("Do you really want to delete these files?")
            .default(false)
            .interact()
            .map_err(|e| MatchVaultError::CommandFailed(format!("confirm prompt: {e}")))?;

        if !confirmed {
            return Err(MatchVaultError::UserCancelled);
        }
    }

    for path in &targets {
        fs::remove_file(path)?;
    }

    let message = message
        .map(str::to_string)
        .unwrap_or_else(|| format!("[matchvault] Nuked files for {nuke_type}"));
    let deleted = backend.delete_files(staging.path(), &targets, &message)?;

    output::success(&format!("Deleted {} file(s)", deleted.len()));
    Ok(())
}

/// Map a certificate type to the store path prefixes it owns.
fn type_prefixes(nuke_type: &str) -> Result<&'static [&'static str]> {
    match nuke_type {
        "development" => Ok(&["certs/development/", "profiles/development/"]),
        "distribution" => Ok(&[
            "certs/distribution/",
            "profiles/appstore/",
            "profiles/adhoc/",
        ]),
        "enterprise" => Ok(&["certs/enterprise/", "profiles/inhouse/"]),
        other => Err(MatchVaultError::CommandFailed(format!(
            "unknown certificate type '{other}' — use development, distribution, or enterprise"
        ))),
    }
}
