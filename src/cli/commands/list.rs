//! `matchvault list` — list the files in the remote store.

use crate::cli::output;
use crate::cli::{build_backend, load_settings, Cli};
use crate::errors::Result;
use crate::storage::Backend;
use crate::workdir;

/// Execute the `list` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let settings = load_settings()?;
    let backend = build_backend(cli, &settings)?;

    match &backend {
        Backend::GitLab(storage) => {
            let mut files = storage.client().files()?;
            if files.is_empty() {
                output::info("The store has no files yet");
                return Ok(());
            }
            files.sort_by(|a, b| a.name.cmp(&b.name));
            output::print_secure_files_table(&files);
        }
        Backend::Git(_) => {
            let staging = tempfile::tempdir()?;
            output::info(&format!("Fetching {}", backend.description()));
            backend.download(staging.path())?;

            let files = workdir::secret_files(staging.path())?;
            if files.is_empty() {
                output::info("The store has no files yet");
                return Ok(());
            }
            let mut names = Vec::new();
            for file in &files {
                names.push(workdir::relative_name(staging.path(), file)?);
            }
            output::print_file_names_table("File", &names);
        }
    }
    Ok(())
}
