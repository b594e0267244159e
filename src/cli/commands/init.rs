//! `matchvault init` — create a starter `.matchvault.toml`.

use std::fs;

use crate::cli::output;
use crate::config::Settings;
use crate::errors::{MatchVaultError, Result};

/// Starter configuration written by `init`.
const TEMPLATE: &str = r#"# matchvault configuration

# Storage backend: "git" or "gitlab".
storage = "git"

# --- git backend ---
# git_url = "git@github.com:example/certificates.git"
# git_branch = "master"
# shallow_clone = false
# clone_branch_directly = false
# git_full_name = "Match CI"
# git_user_email = "ci@example.com"

# --- gitlab backend ---
# gitlab_host = "https://gitlab.com"
# gitlab_project = "group/signing-files"

# HTTP timeout for storage requests, in seconds.
# request_timeout_secs = 30
"#;

/// Execute the `init` command.
pub fn execute() -> Result<()> {
    let cwd = std::env::current_dir()?;
    let path = cwd.join(Settings::FILE_NAME);

    if path.exists() {
        return Err(MatchVaultError::CommandFailed(format!(
            "{} already exists — edit it instead",
            Settings::FILE_NAME
        )));
    }

    fs::write(&path, TEMPLATE)?;
    output::success(&format!("Created {}", path.display()));
    output::tip("Set git_url (or the gitlab_* fields), then run `matchvault push` to seed the store.");
    Ok(())
}
