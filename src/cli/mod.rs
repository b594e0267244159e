//! CLI module — Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;

use clap::Parser;

use zeroize::Zeroizing;

use crate::config::Settings;
use crate::errors::{MatchVaultError, Result};
use crate::storage::{Backend, GitConfig, GitLabConfig, GitLabSecureFiles, GitStorage, StorageMode};

/// Minimum length for newly chosen passwords to prevent trivially weak ones.
const MIN_PASSWORD_LEN: usize = 8;

/// MatchVault CLI: encrypted code-signing secret synchronization.
#[derive(Parser)]
#[command(
    name = "matchvault",
    about = "Sync encrypted code-signing certificates and profiles across your team",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Storage backend: git or gitlab (default: from .matchvault.toml)
    #[arg(long, global = true)]
    pub storage: Option<String>,

    /// URL of the git repo holding the encrypted files
    #[arg(long, env = "MATCH_GIT_URL", global = true)]
    pub git_url: Option<String>,

    /// Branch of the git repo to use
    #[arg(long, env = "MATCH_GIT_BRANCH", global = true)]
    pub git_branch: Option<String>,

    /// Base URL of the GitLab instance
    #[arg(long, env = "GITLAB_HOST", global = true)]
    pub gitlab_host: Option<String>,

    /// GitLab project path or numeric id holding the secure files
    #[arg(long, env = "GITLAB_PROJECT", global = true)]
    pub gitlab_project: Option<String>,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Encrypt a single file
    Encrypt {
        /// Path of the file to encrypt
        input_path: String,

        /// Encryption password (omit for interactive prompt)
        #[arg(short, long, env = "MATCH_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Write the result here instead of rewriting the input in place
        #[arg(short, long)]
        output_path: Option<String>,

        /// Emit the legacy OpenSSL-compatible format instead of the current one
        #[arg(long)]
        legacy: bool,
    },

    /// Decrypt a single file
    Decrypt {
        /// Path of the file to decrypt
        input_path: String,

        /// Encryption password (omit for interactive prompt)
        #[arg(short, long, env = "MATCH_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Write the result here instead of rewriting the input in place
        #[arg(short, long)]
        output_path: Option<String>,
    },

    /// Download the remote store and decrypt it locally
    Pull {
        /// Directory to place the decrypted files in (default: a fresh temp dir)
        #[arg(long)]
        dir: Option<String>,

        /// Encryption password (omit for interactive prompt)
        #[arg(short, long, env = "MATCH_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Encrypt local signing files and upload them to the remote store
    Push {
        /// Directory containing the plaintext signing files
        #[arg(long, default_value = ".")]
        dir: String,

        /// Encryption password (omit for interactive prompt)
        #[arg(short, long, env = "MATCH_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Commit message for the git backend
        #[arg(short, long)]
        message: Option<String>,

        /// Emit the legacy OpenSSL-compatible format instead of the current one
        #[arg(long)]
        legacy: bool,
    },

    /// Re-encrypt the whole remote store under a new password
    ChangePassword {
        /// Current password (omit for interactive prompt)
        #[arg(short, long, env = "MATCH_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// New password (omit for a confirmed interactive prompt)
        #[arg(long)]
        new_password: Option<String>,
    },

    /// Delete all stored files for a certificate type
    Nuke {
        /// Certificate type: development, distribution, or enterprise
        nuke_type: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        force: bool,

        /// Commit message for the git backend
        #[arg(short, long)]
        message: Option<String>,
    },

    /// List the files in the remote store
    List,

    /// Create a starter .matchvault.toml in the current directory
    Init,

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for (bash, zsh, fish, powershell)
        shell: String,
    },
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Get the encryption password, trying in order:
/// 1. An explicit `--password` value (Clap also fills this from `MATCH_PASSWORD`)
/// 2. The `MATCH_PASSWORD` env var (CI/CD)
/// 3. Interactive prompt
///
/// Empty values count as unset at every step. Returns `Zeroizing<String>`
/// so the password is wiped from memory on drop.
pub fn resolve_password(explicit: Option<&str>) -> Result<Zeroizing<String>> {
    if let Some(pw) = explicit {
        if !pw.is_empty() {
            return Ok(Zeroizing::new(pw.to_string()));
        }
    }

    if let Ok(pw) = std::env::var("MATCH_PASSWORD") {
        if !pw.is_empty() {
            return Ok(Zeroizing::new(pw));
        }
    }

    let pw = dialoguer::Password::new()
        .with_prompt("Enter the encryption password")
        .interact()
        .map_err(|e| MatchVaultError::CommandFailed(format!("password prompt: {e}")))?;
    if pw.is_empty() {
        return Err(MatchVaultError::NoPassword);
    }
    Ok(Zeroizing::new(pw))
}

/// Prompt for a new password with confirmation (used by `change-password`).
///
/// An explicit `--new-password` value skips the prompt but still has to meet
/// the minimum length. Returns `Zeroizing<String>` so the password is wiped
/// from memory on drop.
pub fn prompt_new_password(explicit: Option<&str>) -> Result<Zeroizing<String>> {
    if let Some(pw) = explicit {
        if !pw.is_empty() {
            if pw.len() < MIN_PASSWORD_LEN {
                return Err(MatchVaultError::CommandFailed(format!(
                    "password must be at least {MIN_PASSWORD_LEN} characters"
                )));
            }
            return Ok(Zeroizing::new(pw.to_string()));
        }
    }

    loop {
        let password = dialoguer::Password::new()
            .with_prompt("Choose a new encryption password")
            .with_confirmation("Confirm new password", "Passwords do not match, try again")
            .interact()
            .map_err(|e| MatchVaultError::CommandFailed(format!("password prompt: {e}")))?;

        if password.len() < MIN_PASSWORD_LEN {
            output::warning(&format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters. Try again."
            ));
            continue;
        }

        return Ok(Zeroizing::new(password));
    }
}

/// Load `.matchvault.toml` from the current directory (defaults if missing).
pub fn load_settings() -> Result<Settings> {
    let cwd = std::env::current_dir()?;
    Settings::load(&cwd)
}

/// Select and configure the storage backend from CLI flags and settings.
///
/// Flags win over `.matchvault.toml`; the choice is made once here and the
/// rest of the command runs against the concrete backend.
pub fn build_backend(cli: &Cli, settings: &Settings) -> Result<Backend> {
    let mode = match cli.storage.as_deref() {
        Some(value) => StorageMode::parse(value)?,
        None => settings.storage_mode()?,
    };

    match mode {
        StorageMode::Git => {
            let url = non_empty(cli.git_url.clone())
                .or_else(|| non_empty(settings.git_url.clone()))
                .ok_or_else(|| {
                    MatchVaultError::ConfigError(
                        "no git URL configured — set git_url in .matchvault.toml or pass --git-url"
                            .into(),
                    )
                })?;
            let branch =
                non_empty(cli.git_branch.clone()).unwrap_or_else(|| settings.git_branch.clone());

            Ok(Backend::Git(GitStorage::new(GitConfig {
                url,
                branch,
                shallow_clone: settings.shallow_clone,
                clone_branch_directly: settings.clone_branch_directly,
                full_name: settings.git_full_name.clone(),
                user_email: settings.git_user_email.clone(),
            })))
        }
        StorageMode::GitLab => {
            let host =
                non_empty(cli.gitlab_host.clone()).unwrap_or_else(|| settings.gitlab_host.clone());
            let project =
                non_empty(cli.gitlab_project.clone()).or_else(|| settings.gitlab_project.clone());

            let config = GitLabConfig::resolve(
                &host,
                project,
                env_token("CI_JOB_TOKEN"),
                env_token("PRIVATE_TOKEN"),
                settings.request_timeout(),
            )?;
            Ok(Backend::GitLab(GitLabSecureFiles::new(config)?))
        }
    }
}

/// Read an API token from the environment, treating empty as unset.
fn env_token(name: &str) -> Option<String> {
    non_empty(std::env::var(name).ok())
}

/// Clap's env support hands over `Some("")` when a variable is set but
/// empty; treat that as unset, like the password rules do.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
