use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{MatchVaultError, Result};
use crate::storage::StorageMode;

/// Project-level configuration, loaded from `.matchvault.toml`.
///
/// Every field has a default so matchvault works with a minimal file
/// (or none at all, as long as the backend gets its values from flags
/// or the environment).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Which backend to use: "git" or "gitlab".
    #[serde(default = "default_storage")]
    pub storage: String,

    /// URL of the git repository holding the encrypted files.
    #[serde(default)]
    pub git_url: Option<String>,

    /// Branch to store secrets on (teams often use one branch per
    /// certificate type).
    #[serde(default = "default_git_branch")]
    pub git_branch: String,

    /// Clone with `--depth 1` for faster CI checkouts.
    #[serde(default)]
    pub shallow_clone: bool,

    /// Clone only the configured branch (`-b <branch> --single-branch`).
    #[serde(default)]
    pub clone_branch_directly: bool,

    /// Repo-local `user.name` for generated commits.
    #[serde(default)]
    pub git_full_name: Option<String>,

    /// Repo-local `user.email` for generated commits.
    #[serde(default)]
    pub git_user_email: Option<String>,

    /// GitLab instance to talk to.
    #[serde(default = "default_gitlab_host")]
    pub gitlab_host: String,

    /// Numeric project id or `group/name` path.
    #[serde(default)]
    pub gitlab_project: Option<String>,

    /// Global HTTP request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_storage() -> String {
    "git".to_string()
}

fn default_git_branch() -> String {
    "master".to_string()
}

fn default_gitlab_host() -> String {
    "https://gitlab.com".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            storage: default_storage(),
            git_url: None,
            git_branch: default_git_branch(),
            shallow_clone: false,
            clone_branch_directly: false,
            git_full_name: None,
            git_user_email: None,
            gitlab_host: default_gitlab_host(),
            gitlab_project: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the project root.
    pub const FILE_NAME: &'static str = ".matchvault.toml";

    /// Load settings from `<project_dir>/.matchvault.toml`.
    ///
    /// If the file does not exist, defaults are returned. If the file
    /// exists but cannot be parsed, an error is returned.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let config_path = project_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            MatchVaultError::ConfigError(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        Ok(settings)
    }

    /// The configured backend kind.
    pub fn storage_mode(&self) -> Result<StorageMode> {
        StorageMode::parse(&self.storage)
    }

    /// The HTTP request timeout as a `Duration`.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn default_settings_are_sensible() {
        let s = Settings::default();
        assert_eq!(s.storage, "git");
        assert_eq!(s.git_branch, "master");
        assert!(!s.shallow_clone);
        assert_eq!(s.gitlab_host, "https://gitlab.com");
        assert_eq!(s.request_timeout_secs, 30);
    }

    #[test]
    fn load_returns_defaults_when_no_config_file() {
        let tmp = TempDir::new().unwrap();
        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(settings.storage, "git");
        assert_eq!(settings.storage_mode().unwrap(), StorageMode::Git);
    }

    #[test]
    fn load_parses_toml_file() {
        let tmp = TempDir::new().unwrap();
        let config = r#"
storage = "gitlab"
gitlab_host = "https://gitlab.example.com"
gitlab_project = "mobile/signing"
request_timeout_secs = 10
"#;
        fs::write(tmp.path().join(".matchvault.toml"), config).unwrap();

        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(settings.storage_mode().unwrap(), StorageMode::GitLab);
        assert_eq!(settings.gitlab_host, "https://gitlab.example.com");
        assert_eq!(settings.gitlab_project.as_deref(), Some("mobile/signing"));
        assert_eq!(settings.request_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn load_uses_defaults_for_missing_fields() {
        let tmp = TempDir::new().unwrap();
        let config = "git_url = \"git@github.com:acme/certs.git\"\n";
        fs::write(tmp.path().join(".matchvault.toml"), config).unwrap();

        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(settings.git_url.as_deref(), Some("git@github.com:acme/certs.git"));
        assert_eq!(settings.storage, "git");
        assert_eq!(settings.git_branch, "master");
    }

    #[test]
    fn load_errors_on_invalid_toml() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".matchvault.toml"), "not valid {{toml").unwrap();

        let result = Settings::load(tmp.path());
        assert!(result.is_err());
    }

    #[test]
    fn unknown_storage_mode_is_rejected() {
        let settings = Settings {
            storage: "dropbox".to_string(),
            ..Settings::default()
        };
        assert!(settings.storage_mode().is_err());
    }
}
