//! Git-repository storage backend.
//!
//! Shells out to the system `git` binary with interactive prompts
//! disabled, so a missing credential fails fast instead of hanging a CI
//! job. Download is a clone (or a pull when the working directory is
//! already a checkout), followed by a branch switch; a branch that does
//! not exist yet is created as an orphan with an empty tree. Upload and
//! delete are stage + commit + push, where an empty commit is treated as
//! "nothing changed" rather than a failure.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::errors::{MatchVaultError, Result};
use crate::workdir;

/// Connection settings for a git-backed secret repository.
#[derive(Debug, Clone)]
pub struct GitConfig {
    pub url: String,
    pub branch: String,
    pub shallow_clone: bool,
    pub clone_branch_directly: bool,
    /// Repo-local `user.name` for generated commits.
    pub full_name: Option<String>,
    /// Repo-local `user.email` for generated commits.
    pub user_email: Option<String>,
}

pub struct GitStorage {
    config: GitConfig,
}

impl GitStorage {
    pub fn new(config: GitConfig) -> Self {
        Self { config }
    }

    pub fn url(&self) -> &str {
        &self.config.url
    }

    pub fn branch(&self) -> &str {
        &self.config.branch
    }

    /// Populate `working_directory` with the configured branch.
    pub fn download(&self, working_directory: &Path) -> Result<()> {
        if working_directory.join(".git").is_dir() {
            self.run(Some(working_directory), &["pull", "origin", &self.config.branch])?;
            return Ok(());
        }

        let dir = working_directory.to_str().ok_or_else(|| {
            MatchVaultError::CommandFailed(format!(
                "working directory '{}' is not valid UTF-8",
                working_directory.display()
            ))
        })?;

        // `-b` only goes on the clone when shallow mode is off; when the
        // shallow flags win, the configured branch still needs an
        // explicit switch afterwards.
        let direct_branch_clone = self.config.clone_branch_directly && !self.config.shallow_clone;

        let mut args: Vec<&str> = vec!["clone", &self.config.url, dir];
        if self.config.shallow_clone {
            args.extend(["--depth", "1", "--no-single-branch"]);
        } else if direct_branch_clone {
            args.extend(["-b", &self.config.branch, "--single-branch"]);
        }
        self.run(None, &args)?;

        self.configure_user(working_directory)?;
        if !direct_branch_clone {
            self.checkout_branch(working_directory)?;
        }

        Ok(())
    }

    /// Stage the given files, commit, and push.
    ///
    /// Returns the storage names that were staged. A commit with no
    /// changes is a successful no-op.
    pub fn upload_files(
        &self,
        working_directory: &Path,
        files: &[PathBuf],
        message: &str,
    ) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for file in files {
            let name = workdir::relative_name(working_directory, file)?;
            self.run(Some(working_directory), &["add", &name])?;
            names.push(name);
        }

        self.commit_and_push(working_directory, message)?;
        Ok(names)
    }

    /// Stage deletions (the files are already gone locally), commit, push.
    pub fn delete_files(&self, working_directory: &Path, message: &str) -> Result<()> {
        self.run(Some(working_directory), &["add", "-A"])?;
        self.commit_and_push(working_directory, message)
    }

    fn commit_and_push(&self, dir: &Path, message: &str) -> Result<()> {
        match self.run(Some(dir), &["commit", "-m", message]) {
            Ok(_) => {}
            // git reports an empty commit on stdout with a non-zero exit.
            Err(MatchVaultError::GitCommandFailed { ref stderr, .. })
                if stderr.contains("nothing to commit") =>
            {
                return Ok(());
            }
            Err(e) => return Err(e),
        }

        self.run(Some(dir), &["push", "origin", &self.config.branch])?;
        Ok(())
    }

    fn configure_user(&self, dir: &Path) -> Result<()> {
        if let Some(name) = &self.config.full_name {
            self.run(Some(dir), &["config", "user.name", name])?;
        }
        if let Some(email) = &self.config.user_email {
            self.run(Some(dir), &["config", "user.email", email])?;
        }
        Ok(())
    }

    /// Switch to the configured branch, creating it as an orphan with an
    /// empty tree when it does not exist anywhere yet.
    fn checkout_branch(&self, dir: &Path) -> Result<()> {
        let branch = &self.config.branch;

        if self.branch_exists(dir, branch)? {
            self.run(Some(dir), &["checkout", branch])?;
        } else {
            self.run(Some(dir), &["checkout", "--orphan", branch])?;
            self.run(Some(dir), &["reset", "--hard"])?;
        }

        Ok(())
    }

    fn branch_exists(&self, dir: &Path, branch: &str) -> Result<bool> {
        let pattern = format!("origin/{branch}");
        let output = self.run(
            Some(dir),
            &["--no-pager", "branch", "--list", &pattern, "--all"],
        )?;
        Ok(branch_listed(&output, branch))
    }

    /// Run one git command, capturing stdout and mapping failures to a
    /// `GitCommandFailed` that names the invocation.
    fn run(&self, dir: Option<&Path>, args: &[&str]) -> Result<String> {
        let mut command = Command::new("git");
        command.args(args).env("GIT_TERMINAL_PROMPT", "0");
        if let Some(dir) = dir {
            command.current_dir(dir);
        }

        let rendered = format!("git {}", args.join(" "));
        let output = command.output().map_err(|e| MatchVaultError::GitCommandFailed {
            command: rendered.clone(),
            stderr: format!("failed to launch git: {e}"),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
            return Err(MatchVaultError::GitCommandFailed {
                command: rendered,
                stderr: if stderr.is_empty() { stdout } else { stderr },
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

/// Parse `git branch --list origin/<b> --all` output for a live ref.
fn branch_listed(output: &str, branch: &str) -> bool {
    let suffix = format!("origin/{branch}");
    output
        .lines()
        .any(|line| line.trim().trim_start_matches("* ").ends_with(&suffix))
}
