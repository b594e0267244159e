//! GitLab Secure Files storage backend.
//!
//! Talks to `{api_v4_url}/projects/{project}/secure_files` with a
//! project path URL-encoded into the route. Authentication is either a
//! CI job token (`JOB-TOKEN` header) or a personal access token
//! (`PRIVATE-TOKEN` header); when both are configured the job token
//! wins. HTTP statuses are handled explicitly rather than as transport
//! errors, because one 400 response (duplicate upload) is an expected
//! outcome, not a failure.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::Value;
use ureq::http::Response;
use ureq::{Agent, Body};

use crate::cli::output;
use crate::errors::{MatchVaultError, Result};
use crate::storage::secure_file::SecureFile;
use crate::storage::UploadReport;
use crate::workdir;

/// Maximum page size the list endpoint allows.
const PER_PAGE: usize = 100;

/// Upper bound for a single secure-file body.
const MAX_FILE_BYTES: u64 = 64 * 1024 * 1024;

/// Connection settings for one Secure Files project.
#[derive(Debug, Clone)]
pub struct GitLabConfig {
    /// API root, e.g. `https://gitlab.com/api/v4`.
    pub api_v4_url: String,
    /// Numeric project id or `group/name` path.
    pub project: String,
    pub job_token: Option<String>,
    pub private_token: Option<String>,
    pub timeout: Duration,
}

impl GitLabConfig {
    /// Build a config from explicit values plus the conventional CI
    /// environment fallbacks (`CI_API_V4_URL`, `CI_PROJECT_ID`).
    pub fn resolve(
        host: &str,
        project: Option<String>,
        job_token: Option<String>,
        private_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let api_v4_url = match std::env::var("CI_API_V4_URL") {
            Ok(url) if !url.is_empty() => url,
            _ => format!("{}/api/v4", host.trim_end_matches('/')),
        };

        let project = project
            .filter(|p| !p.is_empty())
            .or_else(|| std::env::var("CI_PROJECT_ID").ok().filter(|p| !p.is_empty()))
            .ok_or_else(|| {
                MatchVaultError::ConfigError(
                    "no GitLab project configured — set gitlab_project in .matchvault.toml \
                     or the GITLAB_PROJECT environment variable"
                        .into(),
                )
            })?;

        Ok(Self {
            api_v4_url,
            project,
            job_token: job_token.filter(|t| !t.is_empty()),
            private_token: private_token.filter(|t| !t.is_empty()),
            timeout,
        })
    }
}

/// Which authentication header requests carry.
enum Token {
    Job(String),
    Private(String),
}

/// Result of uploading one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    Uploaded,
    /// The project already has a file with this name.
    AlreadyExists,
}

/// HTTP client for one project's secure files.
pub struct GitLabClient {
    agent: Agent,
    base_url: String,
    project: String,
    token: Token,
}

impl GitLabClient {
    /// Build a client, resolving which token to authenticate with.
    ///
    /// Prompts for a personal access token when neither token is
    /// configured.
    pub fn new(config: GitLabConfig) -> Result<Self> {
        let token = match (config.job_token, config.private_token) {
            (Some(job), Some(_)) => {
                output::warning(
                    "CI_JOB_TOKEN and PRIVATE_TOKEN are both set — using the job token",
                );
                Token::Job(job)
            }
            (Some(job), None) => Token::Job(job),
            (None, Some(private)) => Token::Private(private),
            (None, None) => Token::Private(prompt_for_token()?),
        };

        let agent_config = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(config.timeout))
            .user_agent(concat!("matchvault/", env!("CARGO_PKG_VERSION")))
            .build();

        let base_url = format!(
            "{}/projects/{}/secure_files",
            config.api_v4_url.trim_end_matches('/'),
            urlencoding::encode(&config.project)
        );

        Ok(Self {
            agent: Agent::new_with_config(agent_config),
            base_url,
            project: config.project,
            token,
        })
    }

    /// The project this client talks to.
    pub fn project(&self) -> &str {
        &self.project
    }

    /// Secure-files collection URL (without a trailing file id).
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn auth_header(&self) -> (&'static str, &str) {
        match &self.token {
            Token::Job(token) => ("JOB-TOKEN", token.as_str()),
            Token::Private(token) => ("PRIVATE-TOKEN", token.as_str()),
        }
    }

    /// List every secure file in the project, following pagination.
    pub fn files(&self) -> Result<Vec<SecureFile>> {
        let mut all = Vec::new();
        let mut page = 1;

        loop {
            let url = format!("{}?per_page={}&page={}", self.base_url, PER_PAGE, page);
            let (name, value) = self.auth_header();
            let mut response = self
                .agent
                .get(&url)
                .header(name, value)
                .call()
                .map_err(connection_error)?;
            expect_success(&mut response, "listing secure files")?;

            let batch: Vec<SecureFile> = response.body_mut().read_json().map_err(|e| {
                MatchVaultError::StorageConnection(format!("reading file list: {e}"))
            })?;

            let batch_len = batch.len();
            all.extend(batch);
            if batch_len < PER_PAGE {
                break;
            }
            page += 1;
        }

        Ok(all)
    }

    /// Fetch the raw body of one secure file to `dest`.
    pub fn download_to(&self, id: u64, dest: &Path) -> Result<()> {
        let url = format!("{}/{}/download", self.base_url, id);
        let (name, value) = self.auth_header();
        let mut response = self
            .agent
            .get(&url)
            .header(name, value)
            .call()
            .map_err(connection_error)?;
        expect_success(&mut response, "downloading secure file")?;

        let bytes = response
            .body_mut()
            .with_config()
            .limit(MAX_FILE_BYTES)
            .read_to_vec()
            .map_err(|e| MatchVaultError::StorageConnection(format!("reading download: {e}")))?;

        fs::write(dest, bytes)?;
        Ok(())
    }

    /// Upload one file under `target_name`.
    ///
    /// A duplicate name is reported as `UploadOutcome::AlreadyExists`
    /// rather than an error.
    pub fn upload_file(&self, file_path: &Path, target_name: &str) -> Result<UploadOutcome> {
        let content = fs::read(file_path)?;
        let boundary = random_boundary()?;
        let body = multipart_body(&boundary, target_name, &content);

        let (name, value) = self.auth_header();
        let mut response = self
            .agent
            .post(&self.base_url)
            .header(name, value)
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .send(&body[..])
            .map_err(connection_error)?;

        let status = response.status().as_u16();
        if (200..300).contains(&status) {
            return Ok(UploadOutcome::Uploaded);
        }

        let text = response.body_mut().read_to_string().unwrap_or_default();
        classify_upload_failure(status, &text, target_name)
    }

    /// Delete one secure file by id.
    pub fn delete_file(&self, id: u64) -> Result<()> {
        let url = format!("{}/{}", self.base_url, id);
        let (name, value) = self.auth_header();
        let mut response = self
            .agent
            .delete(&url)
            .header(name, value)
            .call()
            .map_err(connection_error)?;
        expect_success(&mut response, "deleting secure file")
    }
}

/// Secure Files as a whole-working-directory storage backend.
pub struct GitLabSecureFiles {
    client: GitLabClient,
}

impl GitLabSecureFiles {
    pub fn new(config: GitLabConfig) -> Result<Self> {
        Ok(Self {
            client: GitLabClient::new(config)?,
        })
    }

    pub fn client(&self) -> &GitLabClient {
        &self.client
    }

    /// Download the full remote file set into `working_directory`.
    pub fn download(&self, working_directory: &Path) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for file in self.client.files()? {
            paths.push(file.download(&self.client, working_directory)?);
        }
        Ok(paths)
    }

    /// Upload the given workdir files under their relative names.
    pub fn upload_files(
        &self,
        working_directory: &Path,
        files: &[PathBuf],
    ) -> Result<UploadReport> {
        let mut report = UploadReport::default();
        for path in files {
            let name = workdir::relative_name(working_directory, path)?;
            match self.client.upload_file(path, &name)? {
                UploadOutcome::Uploaded => report.uploaded.push(name),
                UploadOutcome::AlreadyExists => report.already_present.push(name),
            }
        }
        Ok(report)
    }

    /// Delete the remote counterparts of the given workdir files.
    ///
    /// Files with no remote counterpart are skipped. Returns the names
    /// actually deleted.
    pub fn delete_files(&self, working_directory: &Path, files: &[PathBuf]) -> Result<Vec<String>> {
        let remote = self.client.files()?;

        let mut deleted = Vec::new();
        for path in files {
            let name = workdir::relative_name(working_directory, path)?;
            if let Some(file) = remote.iter().find(|f| f.name == name) {
                self.client.delete_file(file.id)?;
                deleted.push(name);
            }
        }
        Ok(deleted)
    }
}

/// Transport-level failure (connect, TLS, timeout).
fn connection_error(e: ureq::Error) -> MatchVaultError {
    MatchVaultError::StorageConnection(e.to_string())
}

/// Fail on any non-2xx status, carrying the response body.
fn expect_success(response: &mut Response<Body>, context: &str) -> Result<()> {
    let status = response.status().as_u16();
    if (200..300).contains(&status) {
        return Ok(());
    }

    let body = response.body_mut().read_to_string().unwrap_or_default();
    Err(MatchVaultError::StorageApi {
        status,
        body: format!("{context}: {body}"),
    })
}

/// Decide whether a failed upload is the duplicate-name case.
fn classify_upload_failure(status: u16, body: &str, name: &str) -> Result<UploadOutcome> {
    if status == 400 && duplicate_name_error(body) {
        return Ok(UploadOutcome::AlreadyExists);
    }

    Err(MatchVaultError::StorageApi {
        status,
        body: format!("uploading '{name}': {body}"),
    })
}

/// True if the error body says the file name is already taken.
fn duplicate_name_error(body: &str) -> bool {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return false;
    };

    match value.get("message").and_then(|m| m.get("name")) {
        Some(Value::Array(items)) => items
            .iter()
            .any(|item| item.as_str().is_some_and(|s| s.contains("has already been taken"))),
        Some(Value::String(s)) => s.contains("has already been taken"),
        _ => false,
    }
}

/// Prompt for a personal access token when nothing is configured.
fn prompt_for_token() -> Result<String> {
    let token = dialoguer::Password::new()
        .with_prompt("GitLab personal access token")
        .interact()
        .map_err(|e| MatchVaultError::CommandFailed(format!("token prompt: {e}")))?;

    if token.is_empty() {
        return Err(MatchVaultError::ConfigError(
            "an access token is required for the GitLab backend".into(),
        ));
    }
    Ok(token)
}

fn random_boundary() -> Result<String> {
    use rand::TryRngCore;

    let mut bytes = [0u8; 16];
    rand::rngs::OsRng.try_fill_bytes(&mut bytes).map_err(|e| {
        MatchVaultError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("boundary generation failed: {e}"),
        ))
    })?;
    Ok(format!("matchvault{}", hex::encode(bytes)))
}

/// Assemble a two-part multipart/form-data body: the `name` field and
/// the `file` part.
fn multipart_body(boundary: &str, name: &str, content: &[u8]) -> Vec<u8> {
    let filename = name.rsplit('/').next().unwrap_or(name);

    let mut body = Vec::with_capacity(content.len() + 512);
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(b"Content-Disposition: form-data; name=\"name\"\r\n\r\n");
    body.extend_from_slice(name.as_bytes());
    body.extend_from_slice(format!("\r\n--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}
