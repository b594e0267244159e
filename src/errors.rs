use thiserror::Error;

/// All errors that can occur in matchvault.
#[derive(Debug, Error)]
pub enum MatchVaultError {
    // --- Password / input errors ---
    #[error("No password supplied — pass --password or set MATCH_PASSWORD")]
    NoPassword,

    #[error("Invalid password — wrong password or corrupted data")]
    InvalidPassword,

    #[error("User cancelled operation")]
    UserCancelled,

    // --- Crypto errors ---
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Invalid envelope: {0}")]
    InvalidEnvelope(String),

    #[error("unable to {operation} '{file}': {source}")]
    FileCrypto {
        operation: &'static str,
        file: String,
        #[source]
        source: Box<MatchVaultError>,
    },

    // --- Integrity errors ---
    #[error("Checksum mismatch for '{name}' — the downloaded file is corrupted")]
    ChecksumMismatch { name: String },

    #[error("Unsupported checksum algorithm '{algorithm}' for '{name}'")]
    UnsupportedChecksum { name: String, algorithm: String },

    #[error("Unsafe storage file name '{name}' — refusing to write outside the working directory")]
    UnsafeFileName { name: String },

    // --- Storage errors ---
    #[error("Storage connection error: {0}")]
    StorageConnection(String),

    #[error("Storage API error (HTTP {status}): {body}")]
    StorageApi { status: u16, body: String },

    #[error("git command failed ({command}): {stderr}")]
    GitCommandFailed { command: String, stderr: String },

    // --- Config errors ---
    #[error("Config file error: {0}")]
    ConfigError(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),
}

/// Coarse classification used by callers that react differently to
/// user mistakes, integrity violations, and infrastructure failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing/empty password, bad configuration, cancelled prompts.
    UserInput,
    /// Wrong password or a malformed/tampered envelope.
    Crypto,
    /// Checksum verification failures.
    Integrity,
    /// Transport-level failures (connect, timeout).
    Network,
    /// Everything else: HTTP error statuses, git failures, IO.
    Fatal,
}

impl MatchVaultError {
    /// Classify this error for reporting purposes.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NoPassword | Self::UserCancelled | Self::ConfigError(_) | Self::CommandFailed(_) => {
                ErrorKind::UserInput
            }
            Self::InvalidPassword | Self::EncryptionFailed(_) | Self::InvalidEnvelope(_) => {
                ErrorKind::Crypto
            }
            Self::FileCrypto { source, .. } => source.kind(),
            Self::ChecksumMismatch { .. }
            | Self::UnsupportedChecksum { .. }
            | Self::UnsafeFileName { .. } => ErrorKind::Integrity,
            Self::StorageConnection(_) => ErrorKind::Network,
            Self::StorageApi { .. } | Self::GitCommandFailed { .. } | Self::Io(_) => ErrorKind::Fatal,
        }
    }
}

/// Convenience type alias for matchvault results.
pub type Result<T> = std::result::Result<T, MatchVaultError>;
