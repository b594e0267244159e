//! Self-describing encryption envelopes.
//!
//! Every encrypted secret starts with an ASCII marker that identifies the
//! format, followed by the 8-byte salt and the raw ciphertext:
//!
//!   V1 (OpenSSL-compatible):
//!     [ "Salted__" (8) | salt (8) | AES-256-CBC ciphertext ]
//!   V2 (current):
//!     [ "match_encrypted_v2__" (20) | salt (8) | AES-256-GCM ct + 16-byte tag ]
//!
//! The marker is what makes encryption idempotent: a file that already
//! carries either marker is recognized as encrypted and left alone.

use crate::errors::{MatchVaultError, Result};

/// Marker prefix of the OpenSSL `enc -salt` format.
pub const V1_MARKER: &[u8; 8] = b"Salted__";

/// Marker prefix of the current authenticated format.
pub const V2_MARKER: &[u8; 20] = b"match_encrypted_v2__";

/// Size of the random salt in both formats.
pub const SALT_LEN: usize = 8;

/// Which envelope format a byte buffer carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeVersion {
    /// Legacy OpenSSL-compatible AES-256-CBC.
    V1,
    /// AES-256-GCM with PBKDF2-derived key material.
    V2,
}

/// A parsed envelope borrowing the ciphertext from the input buffer.
#[derive(Debug)]
pub struct Envelope<'a> {
    pub version: EnvelopeVersion,
    pub salt: [u8; SALT_LEN],
    pub ciphertext: &'a [u8],
}

/// Identify the envelope format from the leading marker, if any.
pub fn detect_version(data: &[u8]) -> Option<EnvelopeVersion> {
    if data.starts_with(V2_MARKER) {
        Some(EnvelopeVersion::V2)
    } else if data.starts_with(V1_MARKER) {
        Some(EnvelopeVersion::V1)
    } else {
        None
    }
}

/// True if the buffer starts with either envelope marker.
pub fn is_encrypted(data: &[u8]) -> bool {
    detect_version(data).is_some()
}

/// Parse an envelope, validating the marker and minimum length.
pub fn parse(data: &[u8]) -> Result<Envelope<'_>> {
    let version = detect_version(data).ok_or_else(|| {
        MatchVaultError::InvalidEnvelope("unrecognized format marker".into())
    })?;

    let marker_len = match version {
        EnvelopeVersion::V1 => V1_MARKER.len(),
        EnvelopeVersion::V2 => V2_MARKER.len(),
    };

    if data.len() < marker_len + SALT_LEN {
        return Err(MatchVaultError::InvalidEnvelope(
            "truncated envelope (missing salt)".into(),
        ));
    }

    let mut salt = [0u8; SALT_LEN];
    salt.copy_from_slice(&data[marker_len..marker_len + SALT_LEN]);

    Ok(Envelope {
        version,
        salt,
        ciphertext: &data[marker_len + SALT_LEN..],
    })
}

/// Assemble an envelope buffer from its parts.
pub fn seal(version: EnvelopeVersion, salt: &[u8; SALT_LEN], ciphertext: &[u8]) -> Vec<u8> {
    let marker: &[u8] = match version {
        EnvelopeVersion::V1 => V1_MARKER,
        EnvelopeVersion::V2 => V2_MARKER,
    };

    let mut out = Vec::with_capacity(marker.len() + SALT_LEN + ciphertext.len());
    out.extend_from_slice(marker);
    out.extend_from_slice(salt);
    out.extend_from_slice(ciphertext);
    out
}
