//! Envelope encryption and decryption.
//!
//! `encrypt` produces the current V2 format (AES-256-GCM, PBKDF2 key
//! material); `encrypt_legacy` produces the OpenSSL-compatible V1 format
//! (AES-256-CBC, `EVP_BytesToKey`). `decrypt` dispatches on the envelope
//! marker, so callers never need to know which format a file carries.
//!
//! A fresh random salt is drawn for every encryption call, which makes
//! the output non-deterministic for identical inputs and keeps the
//! derived V2 nonce unique.

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Nonce};
use zeroize::Zeroize;

use crate::crypto::envelope::{self, Envelope, EnvelopeVersion, SALT_LEN};
use crate::crypto::kdf::{self, LegacyDigest};
use crate::errors::{MatchVaultError, Result};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// GCM authentication tag length appended to V2 ciphertexts.
const TAG_LEN: usize = 16;

/// Encrypt `plaintext` into the current (V2) envelope format.
pub fn encrypt(plaintext: &[u8], password: &str) -> Result<Vec<u8>> {
    encrypt_with_version(plaintext, password, EnvelopeVersion::V2)
}

/// Encrypt `plaintext` into the legacy (V1) envelope format.
///
/// Output is readable by `openssl enc -d -aes-256-cbc -md md5 -k <password>`.
pub fn encrypt_legacy(plaintext: &[u8], password: &str) -> Result<Vec<u8>> {
    encrypt_with_version(plaintext, password, EnvelopeVersion::V1)
}

/// Encrypt `plaintext` into the requested envelope format.
pub fn encrypt_with_version(
    plaintext: &[u8],
    password: &str,
    version: EnvelopeVersion,
) -> Result<Vec<u8>> {
    ensure_password(password)?;

    let salt = kdf::generate_salt()?;
    let ciphertext = match version {
        EnvelopeVersion::V1 => v1_encrypt(plaintext, password.as_bytes(), &salt),
        EnvelopeVersion::V2 => v2_encrypt(plaintext, password.as_bytes(), &salt)?,
    };

    Ok(envelope::seal(version, &salt, &ciphertext))
}

/// Decrypt an envelope produced by either format.
///
/// V1 envelopes are tried with the MD5 key derivation first, then
/// SHA-256; envelopes written by either OpenSSL variant decrypt without
/// the caller specifying which.
pub fn decrypt(data: &[u8], password: &str) -> Result<Vec<u8>> {
    ensure_password(password)?;

    let parsed = envelope::parse(data)?;
    match parsed.version {
        EnvelopeVersion::V2 => v2_decrypt(&parsed, password.as_bytes()),
        EnvelopeVersion::V1 => {
            match v1_decrypt(&parsed, password.as_bytes(), LegacyDigest::Md5) {
                Ok(plaintext) => Ok(plaintext),
                Err(MatchVaultError::InvalidPassword) => {
                    v1_decrypt(&parsed, password.as_bytes(), LegacyDigest::Sha256)
                }
                Err(e) => Err(e),
            }
        }
    }
}

/// Reject empty passwords before any cryptographic work.
fn ensure_password(password: &str) -> Result<()> {
    if password.is_empty() {
        return Err(MatchVaultError::NoPassword);
    }
    Ok(())
}

fn v1_encrypt(plaintext: &[u8], password: &[u8], salt: &[u8; SALT_LEN]) -> Vec<u8> {
    let (mut key, mut iv) = kdf::legacy_key_iv(password, salt, LegacyDigest::Md5);

    let ciphertext = Aes256CbcEnc::new((&key).into(), (&iv).into())
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    key.zeroize();
    iv.zeroize();
    ciphertext
}

fn v1_decrypt(parsed: &Envelope<'_>, password: &[u8], digest: LegacyDigest) -> Result<Vec<u8>> {
    if parsed.ciphertext.is_empty() || parsed.ciphertext.len() % 16 != 0 {
        return Err(MatchVaultError::InvalidEnvelope(
            "CBC ciphertext length is not a multiple of the block size".into(),
        ));
    }

    let (mut key, mut iv) = kdf::legacy_key_iv(password, &parsed.salt, digest);

    // A wrong key surfaces as a PKCS7 unpadding failure.
    let result = Aes256CbcDec::new((&key).into(), (&iv).into())
        .decrypt_padded_vec_mut::<Pkcs7>(parsed.ciphertext)
        .map_err(|_| MatchVaultError::InvalidPassword);

    key.zeroize();
    iv.zeroize();
    result
}

fn v2_encrypt(plaintext: &[u8], password: &[u8], salt: &[u8; SALT_LEN]) -> Result<Vec<u8>> {
    let material = kdf::v2_key_material(password, salt);

    let cipher = Aes256Gcm::new_from_slice(&material.key)
        .map_err(|e| MatchVaultError::EncryptionFailed(format!("invalid key length: {e}")))?;
    let nonce = Nonce::from_slice(&material.nonce);

    cipher
        .encrypt(
            nonce,
            Payload {
                msg: plaintext,
                aad: &material.aad,
            },
        )
        .map_err(|e| MatchVaultError::EncryptionFailed(format!("encryption error: {e}")))
}

fn v2_decrypt(parsed: &Envelope<'_>, password: &[u8]) -> Result<Vec<u8>> {
    if parsed.ciphertext.len() < TAG_LEN {
        return Err(MatchVaultError::InvalidEnvelope(
            "GCM ciphertext shorter than the authentication tag".into(),
        ));
    }

    let material = kdf::v2_key_material(password, &parsed.salt);

    let cipher = Aes256Gcm::new_from_slice(&material.key)
        .map_err(|_| MatchVaultError::InvalidPassword)?;
    let nonce = Nonce::from_slice(&material.nonce);

    // Decrypt and verify the auth tag (which also covers the AAD).
    cipher
        .decrypt(
            nonce,
            Payload {
                msg: parsed.ciphertext,
                aad: &material.aad,
            },
        )
        .map_err(|_| MatchVaultError::InvalidPassword)
}
