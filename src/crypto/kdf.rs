//! Password-based key derivation for both envelope formats.
//!
//! V1 reproduces OpenSSL's `EVP_BytesToKey` with one round so that
//! envelopes written by `openssl enc -aes-256-cbc -k <password>` decrypt
//! bit-for-bit. Two hash variants exist in the wild (MD5, the OpenSSL
//! default, and SHA-256) and both are supported.
//!
//! V2 uses PBKDF2-HMAC-SHA256 to stretch the password into 60 bytes,
//! split as key (32) || nonce (12) || AAD (16). The nonce is derived,
//! not random, so nonce uniqueness rests on the salt being freshly
//! generated for every encryption call.

use md5::Md5;
use pbkdf2::pbkdf2_hmac;
use rand::TryRngCore;
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

use crate::crypto::envelope::SALT_LEN;
use crate::errors::{MatchVaultError, Result};

/// AES-256 key length used by both formats.
pub const KEY_LEN: usize = 32;

/// CBC initialization vector length (V1).
pub const IV_LEN: usize = 16;

/// GCM nonce length (V2).
pub const NONCE_LEN: usize = 12;

/// GCM associated-data length (V2).
pub const AAD_LEN: usize = 16;

/// PBKDF2 iteration count (V2).
pub const PBKDF2_ROUNDS: u32 = 10_000;

/// Hash variant for the legacy `EVP_BytesToKey` derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyDigest {
    /// OpenSSL's historical default.
    Md5,
    /// Used by envelopes written with `openssl enc -md sha256`.
    Sha256,
}

/// OpenSSL `EVP_BytesToKey` with one round: hash(prev || password || salt)
/// repeatedly until enough key material is produced.
fn evp_bytes_to_key<D: Digest>(password: &[u8], salt: &[u8; SALT_LEN], out: &mut [u8]) {
    let mut prev: Vec<u8> = Vec::new();
    let mut written = 0;

    while written < out.len() {
        let mut hasher = D::new();
        hasher.update(&prev);
        hasher.update(password);
        hasher.update(salt);
        prev = hasher.finalize().to_vec();

        let take = prev.len().min(out.len() - written);
        out[written..written + take].copy_from_slice(&prev[..take]);
        written += take;
    }

    prev.zeroize();
}

/// Derive the V1 key and IV from a password and salt.
///
/// Callers must zeroize the returned arrays once the cipher is built.
pub fn legacy_key_iv(
    password: &[u8],
    salt: &[u8; SALT_LEN],
    digest: LegacyDigest,
) -> ([u8; KEY_LEN], [u8; IV_LEN]) {
    let mut material = [0u8; KEY_LEN + IV_LEN];
    match digest {
        LegacyDigest::Md5 => evp_bytes_to_key::<Md5>(password, salt, &mut material),
        LegacyDigest::Sha256 => evp_bytes_to_key::<Sha256>(password, salt, &mut material),
    }

    let mut key = [0u8; KEY_LEN];
    let mut iv = [0u8; IV_LEN];
    key.copy_from_slice(&material[..KEY_LEN]);
    iv.copy_from_slice(&material[KEY_LEN..]);
    material.zeroize();

    (key, iv)
}

/// Key material for one V2 encryption or decryption.
///
/// Wiped from memory on drop.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct V2KeyMaterial {
    pub key: [u8; KEY_LEN],
    pub nonce: [u8; NONCE_LEN],
    pub aad: [u8; AAD_LEN],
}

/// Stretch a password into V2 key material with PBKDF2-HMAC-SHA256.
///
/// The same password + salt always produce the same material.
pub fn v2_key_material(password: &[u8], salt: &[u8; SALT_LEN]) -> V2KeyMaterial {
    let mut okm = [0u8; KEY_LEN + NONCE_LEN + AAD_LEN];
    pbkdf2_hmac::<Sha256>(password, salt, PBKDF2_ROUNDS, &mut okm);

    let mut material = V2KeyMaterial {
        key: [0u8; KEY_LEN],
        nonce: [0u8; NONCE_LEN],
        aad: [0u8; AAD_LEN],
    };
    material.key.copy_from_slice(&okm[..KEY_LEN]);
    material.nonce.copy_from_slice(&okm[KEY_LEN..KEY_LEN + NONCE_LEN]);
    material.aad.copy_from_slice(&okm[KEY_LEN + NONCE_LEN..]);
    okm.zeroize();

    material
}

/// Generate a cryptographically random 8-byte salt.
pub fn generate_salt() -> Result<[u8; SALT_LEN]> {
    let mut salt = [0u8; SALT_LEN];
    rand::rngs::OsRng
        .try_fill_bytes(&mut salt)
        .map_err(|e| MatchVaultError::EncryptionFailed(format!("salt generation failed: {e}")))?;
    Ok(salt)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PASSWORD: &[u8] = b"testpassword";
    const SALT: [u8; SALT_LEN] = [1, 2, 3, 4, 5, 6, 7, 8];

    // Reference values computed with `openssl enc -aes-256-cbc -md md5`
    // for this password and salt.
    #[test]
    fn legacy_md5_matches_openssl() {
        let (key, iv) = legacy_key_iv(PASSWORD, &SALT, LegacyDigest::Md5);
        assert_eq!(
            hex::encode(key),
            "f24998edc01d3be2a98408607213b5dbe7ef2f9568690bef8c4c5a85088d22af"
        );
        assert_eq!(hex::encode(iv), "7096d5da92abf76fe4bcb5a19bf56f42");
    }

    #[test]
    fn legacy_sha256_matches_openssl() {
        let (key, iv) = legacy_key_iv(PASSWORD, &SALT, LegacyDigest::Sha256);
        assert_eq!(
            hex::encode(key),
            "ddd3f7966bf48048a00da15d45d8560fc336d7442fe5890817b1e7c6603f3a45"
        );
        assert_eq!(hex::encode(iv), "2112572a97b49153b278c4596655aa75");
    }

    #[test]
    fn v2_material_is_deterministic_and_split_correctly() {
        let material = v2_key_material(PASSWORD, &SALT);
        assert_eq!(
            hex::encode(material.key),
            "c5e6c9927bfa0d407e902c09718484b60e59bd1b414a941a52defa166d1845e2"
        );
        assert_eq!(hex::encode(material.nonce), "fbb9b528ce7ff47f26aeb9ec");
        assert_eq!(hex::encode(material.aad), "11e89d10486a6f21cdc94e100fa43e62");
    }

    #[test]
    fn different_salts_produce_different_material() {
        let a = v2_key_material(PASSWORD, &SALT);
        let b = v2_key_material(PASSWORD, &[9, 9, 9, 9, 9, 9, 9, 9]);
        assert_ne!(a.key, b.key);
        assert_ne!(a.nonce, b.nonce);
    }

    #[test]
    fn generated_salts_are_unique() {
        let a = generate_salt().unwrap();
        let b = generate_salt().unwrap();
        assert_ne!(a, b);
    }
}
