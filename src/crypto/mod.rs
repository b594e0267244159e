//! Cryptographic layer for matchvault.
//!
//! This module provides:
//! - Self-describing envelope formats and marker sniffing (`envelope`)
//! - Password-based key derivation for both formats (`kdf`)
//! - Envelope encryption and decryption (`encryption`)

pub mod encryption;
pub mod envelope;
pub mod kdf;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{encrypt, decrypt, is_encrypted, ...};
pub use encryption::{decrypt, encrypt, encrypt_legacy, encrypt_with_version};
pub use envelope::{detect_version, is_encrypted, EnvelopeVersion};
