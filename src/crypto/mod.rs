//! Cryptographic primitives for Lockbox.
//!
//! This module provides:
//! - AES-256-GCM sealing and opening of individual blobs (`encryption`)
//! - PBKDF2-HMAC-SHA256 password-based key derivation (`kdf`)
//! - The zeroizing `MasterKey` and its SHA-256 verifier (`keys`)

pub mod encryption;
pub mod kdf;
pub mod keys;

pub use encryption::{open, seal};
pub use kdf::{derive_key, generate_salt, KdfParams};
pub use keys::MasterKey;
