//! Backup file format.
//!
//! A backup is a JSON envelope whose only secret-bearing field is one
//! sealed blob:
//!
//! ```text
//! { "format": "LockboxBackup", "version": 1,
//!   "kdf": { "salt": "<base64>", "iterations": 120000 },
//!   "ciphertext": "<base64>", "exported_at": 1700000000 }
//! ```
//!
//! The ciphertext opens, under a key derived from the backup passphrase,
//! to a `BackupPayload` JSON document.

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::crypto::encryption::{open, seal};
use crate::crypto::kdf::{derive_key, generate_salt, MIN_ITERATIONS};
use crate::errors::{LockboxError, Result};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Format tag written into every envelope.
pub const FORMAT_TAG: &str = "LockboxBackup";

/// Current envelope and payload version.
pub const FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// KDF parameters, stored in the clear next to the ciphertext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfSection {
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub salt: Vec<u8>,
    pub iterations: u32,
}

/// The outer, unencrypted document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupEnvelope {
    pub format: String,
    pub version: u32,
    pub kdf: KdfSection,
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub ciphertext: Vec<u8>,
    #[serde(default)]
    pub exported_at: i64,
}

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupGroup {
    pub id: i64,
    /// 0 for top-level groups.
    #[serde(default)]
    pub parent_id: i64,
    pub name: String,
}

/// One entry with its plaintext secrets. Wiped on drop.
#[derive(Clone, Default, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct BackupEntry {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub group_id: i64,
    #[serde(default)]
    pub entry_type: i64,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

/// A common password with its plaintext secrets. Wiped on drop.
#[derive(Clone, Default, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct BackupCommonPassword {
    pub name: String,
    pub password: String,
    #[serde(default)]
    pub notes: String,
}

/// The sealed document.
#[derive(Default, Serialize, Deserialize)]
pub struct BackupPayload {
    pub version: u32,
    pub exported_at: i64,
    pub groups: Vec<BackupGroup>,
    pub entries: Vec<BackupEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub common_passwords: Vec<BackupCommonPassword>,
}

// ---------------------------------------------------------------------------
// Sealing
// ---------------------------------------------------------------------------

/// Seal `payload` under a fresh salt and `iterations` rounds of the KDF.
pub fn seal_payload(
    payload: &BackupPayload,
    passphrase: &str,
    iterations: u32,
) -> Result<BackupEnvelope> {
    let salt = generate_salt();
    let key = derive_key(passphrase.as_bytes(), &salt, iterations)?;

    let plaintext = Zeroizing::new(
        serde_json::to_vec(payload)
            .map_err(|e| LockboxError::Serialization(format!("backup payload: {e}")))?,
    );
    let ciphertext = seal(key.as_bytes(), &plaintext)?;

    Ok(BackupEnvelope {
        format: FORMAT_TAG.to_string(),
        version: FORMAT_VERSION,
        kdf: KdfSection {
            salt: salt.to_vec(),
            iterations,
        },
        ciphertext,
        exported_at: payload.exported_at,
    })
}

/// Parse the outer JSON and check its tag and version.
pub fn parse_envelope(data: &[u8]) -> Result<BackupEnvelope> {
    let envelope: BackupEnvelope = serde_json::from_slice(data)
        .map_err(|e| LockboxError::UnrecognizedFormat(format!("backup envelope: {e}")))?;

    if envelope.format != FORMAT_TAG {
        return Err(LockboxError::UnrecognizedFormat(format!(
            "not a Lockbox backup (format '{}')",
            envelope.format
        )));
    }
    if envelope.version != FORMAT_VERSION {
        return Err(LockboxError::UnrecognizedFormat(format!(
            "unsupported backup version {}, expected {FORMAT_VERSION}",
            envelope.version
        )));
    }
    if envelope.kdf.salt.is_empty() || envelope.kdf.iterations < MIN_ITERATIONS {
        return Err(LockboxError::UnrecognizedFormat(
            "backup KDF parameters are invalid".into(),
        ));
    }
    Ok(envelope)
}

/// Derive the key from `passphrase` and open the payload.
pub fn open_payload(envelope: &BackupEnvelope, passphrase: &str) -> Result<BackupPayload> {
    let key = derive_key(
        passphrase.as_bytes(),
        &envelope.kdf.salt,
        envelope.kdf.iterations,
    )?;
    let plaintext = Zeroizing::new(
        open(key.as_bytes(), &envelope.ciphertext)
            .map_err(|_| LockboxError::WrongPassphraseOrCorrupt)?,
    );

    let payload: BackupPayload = serde_json::from_slice(&plaintext)
        .map_err(|e| LockboxError::UnrecognizedFormat(format!("backup payload: {e}")))?;
    if payload.version != FORMAT_VERSION {
        return Err(LockboxError::UnrecognizedFormat(format!(
            "unsupported backup payload version {}",
            payload.version
        )));
    }
    Ok(payload)
}

// ---------------------------------------------------------------------------
// Serde helpers for base64-encoded Vec<u8> fields
// ---------------------------------------------------------------------------

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

fn base64_encode<S>(data: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    let encoded = BASE64.encode(data);
    serializer.serialize_str(&encoded)
}

fn base64_decode<'de, D>(deserializer: D) -> std::result::Result<Vec<u8>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    BASE64.decode(&s).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> BackupPayload {
        let mut entry = BackupEntry::default();
        entry.title = "Mail".into();
        entry.password = "hunter2".into();
        BackupPayload {
            version: FORMAT_VERSION,
            exported_at: 1_700_000_000,
            groups: vec![BackupGroup {
                id: 2,
                parent_id: 1,
                name: "Work".into(),
            }],
            entries: vec![entry],
            common_passwords: Vec::new(),
        }
    }

    #[test]
    fn envelope_json_has_expected_shape() {
        let env = seal_payload(&payload(), "pass", MIN_ITERATIONS).unwrap();
        let json: serde_json::Value = serde_json::to_value(&env).unwrap();

        assert_eq!(json["format"], FORMAT_TAG);
        assert_eq!(json["version"], 1);
        assert_eq!(json["kdf"]["iterations"], MIN_ITERATIONS);
        assert!(json["kdf"]["salt"].is_string());
        assert!(json["ciphertext"].is_string());
        assert_eq!(json["exported_at"], 1_700_000_000);
        assert!(!json.to_string().contains("hunter2"));
    }

    #[test]
    fn seal_then_open() {
        let env = seal_payload(&payload(), "pass", MIN_ITERATIONS).unwrap();
        let bytes = serde_json::to_vec(&env).unwrap();
        let parsed = parse_envelope(&bytes).unwrap();
        let opened = open_payload(&parsed, "pass").unwrap();
        assert_eq!(opened.groups[0].name, "Work");
        assert_eq!(opened.entries[0].password, "hunter2");
    }

    #[test]
    fn wrong_passphrase_is_reported() {
        let env = seal_payload(&payload(), "pass", MIN_ITERATIONS).unwrap();
        assert!(matches!(
            open_payload(&env, "nope"),
            Err(LockboxError::WrongPassphraseOrCorrupt)
        ));
    }

    #[test]
    fn tag_and_version_are_checked_before_decryption() {
        let mut env = seal_payload(&payload(), "pass", MIN_ITERATIONS).unwrap();
        env.format = "SomethingElse".into();
        let bytes = serde_json::to_vec(&env).unwrap();
        assert!(matches!(
            parse_envelope(&bytes),
            Err(LockboxError::UnrecognizedFormat(_))
        ));

        env.format = FORMAT_TAG.into();
        env.version = 2;
        let bytes = serde_json::to_vec(&env).unwrap();
        assert!(matches!(
            parse_envelope(&bytes),
            Err(LockboxError::UnrecognizedFormat(_))
        ));

        assert!(matches!(
            parse_envelope(b"not json"),
            Err(LockboxError::UnrecognizedFormat(_))
        ));
    }

    #[test]
    fn tampered_ciphertext_fails_closed() {
        let mut env = seal_payload(&payload(), "pass", MIN_ITERATIONS).unwrap();
        let last = env.ciphertext.len() - 1;
        env.ciphertext[last] ^= 0x01;
        assert!(matches!(
            open_payload(&env, "pass"),
            Err(LockboxError::WrongPassphraseOrCorrupt)
        ));
    }
}
