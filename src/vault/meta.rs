//! The singleton `vault_meta` row: KDF salt, iteration count, verifier.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::errors::Result;

/// Persisted key-derivation metadata.
///
/// Replaced wholesale on master-password rotation, never patched
/// field by field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultMetadata {
    pub salt: Vec<u8>,
    pub iterations: u32,
    pub verifier: Vec<u8>,
}

/// Read the metadata row, or `None` for an uninitialized vault.
pub fn read(conn: &Connection) -> Result<Option<VaultMetadata>> {
    let meta = conn
        .query_row(
            "SELECT kdf_salt, kdf_iterations, verifier FROM vault_meta WHERE id = 1",
            [],
            |row| {
                Ok(VaultMetadata {
                    salt: row.get(0)?,
                    iterations: row.get(1)?,
                    verifier: row.get(2)?,
                })
            },
        )
        .optional()?;
    Ok(meta)
}

/// Insert or replace the metadata row. `created_at` survives replacement.
pub fn write(conn: &Connection, meta: &VaultMetadata) -> Result<()> {
    let now = Utc::now().timestamp();
    conn.execute(
        "INSERT INTO vault_meta(id, kdf_salt, kdf_iterations, verifier, created_at, updated_at)
         VALUES(1, ?1, ?2, ?3, ?4, ?4)
         ON CONFLICT(id) DO UPDATE SET
             kdf_salt = excluded.kdf_salt,
             kdf_iterations = excluded.kdf_iterations,
             verifier = excluded.verifier,
             updated_at = excluded.updated_at",
        params![meta.salt, meta.iterations, meta.verifier, now],
    )?;
    Ok(())
}
