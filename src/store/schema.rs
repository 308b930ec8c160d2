//! Schema bootstrap.
//!
//! Creates every table the vault needs on first open and patches
//! older databases forward. Safe to run on every open.

use chrono::Utc;
use rusqlite::{params, Connection};

use crate::errors::Result;

/// Id of the root group seeded at schema creation.
pub const ROOT_GROUP_ID: i64 = 1;

/// Display name of the root group.
pub const ROOT_GROUP_NAME: &str = "All";

const TABLES: &str = "
    CREATE TABLE IF NOT EXISTS vault_meta (
        id             INTEGER PRIMARY KEY CHECK (id = 1),
        kdf_salt       BLOB NOT NULL,
        kdf_iterations INTEGER NOT NULL,
        verifier       BLOB NOT NULL,
        created_at     INTEGER NOT NULL,
        updated_at     INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS groups (
        id         INTEGER PRIMARY KEY AUTOINCREMENT,
        parent_id  INTEGER,
        name       TEXT NOT NULL,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL,
        UNIQUE(parent_id, name)
    );

    CREATE TABLE IF NOT EXISTS password_entries (
        id           INTEGER PRIMARY KEY AUTOINCREMENT,
        group_id     INTEGER NOT NULL DEFAULT 1,
        entry_type   INTEGER NOT NULL DEFAULT 0,
        title        TEXT NOT NULL,
        username     TEXT,
        password_enc BLOB NOT NULL,
        url          TEXT,
        category     TEXT,
        notes_enc    BLOB,
        created_at   INTEGER NOT NULL,
        updated_at   INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS tags (
        id         INTEGER PRIMARY KEY AUTOINCREMENT,
        name       TEXT NOT NULL UNIQUE,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS entry_tags (
        entry_id   INTEGER NOT NULL,
        tag_id     INTEGER NOT NULL,
        created_at INTEGER NOT NULL,
        PRIMARY KEY(entry_id, tag_id),
        FOREIGN KEY(entry_id) REFERENCES password_entries(id) ON DELETE CASCADE,
        FOREIGN KEY(tag_id) REFERENCES tags(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS common_passwords (
        id           INTEGER PRIMARY KEY AUTOINCREMENT,
        name         TEXT NOT NULL UNIQUE,
        password_enc BLOB NOT NULL,
        notes_enc    BLOB,
        created_at   INTEGER NOT NULL,
        updated_at   INTEGER NOT NULL
    );
";

const INDEXES: &str = "
    CREATE INDEX IF NOT EXISTS idx_password_entries_category   ON password_entries(category);
    CREATE INDEX IF NOT EXISTS idx_password_entries_group_id   ON password_entries(group_id);
    CREATE INDEX IF NOT EXISTS idx_password_entries_entry_type ON password_entries(entry_type);
    CREATE INDEX IF NOT EXISTS idx_password_entries_updated_at ON password_entries(updated_at DESC);
    CREATE INDEX IF NOT EXISTS idx_common_passwords_updated_at ON common_passwords(updated_at DESC);
    CREATE INDEX IF NOT EXISTS idx_entry_tags_tag_id           ON entry_tags(tag_id);
";

/// Create tables, seed the root group and back-fill late columns.
pub fn ensure_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.execute_batch(TABLES)?;

    let now = Utc::now().timestamp();
    conn.execute(
        "INSERT OR IGNORE INTO groups(id, parent_id, name, created_at, updated_at)
         VALUES(?1, NULL, ?2, ?3, ?3)",
        params![ROOT_GROUP_ID, ROOT_GROUP_NAME, now],
    )?;

    // Databases created before groups and entry types existed.
    ensure_column(
        conn,
        "password_entries",
        "group_id",
        "INTEGER NOT NULL DEFAULT 1",
    )?;
    ensure_column(
        conn,
        "password_entries",
        "entry_type",
        "INTEGER NOT NULL DEFAULT 0",
    )?;

    conn.execute_batch(INDEXES)?;
    Ok(())
}

fn has_column(conn: &Connection, table: &str, column: &str) -> Result<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
    let names = stmt.query_map([], |row| row.get::<_, String>(1))?;
    for name in names {
        if name? == column {
            return Ok(true);
        }
    }
    Ok(false)
}

fn ensure_column(conn: &Connection, table: &str, column: &str, decl: &str) -> Result<()> {
    if !has_column(conn, table, column)? {
        tracing::info!(table, column, "adding missing column");
        conn.execute_batch(&format!("ALTER TABLE {table} ADD COLUMN {column} {decl}"))?;
    }
    Ok(())
}
