//! Store: the SQLite persistence layer.
//!
//! A thin handle over one `rusqlite::Connection`. Every component
//! receives the `Store` explicitly; there is no process-wide connection.

pub mod schema;

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{Connection, Transaction};

use crate::errors::{LockboxError, Result};

pub use schema::{ROOT_GROUP_ID, ROOT_GROUP_NAME};

/// Handle to the vault database.
pub struct Store {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Store {
    /// Open (or create) the database file at `path` and bootstrap the schema.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path).map_err(|e| {
            LockboxError::StoreUnavailable(format!("cannot open {}: {e}", path.display()))
        })?;
        // A background import holds a second connection to the same file.
        conn.busy_timeout(Duration::from_secs(5))?;

        if let Err(e) = restrict_permissions(path) {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "could not make vault database owner-only"
            );
        }

        schema::ensure_schema(&conn)?;
        tracing::debug!(path = %path.display(), "opened vault database");

        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Open a private in-memory database (tests, dry runs).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::ensure_schema(&conn)?;
        Ok(Self { conn, path: None })
    }

    /// Open a second connection to the same database file.
    ///
    /// Used to hand a connection to a background worker. In-memory
    /// stores cannot be shared this way.
    pub fn reopen(&self) -> Result<Self> {
        match &self.path {
            Some(path) => Self::open(path),
            None => Err(LockboxError::StoreUnavailable(
                "an in-memory store cannot be reopened".into(),
            )),
        }
    }

    /// Start a transaction. It commits on `commit()` and rolls back when
    /// dropped without one.
    pub fn transaction(&self) -> Result<Transaction<'_>> {
        self.conn
            .unchecked_transaction()
            .map_err(|e| LockboxError::StoreUnavailable(format!("begin transaction: {e}")))
    }

    /// Borrow the underlying connection for single-statement work.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Path of the database file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

/// Owner-only permissions on the database file.
#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
