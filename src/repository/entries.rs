//! Password entry CRUD.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::errors::{LockboxError, Result};
use crate::store::ROOT_GROUP_ID;

use super::model::{from_unix, EntryType, PasswordEntry, PasswordEntrySecrets};
use super::tags::{prune_unused_tags, replace_entry_tags, tags_by_entry, tags_for_entry};
use super::Repository;

const ENTRY_COLUMNS: &str =
    "id, group_id, entry_type, title, username, url, category, created_at, updated_at";

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<PasswordEntry> {
    Ok(PasswordEntry {
        id: row.get(0)?,
        group_id: row.get(1)?,
        entry_type: EntryType::from_i64(row.get(2)?),
        title: row.get(3)?,
        username: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        url: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        category: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
        tags: Vec::new(),
        created_at: from_unix(row.get(7)?),
        updated_at: from_unix(row.get(8)?),
    })
}

/// Map a missing, zero or negative group id to the root group.
fn resolve_group(conn: &Connection, group_id: i64) -> Result<i64> {
    if group_id <= 0 {
        return Ok(ROOT_GROUP_ID);
    }
    let exists = conn
        .query_row(
            "SELECT 1 FROM groups WHERE id = ?1",
            params![group_id],
            |_| Ok(()),
        )
        .optional()?
        .is_some();
    if exists {
        Ok(group_id)
    } else {
        tracing::debug!(group_id, "unknown group, filing entry under root");
        Ok(ROOT_GROUP_ID)
    }
}

fn validate(secrets: &PasswordEntrySecrets) -> Result<()> {
    if secrets.entry.title.trim().is_empty() {
        return Err(LockboxError::EmptyInput("title"));
    }
    if secrets.password.is_empty() {
        return Err(LockboxError::EmptyInput("password"));
    }
    Ok(())
}

impl Repository<'_> {
    /// Index metadata of every entry, most recently updated first.
    pub fn list_entries(&self) -> Result<Vec<PasswordEntry>> {
        let conn = self.store.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {ENTRY_COLUMNS} FROM password_entries ORDER BY updated_at DESC, id DESC"
        ))?;
        let mut entries = stmt
            .query_map([], entry_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut tags = tags_by_entry(conn)?;
        for entry in &mut entries {
            entry.tags = tags.remove(&entry.id).unwrap_or_default();
        }
        Ok(entries)
    }

    /// Distinct non-empty categories, case-insensitively sorted.
    pub fn list_categories(&self) -> Result<Vec<String>> {
        let mut stmt = self.store.conn().prepare(
            "SELECT DISTINCT category FROM password_entries
             WHERE category IS NOT NULL AND TRIM(category) <> ''
             ORDER BY category COLLATE NOCASE",
        )?;
        let rows = stmt.query_map([], |r| r.get::<_, String>(0))?;
        Ok(rows.collect::<std::result::Result<_, _>>()?)
    }

    /// Load one entry with its password and notes opened.
    pub fn load_entry(&self, id: i64) -> Result<PasswordEntrySecrets> {
        self.vault.key()?;
        let conn = self.store.conn();

        let row = conn
            .query_row(
                &format!(
                    "SELECT {ENTRY_COLUMNS}, password_enc, notes_enc
                     FROM password_entries WHERE id = ?1"
                ),
                params![id],
                |r| {
                    Ok((
                        entry_from_row(r)?,
                        r.get::<_, Vec<u8>>(9)?,
                        r.get::<_, Option<Vec<u8>>>(10)?,
                    ))
                },
            )
            .optional()?;
        let (mut entry, password_enc, notes_enc) =
            row.ok_or_else(|| LockboxError::NotFound(format!("entry {id}")))?;

        entry.tags = tags_for_entry(conn, id)?;
        let password = self.open_text(Some(&password_enc)).map_err(|e| {
            tracing::warn!(id, "entry password did not open");
            e
        })?;
        let notes = self.open_text(notes_enc.as_deref())?;

        Ok(PasswordEntrySecrets::new(entry, password, notes))
    }

    /// Insert a new entry stamped with the current time.
    pub fn add_entry(&self, secrets: &PasswordEntrySecrets) -> Result<i64> {
        let now = Utc::now().timestamp();
        self.add_entry_with_timestamps(secrets, now, now)
    }

    /// Insert a new entry with caller-supplied timestamps (unix seconds).
    ///
    /// A non-positive `created_at` becomes now; a non-positive
    /// `updated_at` falls back to `created_at`.
    pub fn add_entry_with_timestamps(
        &self,
        secrets: &PasswordEntrySecrets,
        created_at: i64,
        updated_at: i64,
    ) -> Result<i64> {
        validate(secrets)?;
        let password_enc = self.seal_text(&secrets.password)?;
        let notes_enc = self.seal_optional(&secrets.notes)?;

        let created_at = if created_at > 0 {
            created_at
        } else {
            Utc::now().timestamp()
        };
        let updated_at = if updated_at > 0 { updated_at } else { created_at };

        let entry = &secrets.entry;
        let tx = self.store.transaction()?;
        let group_id = resolve_group(&tx, entry.group_id)?;
        tx.execute(
            "INSERT INTO password_entries(
                 group_id, entry_type, title, username, password_enc,
                 url, category, notes_enc, created_at, updated_at)
             VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                group_id,
                entry.entry_type.as_i64(),
                entry.title,
                entry.username,
                password_enc,
                entry.url,
                entry.category,
                notes_enc,
                created_at,
                updated_at
            ],
        )?;
        let id = tx.last_insert_rowid();
        replace_entry_tags(&tx, id, &entry.tags)?;
        tx.commit()?;

        tracing::debug!(id, group_id, "entry added");
        Ok(id)
    }

    /// Rewrite every column of an existing entry and its tag set.
    pub fn update_entry(&self, secrets: &PasswordEntrySecrets) -> Result<()> {
        let entry = &secrets.entry;
        if entry.id <= 0 {
            return Err(LockboxError::InvalidArgument(format!(
                "invalid entry id {}",
                entry.id
            )));
        }
        validate(secrets)?;
        let password_enc = self.seal_text(&secrets.password)?;
        let notes_enc = self.seal_optional(&secrets.notes)?;
        let now = Utc::now().timestamp();

        let tx = self.store.transaction()?;
        let group_id = resolve_group(&tx, entry.group_id)?;
        let changed = tx.execute(
            "UPDATE password_entries SET
                 group_id = ?1, entry_type = ?2, title = ?3, username = ?4,
                 password_enc = ?5, url = ?6, category = ?7, notes_enc = ?8,
                 updated_at = ?9
             WHERE id = ?10",
            params![
                group_id,
                entry.entry_type.as_i64(),
                entry.title,
                entry.username,
                password_enc,
                entry.url,
                entry.category,
                notes_enc,
                now,
                entry.id
            ],
        )?;
        if changed == 0 {
            return Err(LockboxError::NotFound(format!("entry {}", entry.id)));
        }
        replace_entry_tags(&tx, entry.id, &entry.tags)?;
        tx.commit()?;

        tracing::debug!(id = entry.id, "entry updated");
        Ok(())
    }

    /// Re-file an entry under another group.
    pub fn move_entry_to_group(&self, entry_id: i64, group_id: i64) -> Result<()> {
        self.vault.key()?;
        if entry_id <= 0 || group_id <= 0 {
            return Err(LockboxError::InvalidArgument(
                "entry and group ids must be positive".into(),
            ));
        }
        let conn = self.store.conn();
        if resolve_group(conn, group_id)? != group_id {
            return Err(LockboxError::NotFound(format!("group {group_id}")));
        }

        let changed = conn.execute(
            "UPDATE password_entries SET group_id = ?1, updated_at = ?2 WHERE id = ?3",
            params![group_id, Utc::now().timestamp(), entry_id],
        )?;
        if changed == 0 {
            return Err(LockboxError::NotFound(format!("entry {entry_id}")));
        }
        Ok(())
    }

    /// Delete an entry and its tag links.
    pub fn delete_entry(&self, id: i64) -> Result<()> {
        self.vault.key()?;
        if id <= 0 {
            return Err(LockboxError::InvalidArgument(format!("invalid entry id {id}")));
        }
        let tx = self.store.transaction()?;
        tx.execute("DELETE FROM entry_tags WHERE entry_id = ?1", params![id])?;
        let changed = tx.execute("DELETE FROM password_entries WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(LockboxError::NotFound(format!("entry {id}")));
        }
        prune_unused_tags(&tx)?;
        tx.commit()?;
        tracing::debug!(id, "entry deleted");
        Ok(())
    }
}
