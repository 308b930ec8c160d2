//! Tag normalization and the entry <-> tag link table.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::errors::Result;

use super::Repository;

/// Trim, drop empties, and dedupe case-insensitively keeping the first
/// spelling seen.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for tag in tags {
        let tag = tag.as_ref().trim();
        if tag.is_empty() {
            continue;
        }
        if seen.insert(tag.to_lowercase()) {
            out.push(tag.to_string());
        }
    }
    out
}

/// Split a free-form tag string on `,` or `;` and normalize the pieces.
pub fn split_tags(raw: &str) -> Vec<String> {
    normalize_tags(raw.split([',', ';']))
}

/// Replace the full tag set of one entry.
///
/// A tag matching an existing one case-insensitively reuses that row and
/// its stored spelling. Tags left without entries are removed.
pub(crate) fn replace_entry_tags(conn: &Connection, entry_id: i64, tags: &[String]) -> Result<()> {
    conn.execute("DELETE FROM entry_tags WHERE entry_id = ?1", params![entry_id])?;

    let now = Utc::now().timestamp();
    for tag in normalize_tags(tags) {
        let tag_id = match find_tag(conn, &tag)? {
            Some(id) => id,
            None => {
                conn.execute(
                    "INSERT INTO tags(name, created_at, updated_at) VALUES(?1, ?2, ?2)",
                    params![tag, now],
                )?;
                conn.last_insert_rowid()
            }
        };
        conn.execute(
            "INSERT OR IGNORE INTO entry_tags(entry_id, tag_id, created_at) VALUES(?1, ?2, ?3)",
            params![entry_id, tag_id, now],
        )?;
    }
    prune_unused_tags(conn)
}

fn find_tag(conn: &Connection, name: &str) -> Result<Option<i64>> {
    Ok(conn
        .query_row(
            "SELECT id FROM tags WHERE name = ?1 COLLATE NOCASE ORDER BY id LIMIT 1",
            params![name],
            |r| r.get(0),
        )
        .optional()?)
}

/// Drop tag rows no entry links to any more.
pub(crate) fn prune_unused_tags(conn: &Connection) -> Result<()> {
    let removed = conn.execute(
        "DELETE FROM tags WHERE id NOT IN (SELECT DISTINCT tag_id FROM entry_tags)",
        [],
    )?;
    if removed > 0 {
        tracing::debug!(removed, "pruned unused tags");
    }
    Ok(())
}

/// Tags attached to one entry, ordered case-insensitively.
pub(crate) fn tags_for_entry(conn: &Connection, entry_id: i64) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT t.name FROM entry_tags et
         JOIN tags t ON t.id = et.tag_id
         WHERE et.entry_id = ?1
         ORDER BY t.name COLLATE NOCASE",
    )?;
    let rows = stmt.query_map(params![entry_id], |r| r.get::<_, String>(0))?;
    Ok(rows.collect::<std::result::Result<_, _>>()?)
}

/// Every entry's tags in one query, keyed by entry id.
pub(crate) fn tags_by_entry(conn: &Connection) -> Result<HashMap<i64, Vec<String>>> {
    let mut stmt = conn.prepare(
        "SELECT et.entry_id, t.name FROM entry_tags et
         JOIN tags t ON t.id = et.tag_id
         ORDER BY t.name COLLATE NOCASE",
    )?;
    let rows = stmt.query_map([], |r| Ok((r.get::<_, i64>(0)?, r.get::<_, String>(1)?)))?;

    let mut map: HashMap<i64, Vec<String>> = HashMap::new();
    for row in rows {
        let (entry_id, name) = row?;
        map.entry(entry_id).or_default().push(name);
    }
    Ok(map)
}

impl Repository<'_> {
    /// Every stored tag, case-insensitively sorted. Tags are pruned when
    /// their last entry lets go of them, so each one is in use.
    pub fn list_all_tags(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .store
            .conn()
            .prepare("SELECT name FROM tags ORDER BY name COLLATE NOCASE")?;
        let rows = stmt.query_map([], |r| r.get::<_, String>(0))?;
        Ok(rows.collect::<std::result::Result<_, _>>()?)
    }
}
