//! Encrypted backups.
//!
//! A backup holds every group, every entry and every common password
//! with its secrets opened, sealed as one blob under a key derived from
//! a separate backup passphrase. The vault key is only used to read
//! entries during export and to re-seal them during restore.

pub mod format;

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::Path;

use chrono::Utc;

use crate::errors::{LockboxError, Result};
use crate::repository::{
    CommonPasswordSecrets, EntryType, Group, PasswordEntry, PasswordEntrySecrets, Repository,
};
use crate::store::ROOT_GROUP_ID;

pub use format::{
    open_payload, parse_envelope, seal_payload, BackupCommonPassword, BackupEntry, BackupEnvelope,
    BackupGroup, BackupPayload, FORMAT_TAG, FORMAT_VERSION,
};

/// What a restore wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreSummary {
    pub groups_created: usize,
    pub groups_reused: usize,
    pub entries_imported: usize,
    pub entries_skipped: usize,
    pub common_passwords_imported: usize,
    pub common_passwords_skipped: usize,
}

fn require_passphrase(passphrase: &str) -> Result<()> {
    if passphrase.is_empty() {
        return Err(LockboxError::EmptyInput("backup passphrase"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

/// Collect everything in the vault into a plaintext payload.
pub fn collect_payload(repo: &Repository<'_>) -> Result<BackupPayload> {
    repo.vault().key()?;

    let groups = repo
        .list_groups()?
        .into_iter()
        .map(|g| BackupGroup {
            id: g.id,
            parent_id: g.parent_id.unwrap_or(0),
            name: g.name,
        })
        .collect();

    let mut entries = Vec::new();
    for summary in repo.list_entries()? {
        let s = repo.load_entry(summary.id)?;
        let e = &s.entry;
        entries.push(BackupEntry {
            title: e.title.clone(),
            username: e.username.clone(),
            password: s.password.clone(),
            url: e.url.clone(),
            group_id: e.group_id,
            entry_type: e.entry_type.as_i64(),
            category: e.category.clone(),
            tags: e.tags.clone(),
            notes: s.notes.clone(),
            created_at: e.created_at.timestamp(),
            updated_at: e.updated_at.timestamp(),
        });
    }

    let mut common_passwords = Vec::new();
    for item in repo.list_common_passwords()? {
        let s = repo.load_common_password(item.id)?;
        common_passwords.push(BackupCommonPassword {
            name: s.item.name.clone(),
            password: s.password.clone(),
            notes: s.notes.clone(),
        });
    }

    Ok(BackupPayload {
        version: FORMAT_VERSION,
        exported_at: Utc::now().timestamp(),
        groups,
        entries,
        common_passwords,
    })
}

/// Export the vault as a sealed backup document (pretty JSON bytes).
pub fn export_backup(repo: &Repository<'_>, passphrase: &str, iterations: u32) -> Result<Vec<u8>> {
    require_passphrase(passphrase)?;
    let payload = collect_payload(repo)?;
    let envelope = seal_payload(&payload, passphrase, iterations)?;

    tracing::info!(
        groups = payload.groups.len(),
        entries = payload.entries.len(),
        common_passwords = payload.common_passwords.len(),
        "backup exported"
    );
    serde_json::to_vec_pretty(&envelope)
        .map_err(|e| LockboxError::Serialization(format!("backup envelope: {e}")))
}

/// Write `data` to `path` atomically with owner-only permissions.
///
/// The data goes to a temp file in the same directory first and is then
/// renamed over the target, so readers never see a half-written file.
pub fn write_private_file(path: &Path, data: &[u8]) -> Result<()> {
    let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(dir) = parent {
        fs::create_dir_all(dir)?;
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = std::path::PathBuf::from(tmp_name);

    let mut file = fs::File::create(&tmp_path)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&tmp_path, fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(data)?;
    file.sync_all()?;
    drop(file);

    fs::rename(&tmp_path, path)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

/// Restore a backup document into `repo`.
///
/// The tag, version and passphrase are all checked before anything is
/// written. Groups are matched to existing ones by parent and
/// case-insensitive name; entries are always added as new rows.
pub fn import_backup(repo: &Repository<'_>, data: &[u8], passphrase: &str) -> Result<RestoreSummary> {
    repo.vault().key()?;
    require_passphrase(passphrase)?;

    let envelope = parse_envelope(data)?;
    let payload = open_payload(&envelope, passphrase)?;

    let mut summary = RestoreSummary::default();
    let id_map = restore_groups(repo, &payload.groups, &mut summary)?;

    for e in &payload.entries {
        if e.title.trim().is_empty() || e.password.is_empty() {
            summary.entries_skipped += 1;
            continue;
        }
        let group_id = id_map.get(&e.group_id).copied().unwrap_or(ROOT_GROUP_ID);
        let secrets = PasswordEntrySecrets::new(
            PasswordEntry {
                group_id,
                entry_type: EntryType::from_i64(e.entry_type),
                title: e.title.trim().to_string(),
                username: e.username.clone(),
                url: e.url.clone(),
                category: e.category.clone(),
                tags: e.tags.clone(),
                ..PasswordEntry::default()
            },
            e.password.clone(),
            e.notes.clone(),
        );
        repo.add_entry_with_timestamps(&secrets, e.created_at, e.updated_at)?;
        summary.entries_imported += 1;
    }

    for c in &payload.common_passwords {
        let secrets = CommonPasswordSecrets::new(c.name.clone(), c.password.clone(), c.notes.clone());
        match repo.add_common_password(&secrets) {
            Ok(_) => summary.common_passwords_imported += 1,
            Err(LockboxError::DuplicateName(_)) | Err(LockboxError::EmptyInput(_)) => {
                summary.common_passwords_skipped += 1
            }
            Err(e) => return Err(e),
        }
    }

    tracing::info!(
        groups_created = summary.groups_created,
        entries = summary.entries_imported,
        skipped = summary.entries_skipped,
        "backup restored"
    );
    Ok(summary)
}

/// Recreate the backup's groups and return old id -> new id.
///
/// Groups may appear in any order, so parents are resolved in passes
/// until nothing changes. Whatever is still unresolved (a missing or
/// cyclic parent) is attached to the root, one group at a time, and
/// the passes resume.
fn restore_groups(
    repo: &Repository<'_>,
    groups: &[BackupGroup],
    summary: &mut RestoreSummary,
) -> Result<HashMap<i64, i64>> {
    let mut id_map: HashMap<i64, i64> = HashMap::from([(ROOT_GROUP_ID, ROOT_GROUP_ID)]);
    let mut by_name: HashMap<(i64, String), i64> = repo
        .list_groups()?
        .into_iter()
        .filter_map(|g: Group| g.parent_id.map(|p| ((p, g.name.to_lowercase()), g.id)))
        .collect();

    let mut pending: Vec<&BackupGroup> = groups
        .iter()
        .filter(|g| g.id != ROOT_GROUP_ID && !g.name.trim().is_empty())
        .collect();

    while !pending.is_empty() {
        let mut progressed = false;
        let mut still_pending = Vec::with_capacity(pending.len());
        for g in pending {
            let old_parent = if g.parent_id > 0 {
                g.parent_id
            } else {
                ROOT_GROUP_ID
            };
            match id_map.get(&old_parent).copied() {
                Some(parent) => {
                    let id = place_group(repo, parent, &g.name, &mut by_name, summary)?;
                    id_map.insert(g.id, id);
                    progressed = true;
                }
                None => still_pending.push(g),
            }
        }
        pending = still_pending;

        if !progressed {
            if let Some((first, rest)) = pending.split_first() {
                tracing::warn!(group = first.id, "backup group has no resolvable parent, using root");
                let id = place_group(repo, ROOT_GROUP_ID, &first.name, &mut by_name, summary)?;
                id_map.insert(first.id, id);
                pending = rest.to_vec();
            }
        }
    }
    Ok(id_map)
}

fn place_group(
    repo: &Repository<'_>,
    parent: i64,
    name: &str,
    by_name: &mut HashMap<(i64, String), i64>,
    summary: &mut RestoreSummary,
) -> Result<i64> {
    let name = name.trim();
    let key = (parent, name.to_lowercase());
    if let Some(&id) = by_name.get(&key) {
        summary.groups_reused += 1;
        return Ok(id);
    }
    let id = repo.create_group(parent, name)?;
    by_name.insert(key, id);
    summary.groups_created += 1;
    Ok(id)
}
