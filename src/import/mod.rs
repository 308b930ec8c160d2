//! CSV import engine.
//!
//! Rows are applied one at a time, each in its own repository call, so a
//! hard failure halfway through keeps the rows already written. Invalid
//! rows (no title or no password) are counted and skipped.

pub mod format;
pub mod worker;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

use crate::errors::{LockboxError, Result};
use crate::repository::{EntryType, Repository};
use crate::store::ROOT_GROUP_ID;

pub use format::{export_csv, parse_csv, path_segments, CsvFormat, CsvRecord, ParsedCsv};
pub use worker::{spawn_import, ImportEvent, ImportHandle};

/// What to do when a row matches an existing (title, username).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    #[default]
    Skip,
    Update,
}

impl FromStr for DuplicatePolicy {
    type Err = LockboxError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(DuplicatePolicy::Skip),
            "update" => Ok(DuplicatePolicy::Update),
            other => Err(LockboxError::InvalidArgument(format!(
                "unknown duplicate policy '{other}' (expected skip or update)"
            ))),
        }
    }
}

impl fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DuplicatePolicy::Skip => "skip",
            DuplicatePolicy::Update => "update",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportOptions {
    pub duplicate_policy: DuplicatePolicy,
    /// Turn category paths (`Personal/Email`) into nested groups.
    pub create_groups_from_category_path: bool,
    /// Type for rows whose file has no type column.
    pub default_entry_type: EntryType,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            duplicate_policy: DuplicatePolicy::Skip,
            create_groups_from_category_path: false,
            default_entry_type: EntryType::WebLogin,
        }
    }
}

/// Counts reported at the end of an import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub inserted: usize,
    pub updated: usize,
    pub skipped_duplicates: usize,
    pub skipped_invalid: usize,
    pub warnings: Vec<String>,
}

impl ImportSummary {
    pub fn processed(&self) -> usize {
        self.inserted + self.updated + self.skipped_duplicates + self.skipped_invalid
    }
}

/// Applies parsed CSV rows to a repository.
pub struct CsvImporter<'r, 'a> {
    repo: &'r Repository<'a>,
    options: ImportOptions,
    base_group_id: i64,
    /// Group path -> group id, per run.
    path_cache: HashMap<String, i64>,
}

impl<'r, 'a> CsvImporter<'r, 'a> {
    /// `base_group_id` receives rows without a group path and anchors
    /// created group paths. Non-positive ids mean the root group.
    pub fn new(repo: &'r Repository<'a>, base_group_id: i64, options: ImportOptions) -> Self {
        Self {
            repo,
            options,
            base_group_id: if base_group_id > 0 {
                base_group_id
            } else {
                ROOT_GROUP_ID
            },
            path_cache: HashMap::new(),
        }
    }

    /// Parse `data` and import every row.
    ///
    /// `cancel` is polled between rows; once set the run stops with
    /// `Canceled`. `progress` receives `(rows_done, total_rows)`, first
    /// with `rows_done = 0`.
    pub fn run<F>(&mut self, data: &[u8], cancel: &AtomicBool, mut progress: F) -> Result<ImportSummary>
    where
        F: FnMut(usize, usize),
    {
        self.repo.vault().key()?;
        let parsed = parse_csv(data)?;
        let total = parsed.records.len();

        let mut summary = ImportSummary {
            warnings: parsed.warnings,
            ..ImportSummary::default()
        };
        let mut existing: HashMap<(String, String), i64> = self
            .repo
            .list_entries()?
            .into_iter()
            .map(|e| ((e.title, e.username), e.id))
            .collect();

        progress(0, total);
        for (done, record) in parsed.records.into_iter().enumerate() {
            if cancel.load(Ordering::Relaxed) {
                tracing::info!(done, total, "import canceled");
                return Err(LockboxError::Canceled);
            }
            self.apply(parsed.format, record, &mut existing, &mut summary)?;
            progress(done + 1, total);
        }

        tracing::info!(
            format = %parsed.format,
            inserted = summary.inserted,
            updated = summary.updated,
            skipped_duplicates = summary.skipped_duplicates,
            skipped_invalid = summary.skipped_invalid,
            "import finished"
        );
        Ok(summary)
    }

    fn apply(
        &mut self,
        format: CsvFormat,
        record: CsvRecord,
        existing: &mut HashMap<(String, String), i64>,
        summary: &mut ImportSummary,
    ) -> Result<()> {
        if !record.is_valid() {
            tracing::debug!(line = record.line, "skipping row without title or password");
            summary.skipped_invalid += 1;
            return Ok(());
        }

        let CsvRecord {
            line,
            entry_type,
            mut secrets,
        } = record;
        let key = (
            secrets.entry.title.clone(),
            secrets.entry.username.clone(),
        );

        if let Some(&id) = existing.get(&key) {
            match self.options.duplicate_policy {
                DuplicatePolicy::Skip => {
                    tracing::debug!(line, id, "duplicate row skipped");
                    summary.skipped_duplicates += 1;
                }
                DuplicatePolicy::Update => {
                    if self.category_is_group_path(format) {
                        secrets.entry.category.clear();
                    }
                    let mut current = self.repo.load_entry(id)?;
                    current.password = std::mem::take(&mut secrets.password);
                    current.notes = std::mem::take(&mut secrets.notes);
                    current.entry.url = std::mem::take(&mut secrets.entry.url);
                    current.entry.category = std::mem::take(&mut secrets.entry.category);
                    current.entry.tags = std::mem::take(&mut secrets.entry.tags);
                    self.repo.update_entry(&current)?;
                    tracing::debug!(line, id, "duplicate row updated");
                    summary.updated += 1;
                }
            }
            return Ok(());
        }

        secrets.entry.entry_type = entry_type.unwrap_or(self.options.default_entry_type);
        secrets.entry.group_id = self.base_group_id;
        if self.options.create_groups_from_category_path && !secrets.entry.category.is_empty() {
            secrets.entry.group_id = self.resolve_path(&secrets.entry.category)?;
            if self.category_is_group_path(format) {
                secrets.entry.category.clear();
            }
        }

        let id = self.repo.add_entry(&secrets)?;
        existing.insert(key, id);
        summary.inserted += 1;
        Ok(())
    }

    /// KeePassXC's group column lands in `category`; once it is turned
    /// into groups it is not kept as a category too.
    fn category_is_group_path(&self, format: CsvFormat) -> bool {
        self.options.create_groups_from_category_path && format == CsvFormat::KeePassXc
    }

    /// Find or create each segment of `path` below the base group and
    /// return the leaf's id.
    fn resolve_path(&mut self, path: &str) -> Result<i64> {
        let normalized: Vec<&str> = path_segments(path).collect();
        if normalized.is_empty() {
            return Ok(self.base_group_id);
        }
        let full = normalized.join("/");
        if let Some(&id) = self.path_cache.get(&full) {
            return Ok(id);
        }

        let mut parent = self.base_group_id;
        let mut prefix = String::new();
        for segment in normalized {
            if !prefix.is_empty() {
                prefix.push('/');
            }
            prefix.push_str(segment);

            parent = match self.path_cache.get(&prefix) {
                Some(&id) => id,
                None => {
                    let id = match self.repo.find_group(parent, segment)? {
                        Some(id) => id,
                        None => self.repo.create_group(parent, segment)?,
                    };
                    self.path_cache.insert(prefix.clone(), id);
                    id
                }
            };
        }
        Ok(parent)
    }
}

/// Import `data` into `repo` in one call, without cancellation.
pub fn import_csv(
    repo: &Repository<'_>,
    data: &[u8],
    base_group_id: i64,
    options: ImportOptions,
) -> Result<ImportSummary> {
    let never = AtomicBool::new(false);
    CsvImporter::new(repo, base_group_id, options).run(data, &never, |_, _| {})
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::unlocked;
    use crate::repository::{PasswordEntry, PasswordEntrySecrets};

    #[test]
    fn chrome_scenario_imports_one_entry() {
        let (store, vault) = unlocked();
        let repo = Repository::new(&store, &vault);

        let csv = b"name,url,username,password\nExample,https://example.com,alice,Secret!";
        let summary = import_csv(&repo, csv, ROOT_GROUP_ID, ImportOptions::default()).unwrap();
        assert_eq!(summary.inserted, 1);

        let list = repo.list_entries().unwrap();
        assert_eq!(list.len(), 1);
        let e = repo.load_entry(list[0].id).unwrap();
        assert_eq!(e.entry.title, "Example");
        assert_eq!(e.entry.username, "alice");
        assert_eq!(e.password, "Secret!");
        assert_eq!(e.entry.url, "https://example.com");
    }

    #[test]
    fn keepassxc_path_without_group_creation_becomes_category() {
        let (store, vault) = unlocked();
        let repo = Repository::new(&store, &vault);

        let csv = b"Group,Title,Username,Password,URL,Notes\r\nPersonal/Email,Gmail,me@gmail.com,SecretPwd!,https://mail.google.com,hello\r\n";
        import_csv(&repo, csv, ROOT_GROUP_ID, ImportOptions::default()).unwrap();

        let list = repo.list_entries().unwrap();
        assert_eq!(list[0].category, "Personal/Email");
        assert_eq!(list[0].group_id, ROOT_GROUP_ID);
        assert_eq!(repo.list_groups().unwrap().len(), 1);
        assert_eq!(repo.load_entry(list[0].id).unwrap().notes, "hello");
    }

    #[test]
    fn keepassxc_path_creates_nested_groups() {
        let (store, vault) = unlocked();
        let repo = Repository::new(&store, &vault);

        let csv = b"Group,Title,Username,Password,URL,Notes\r\n\
Personal/Email,Gmail,me@gmail.com,Secret!,https://mail.google.com,hi\r\n\
Personal/Email,Outlook,me@outlook.com,Secret!,https://outlook.com,\r\n";
        let options = ImportOptions {
            create_groups_from_category_path: true,
            ..ImportOptions::default()
        };
        let summary = import_csv(&repo, csv, ROOT_GROUP_ID, options).unwrap();
        assert_eq!(summary.inserted, 2);

        let personal = repo.find_group(ROOT_GROUP_ID, "Personal").unwrap().unwrap();
        let email = repo.find_group(personal, "Email").unwrap().unwrap();
        assert_eq!(repo.list_groups().unwrap().len(), 3);

        for e in repo.list_entries().unwrap() {
            assert_eq!(e.group_id, email);
            assert!(e.category.is_empty());
        }
    }

    #[test]
    fn group_paths_reuse_existing_groups() {
        let (store, vault) = unlocked();
        let repo = Repository::new(&store, &vault);
        let work = repo.create_group(ROOT_GROUP_ID, "Work").unwrap();

        let csv = b"title,username,password,url,category,tags,notes\nVPN,me,pw,,Work,,\n";
        let options = ImportOptions {
            create_groups_from_category_path: true,
            ..ImportOptions::default()
        };
        import_csv(&repo, csv, ROOT_GROUP_ID, options).unwrap();

        let list = repo.list_entries().unwrap();
        assert_eq!(list[0].group_id, work);
        assert_eq!(list[0].category, "Work");
        assert_eq!(repo.list_groups().unwrap().len(), 2);
    }

    #[test]
    fn update_policy_overwrites_duplicate() {
        let (store, vault) = unlocked();
        let repo = Repository::new(&store, &vault);

        let original = PasswordEntrySecrets::new(
            PasswordEntry {
                title: "Example".into(),
                username: "alice".into(),
                url: "https://example.com/login".into(),
                tags: vec!["oldtag".into()],
                ..PasswordEntry::default()
            },
            "OldPwd!",
            "",
        );
        let id = repo.add_entry_with_timestamps(&original, 1_500_000_000, 0).unwrap();

        let csv = b"title,username,password,url,category,tags,notes\r\nExample,alice,NewPwd!,https://example.com/login,Personal,newtag,hello\r\n";
        let options = ImportOptions {
            duplicate_policy: DuplicatePolicy::Update,
            ..ImportOptions::default()
        };
        let summary = import_csv(&repo, csv, ROOT_GROUP_ID, options).unwrap();
        assert_eq!((summary.inserted, summary.updated), (0, 1));

        let list = repo.list_entries().unwrap();
        assert_eq!(list.len(), 1);
        let loaded = repo.load_entry(id).unwrap();
        assert_eq!(loaded.password, "NewPwd!");
        assert_eq!(loaded.notes, "hello");
        assert_eq!(loaded.entry.category, "Personal");
        assert_eq!(loaded.entry.tags, vec!["newtag"]);
        assert_eq!(loaded.entry.created_at.timestamp(), 1_500_000_000);
    }

    #[test]
    fn keepassxc_update_does_not_copy_group_path_into_category() {
        let (store, vault) = unlocked();
        let repo = Repository::new(&store, &vault);

        let options = ImportOptions {
            duplicate_policy: DuplicatePolicy::Update,
            create_groups_from_category_path: true,
            ..ImportOptions::default()
        };
        let first = b"Group,Title,Username,Password,URL,Notes
Personal/Email,Gmail,me,Old!,,
";
        import_csv(&repo, first, ROOT_GROUP_ID, options).unwrap();
        let again = b"Group,Title,Username,Password,URL,Notes
Personal/Email,Gmail,me,New!,,
";
        let summary = import_csv(&repo, again, ROOT_GROUP_ID, options).unwrap();
        assert_eq!((summary.inserted, summary.updated), (0, 1));

        let list = repo.list_entries().unwrap();
        assert_eq!(list.len(), 1);
        let loaded = repo.load_entry(list[0].id).unwrap();
        assert_eq!(loaded.password, "New!");
        assert!(loaded.entry.category.is_empty());
    }

    #[test]
    fn skip_policy_counts_duplicates_within_one_file() {
        let (store, vault) = unlocked();
        let repo = Repository::new(&store, &vault);

        let csv = b"name,url,username,password\nA,,u,1\nA,,u,2\nA,,v,3\n,,u,4\n";
        let summary = import_csv(&repo, csv, ROOT_GROUP_ID, ImportOptions::default()).unwrap();
        assert_eq!(summary.inserted, 2);
        assert_eq!(summary.skipped_duplicates, 1);
        assert_eq!(summary.skipped_invalid, 1);
        assert_eq!(summary.processed(), 4);
    }

    #[test]
    fn default_entry_type_applies_without_type_column() {
        let (store, vault) = unlocked();
        let repo = Repository::new(&store, &vault);

        let csv = b"title,username,password,url,category,tags,notes\r\nGitHub Token,,ghp_xxx,,dev,token,\r\n";
        let options = ImportOptions {
            default_entry_type: EntryType::ApiKeyToken,
            ..ImportOptions::default()
        };
        import_csv(&repo, csv, ROOT_GROUP_ID, options).unwrap();
        assert_eq!(
            repo.list_entries().unwrap()[0].entry_type,
            EntryType::ApiKeyToken
        );
    }

    #[test]
    fn export_then_reimport_is_all_duplicates() {
        let (store, vault) = unlocked();
        let repo = Repository::new(&store, &vault);
        for (t, u) in [("SiteA", "a"), ("SiteB", "b")] {
            let s = PasswordEntrySecrets::new(
                PasswordEntry {
                    title: t.into(),
                    username: u.into(),
                    tags: vec!["x".into(), "y".into()],
                    ..PasswordEntry::default()
                },
                "SamePassword!123",
                "",
            );
            repo.add_entry(&s).unwrap();
        }
        let full: Vec<_> = repo
            .list_entries()
            .unwrap()
            .iter()
            .map(|e| repo.load_entry(e.id).unwrap())
            .collect();
        let bytes = export_csv(&full).unwrap();

        let summary = import_csv(&repo, &bytes, ROOT_GROUP_ID, ImportOptions::default()).unwrap();
        assert_eq!(summary.inserted, 0);
        assert_eq!(summary.skipped_duplicates, 2);
        assert_eq!(repo.list_entries().unwrap().len(), 2);
    }

    #[test]
    fn cancel_stops_between_rows_and_keeps_earlier_rows() {
        let (store, vault) = unlocked();
        let repo = Repository::new(&store, &vault);

        let csv = b"name,url,username,password\nA,,u,1\nB,,u,2\nC,,u,3\n";
        let cancel = AtomicBool::new(false);
        let mut seen = Vec::new();
        let err = CsvImporter::new(&repo, ROOT_GROUP_ID, ImportOptions::default())
            .run(csv, &cancel, |done, total| {
                seen.push((done, total));
                if done == 1 {
                    cancel.store(true, Ordering::Relaxed);
                }
            })
            .unwrap_err();

        assert!(matches!(err, LockboxError::Canceled));
        assert_eq!(seen, vec![(0, 3), (1, 3)]);
        assert_eq!(repo.list_entries().unwrap().len(), 1);
    }

    #[test]
    fn unrecognized_header_fails_before_any_write() {
        let (store, vault) = unlocked();
        let repo = Repository::new(&store, &vault);
        let err = import_csv(&repo, b"a,b,c\n1,2,3\n", ROOT_GROUP_ID, ImportOptions::default())
            .unwrap_err();
        assert!(matches!(err, LockboxError::UnrecognizedFormat(_)));
        assert!(repo.list_entries().unwrap().is_empty());
    }

    #[test]
    fn duplicate_policy_parses() {
        assert_eq!("Update".parse::<DuplicatePolicy>().unwrap(), DuplicatePolicy::Update);
        assert!("merge".parse::<DuplicatePolicy>().is_err());
    }
}
