//! CSV reading and writing.
//!
//! Three header shapes are recognized, checked from most to least
//! specific because their column sets overlap:
//!
//! | format   | required columns                                        |
//! |----------|---------------------------------------------------------|
//! | native   | title, username, password, url, category, tags, notes   |
//! | KeePassXC| Group, Title, Username, Password, URL, Notes            |
//! | Chrome   | name (or title), url, username, password                |
//!
//! Column names match case-insensitively. Anything else is rejected.

use std::collections::HashMap;
use std::fmt;

use crate::errors::{LockboxError, Result};
use crate::repository::{split_tags, EntryType, PasswordEntry, PasswordEntrySecrets};

/// Header of the native export, in column order.
pub const NATIVE_HEADER: [&str; 7] = [
    "title", "username", "password", "url", "category", "tags", "notes",
];

const KEEPASSXC_REQUIRED: [&str; 6] = ["group", "title", "username", "password", "url", "notes"];
const CHROME_REQUIRED: [&str; 3] = ["url", "username", "password"];

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Which exporter produced the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsvFormat {
    Native,
    KeePassXc,
    Chrome,
}

impl fmt::Display for CsvFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CsvFormat::Native => "native",
            CsvFormat::KeePassXc => "KeePassXC",
            CsvFormat::Chrome => "Chrome",
        })
    }
}

/// One data row, mapped onto an entry.
#[derive(Debug)]
pub struct CsvRecord {
    /// 1-based line in the source file.
    pub line: u64,
    /// Explicit type column value, if the file had one.
    pub entry_type: Option<EntryType>,
    /// `category` holds the group path for KeePassXC rows.
    pub secrets: PasswordEntrySecrets,
}

impl CsvRecord {
    /// Rows without a title or a password cannot be imported.
    pub fn is_valid(&self) -> bool {
        !self.secrets.entry.title.is_empty() && !self.secrets.password.is_empty()
    }
}

/// Result of parsing a whole file.
#[derive(Debug)]
pub struct ParsedCsv {
    pub format: CsvFormat,
    pub records: Vec<CsvRecord>,
    pub warnings: Vec<String>,
}

/// Column positions resolved from the header row.
struct Columns {
    format: CsvFormat,
    title: usize,
    username: usize,
    password: usize,
    url: usize,
    category: Option<usize>,
    group: Option<usize>,
    tags: Option<usize>,
    notes: Option<usize>,
    entry_type: Option<usize>,
}

impl Columns {
    fn detect(header: &csv::StringRecord, warnings: &mut Vec<String>) -> Result<Self> {
        let mut index: HashMap<String, usize> = HashMap::new();
        for (i, raw) in header.iter().enumerate() {
            let name = raw.trim().to_lowercase();
            if name.is_empty() {
                continue;
            }
            if index.contains_key(&name) {
                warnings.push(format!("duplicate column '{}', using the first one", raw.trim()));
                continue;
            }
            index.insert(name, i);
        }
        let has = |names: &[&str]| names.iter().all(|n| index.contains_key(*n));
        let col = |name: &str| index.get(name).copied();
        let type_col = col("type").or_else(|| col("entry_type"));

        let columns = if has(&NATIVE_HEADER) {
            Columns {
                format: CsvFormat::Native,
                title: index["title"],
                username: index["username"],
                password: index["password"],
                url: index["url"],
                category: col("category"),
                group: None,
                tags: col("tags"),
                notes: col("notes"),
                entry_type: type_col,
            }
        } else if has(&KEEPASSXC_REQUIRED) {
            Columns {
                format: CsvFormat::KeePassXc,
                title: index["title"],
                username: index["username"],
                password: index["password"],
                url: index["url"],
                category: None,
                group: col("group"),
                tags: None,
                notes: col("notes"),
                entry_type: None,
            }
        } else if let (true, Some(title)) = (
            has(&CHROME_REQUIRED),
            col("name").or_else(|| col("title")),
        ) {
            if col("name").is_some() && col("title").is_some() {
                warnings.push("both 'name' and 'title' columns present, using 'name'".into());
            }
            Columns {
                format: CsvFormat::Chrome,
                title,
                username: index["username"],
                password: index["password"],
                url: index["url"],
                category: None,
                group: None,
                tags: None,
                notes: col("note").or_else(|| col("notes")),
                entry_type: type_col,
            }
        } else {
            let seen: Vec<&str> = header.iter().map(str::trim).collect();
            return Err(LockboxError::UnrecognizedFormat(format!(
                "unknown CSV header: {}",
                seen.join(",")
            )));
        };

        let used = columns.used();
        for (name, i) in &index {
            if !used.contains(i) {
                warnings.push(format!("ignoring column '{name}'"));
            }
        }
        warnings.sort();
        Ok(columns)
    }

    fn used(&self) -> Vec<usize> {
        let mut v = vec![self.title, self.username, self.password, self.url];
        v.extend(
            [self.category, self.group, self.tags, self.notes, self.entry_type]
                .into_iter()
                .flatten(),
        );
        v
    }

    fn record(&self, row: &csv::StringRecord, line: u64, warnings: &mut Vec<String>) -> CsvRecord {
        let get = |i: usize| row.get(i).unwrap_or("");
        let opt = |i: Option<usize>| i.map(get).unwrap_or("");

        let category = match self.format {
            CsvFormat::KeePassXc => keepassxc_path(opt(self.group)),
            _ => opt(self.category).trim().to_string(),
        };

        let entry_type = match opt(self.entry_type).trim() {
            "" => None,
            raw => match raw.parse::<EntryType>() {
                Ok(t) => Some(t),
                Err(_) => {
                    warnings.push(format!("line {line}: unknown entry type '{raw}', using default"));
                    None
                }
            },
        };

        let entry = PasswordEntry {
            title: get(self.title).trim().to_string(),
            username: get(self.username).trim().to_string(),
            url: get(self.url).trim().to_string(),
            category,
            tags: split_tags(opt(self.tags)),
            ..PasswordEntry::default()
        };
        CsvRecord {
            line,
            entry_type,
            secrets: PasswordEntrySecrets::new(entry, get(self.password), opt(self.notes)),
        }
    }
}

/// Normalize a KeePassXC group path, dropping its implicit `Root` prefix.
fn keepassxc_path(raw: &str) -> String {
    let segments: Vec<&str> = path_segments(raw).collect();
    match segments.split_first() {
        Some((first, rest)) if first.eq_ignore_ascii_case("root") => rest.join("/"),
        _ => segments.join("/"),
    }
}

/// Non-empty, trimmed segments of a `/`-delimited group path.
pub fn path_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').map(str::trim).filter(|s| !s.is_empty())
}

fn is_blank(row: &csv::StringRecord) -> bool {
    row.iter().all(|f| f.trim().is_empty())
}

/// Parse an exported CSV file.
///
/// A leading UTF-8 byte-order mark is ignored, as are blank lines.
/// Fails with `UnrecognizedFormat` when the header matches no known
/// exporter or the file is not valid CSV.
pub fn parse_csv(data: &[u8]) -> Result<ParsedCsv> {
    let data = data.strip_prefix(UTF8_BOM).unwrap_or(data);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(data);

    let mut warnings = Vec::new();
    let mut columns: Option<Columns> = None;
    let mut records = Vec::new();

    for row in reader.records() {
        let row = row.map_err(|e| LockboxError::UnrecognizedFormat(format!("malformed CSV: {e}")))?;
        if is_blank(&row) {
            continue;
        }
        let line = row.position().map(|p| p.line()).unwrap_or_default();
        match &columns {
            None => columns = Some(Columns::detect(&row, &mut warnings)?),
            Some(cols) => records.push(cols.record(&row, line, &mut warnings)),
        }
    }

    let columns =
        columns.ok_or_else(|| LockboxError::UnrecognizedFormat("CSV file is empty".into()))?;
    tracing::debug!(format = %columns.format, rows = records.len(), "parsed CSV");
    Ok(ParsedCsv {
        format: columns.format,
        records,
        warnings,
    })
}

/// Write entries in the native format. Passwords and notes are written
/// in plaintext.
pub fn export_csv(entries: &[PasswordEntrySecrets]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    let ser = |e: csv::Error| LockboxError::Serialization(format!("CSV write failed: {e}"));

    writer.write_record(NATIVE_HEADER).map_err(ser)?;
    for s in entries {
        let e = &s.entry;
        let tags = e.tags.join(",");
        writer
            .write_record([
                e.title.as_str(),
                e.username.as_str(),
                s.password.as_str(),
                e.url.as_str(),
                e.category.as_str(),
                tags.as_str(),
                s.notes.as_str(),
            ])
            .map_err(ser)?;
    }
    writer
        .into_inner()
        .map_err(|e| LockboxError::Serialization(format!("CSV flush failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chrome_header_with_bom_and_crlf() {
        let csv = b"\xEF\xBB\xBFname,url,username,password\r\nExample,https://example.com,alice,SecretPwd!\r\n";
        let parsed = parse_csv(csv).unwrap();
        assert_eq!(parsed.format, CsvFormat::Chrome);
        assert_eq!(parsed.records.len(), 1);

        let r = &parsed.records[0].secrets;
        assert_eq!(r.entry.title, "Example");
        assert_eq!(r.entry.username, "alice");
        assert_eq!(r.password, "SecretPwd!");
        assert_eq!(r.entry.url, "https://example.com");
    }

    #[test]
    fn chrome_note_column_is_read() {
        let csv = b"name,url,username,password,note\nSite,https://s,bob,pw,remember me\n";
        let parsed = parse_csv(csv).unwrap();
        assert_eq!(parsed.records[0].secrets.notes, "remember me");
        assert!(parsed.warnings.is_empty());
    }

    #[test]
    fn keepassxc_header_keeps_group_path_as_category() {
        let csv = b"Group,Title,Username,Password,URL,Notes\r\nPersonal/Email,Gmail,me@gmail.com,SecretPwd!,https://mail.google.com,hello\r\n";
        let parsed = parse_csv(csv).unwrap();
        assert_eq!(parsed.format, CsvFormat::KeePassXc);

        let r = &parsed.records[0].secrets;
        assert_eq!(r.entry.category, "Personal/Email");
        assert_eq!(r.entry.title, "Gmail");
        assert_eq!(r.notes, "hello");
    }

    #[test]
    fn keepassxc_root_segment_is_dropped() {
        let csv = b"Group,Title,Username,Password,URL,Notes,TOTP\nRoot/Work/ Servers ,db,admin,pw,,,\n";
        let parsed = parse_csv(csv).unwrap();
        assert_eq!(parsed.records[0].secrets.entry.category, "Work/Servers");
        assert_eq!(parsed.warnings, vec!["ignoring column 'totp'"]);
    }

    #[test]
    fn native_header_wins_over_overlapping_shapes() {
        let csv = b"title,username,password,url,category,tags,notes\nGitHub,me,pw,https://github.com,Dev,\"dev, git\",\"note, with comma\"\n";
        let parsed = parse_csv(csv).unwrap();
        assert_eq!(parsed.format, CsvFormat::Native);

        let r = &parsed.records[0];
        assert_eq!(r.secrets.entry.category, "Dev");
        assert_eq!(r.secrets.entry.tags, vec!["dev", "git"]);
        assert_eq!(r.secrets.notes, "note, with comma");
        assert_eq!(r.entry_type, None);
    }

    #[test]
    fn type_column_overrides_default() {
        let csv = b"title,username,password,url,category,tags,notes,type\na,,pw,,,,,server-ssh\nb,,pw,,,,,bogus\n";
        let parsed = parse_csv(csv).unwrap();
        assert_eq!(parsed.records[0].entry_type, Some(EntryType::ServerSsh));
        assert_eq!(parsed.records[1].entry_type, None);
        assert_eq!(parsed.warnings.len(), 1);
    }

    #[test]
    fn unknown_header_is_rejected() {
        let err = parse_csv(b"foo,bar\n1,2\n").unwrap_err();
        assert!(matches!(err, LockboxError::UnrecognizedFormat(_)));
        assert!(matches!(
            parse_csv(b"").unwrap_err(),
            LockboxError::UnrecognizedFormat(_)
        ));
    }

    #[test]
    fn blank_lines_and_invalid_rows() {
        let csv = b"\n\nname,url,username,password\n,https://x,u,pw\nNoPw,https://y,u,\n\nok,https://z,u,pw\n";
        let parsed = parse_csv(csv).unwrap();
        let valid: Vec<bool> = parsed.records.iter().map(CsvRecord::is_valid).collect();
        assert_eq!(valid, vec![false, false, true]);
    }

    #[test]
    fn export_then_parse_round_trips() {
        let entry = PasswordEntry {
            title: "GitHub".into(),
            username: "user@example.com".into(),
            url: "https://github.com/login".into(),
            category: "开发".into(),
            tags: vec!["dev".into(), "git".into()],
            ..PasswordEntry::default()
        };
        let secrets = PasswordEntrySecrets::new(entry, "Aq9!xZ3@pL8#", "note, with comma");

        let bytes = export_csv(std::slice::from_ref(&secrets)).unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.starts_with("title,username,password,url,category,tags,notes"));

        let parsed = parse_csv(&bytes).unwrap();
        let back = &parsed.records[0].secrets;
        assert_eq!(back.entry.title, "GitHub");
        assert_eq!(back.entry.category, "开发");
        assert_eq!(back.entry.tags, vec!["dev", "git"]);
        assert_eq!(back.password, "Aq9!xZ3@pL8#");
        assert_eq!(back.notes, "note, with comma");
    }
}
