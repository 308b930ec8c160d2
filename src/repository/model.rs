//! Record types held by the repository.
//!
//! Index records (`PasswordEntry`, `Group`, `CommonPassword`) never carry
//! secrets. Plaintext passwords and notes only live in the `*Secrets`
//! wrappers, which wipe themselves when dropped.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::errors::LockboxError;
use crate::store::ROOT_GROUP_ID;

// ---------------------------------------------------------------------------
// EntryType
// ---------------------------------------------------------------------------

/// Kind of credential. The discriminant is the persisted integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EntryType {
    #[default]
    WebLogin = 0,
    DesktopClient = 1,
    ApiKeyToken = 2,
    DatabaseCredential = 3,
    ServerSsh = 4,
    DeviceWifi = 5,
}

impl EntryType {
    pub const ALL: [EntryType; 6] = [
        EntryType::WebLogin,
        EntryType::DesktopClient,
        EntryType::ApiKeyToken,
        EntryType::DatabaseCredential,
        EntryType::ServerSsh,
        EntryType::DeviceWifi,
    ];

    /// Decode a persisted value. Unknown integers fall back to `WebLogin`.
    pub fn from_i64(value: i64) -> Self {
        match value {
            1 => EntryType::DesktopClient,
            2 => EntryType::ApiKeyToken,
            3 => EntryType::DatabaseCredential,
            4 => EntryType::ServerSsh,
            5 => EntryType::DeviceWifi,
            _ => EntryType::WebLogin,
        }
    }

    pub fn as_i64(self) -> i64 {
        self as i64
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            EntryType::WebLogin => "Web login",
            EntryType::DesktopClient => "Desktop / client",
            EntryType::ApiKeyToken => "API key / token",
            EntryType::DatabaseCredential => "Database credential",
            EntryType::ServerSsh => "Server / SSH",
            EntryType::DeviceWifi => "Device / Wi-Fi",
        }
    }

    /// Stable kebab-case name used on the command line and in config.
    pub fn slug(self) -> &'static str {
        match self {
            EntryType::WebLogin => "web-login",
            EntryType::DesktopClient => "desktop-client",
            EntryType::ApiKeyToken => "api-key",
            EntryType::DatabaseCredential => "database",
            EntryType::ServerSsh => "server-ssh",
            EntryType::DeviceWifi => "device-wifi",
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for EntryType {
    type Err = LockboxError;

    /// Accepts a slug (`api-key`), a label (`API key / token`) or the
    /// persisted integer (`2`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(n) = s.parse::<i64>() {
            if (0..=5).contains(&n) {
                return Ok(EntryType::from_i64(n));
            }
        }
        EntryType::ALL
            .into_iter()
            .find(|t| t.slug().eq_ignore_ascii_case(s) || t.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| LockboxError::InvalidArgument(format!("unknown entry type '{s}'")))
    }
}

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

/// Index metadata of one credential. Never holds the password or notes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordEntry {
    pub id: i64,
    pub group_id: i64,
    pub entry_type: EntryType,
    pub title: String,
    pub username: String,
    pub url: String,
    pub category: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for PasswordEntry {
    fn default() -> Self {
        Self {
            id: 0,
            group_id: ROOT_GROUP_ID,
            entry_type: EntryType::WebLogin,
            title: String::new(),
            username: String::new(),
            url: String::new(),
            category: String::new(),
            tags: Vec::new(),
            created_at: DateTime::<Utc>::default(),
            updated_at: DateTime::<Utc>::default(),
        }
    }
}

/// An entry together with its plaintext password and notes.
#[derive(Clone, Default, Zeroize, ZeroizeOnDrop)]
pub struct PasswordEntrySecrets {
    #[zeroize(skip)]
    pub entry: PasswordEntry,
    pub password: String,
    pub notes: String,
}

impl PasswordEntrySecrets {
    pub fn new(entry: PasswordEntry, password: impl Into<String>, notes: impl Into<String>) -> Self {
        Self {
            entry,
            password: password.into(),
            notes: notes.into(),
        }
    }
}

impl fmt::Debug for PasswordEntrySecrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordEntrySecrets")
            .field("entry", &self.entry)
            .field("password", &"<redacted>")
            .field("notes", &"<redacted>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Groups
// ---------------------------------------------------------------------------

/// A node of the group tree. `parent_id` is `None` only for the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub id: i64,
    pub parent_id: Option<i64>,
    pub name: String,
}

impl Group {
    pub fn is_root(&self) -> bool {
        self.id == ROOT_GROUP_ID
    }
}

// ---------------------------------------------------------------------------
// Common passwords
// ---------------------------------------------------------------------------

/// An account-less secret, identified by a unique name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommonPassword {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Default, Zeroize, ZeroizeOnDrop)]
pub struct CommonPasswordSecrets {
    #[zeroize(skip)]
    pub item: CommonPassword,
    pub password: String,
    pub notes: String,
}

impl CommonPasswordSecrets {
    pub fn new(name: impl Into<String>, password: impl Into<String>, notes: impl Into<String>) -> Self {
        Self {
            item: CommonPassword {
                name: name.into(),
                ..CommonPassword::default()
            },
            password: password.into(),
            notes: notes.into(),
        }
    }
}

impl fmt::Debug for CommonPasswordSecrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommonPasswordSecrets")
            .field("item", &self.item)
            .field("password", &"<redacted>")
            .field("notes", &"<redacted>")
            .finish()
    }
}

/// Unix seconds to `DateTime<Utc>`; out-of-range values map to the epoch.
pub(crate) fn from_unix(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}
