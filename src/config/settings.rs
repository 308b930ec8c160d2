use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::crypto::kdf::{KdfParams, DEFAULT_ITERATIONS};
use crate::errors::{LockboxError, Result};
use crate::import::{DuplicatePolicy, ImportOptions};
use crate::repository::EntryType;

/// Vault-level configuration, loaded from `lockbox.toml` in the vault
/// directory.
///
/// Every field has a sensible default so Lockbox works out-of-the-box
/// without any config file at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Database file name, relative to the vault directory.
    #[serde(default = "default_database_file")]
    pub database_file: String,

    /// PBKDF2 rounds for new vaults and master-password rotation.
    #[serde(default = "default_iterations")]
    pub kdf_iterations: u32,

    /// PBKDF2 rounds for backup passphrases.
    #[serde(default = "default_iterations")]
    pub backup_kdf_iterations: u32,

    /// Defaults for `lockbox import`.
    #[serde(default)]
    pub import: ImportSettings,
}

/// The `[import]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportSettings {
    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,

    #[serde(default)]
    pub create_groups_from_category_path: bool,

    /// Entry type name, e.g. `web-login` or `api-key`.
    #[serde(default = "default_entry_type")]
    pub default_entry_type: String,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_database_file() -> String {
    "vault.sqlite3".to_string()
}

fn default_iterations() -> u32 {
    DEFAULT_ITERATIONS
}

fn default_entry_type() -> String {
    EntryType::WebLogin.slug().to_string()
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_file: default_database_file(),
            kdf_iterations: default_iterations(),
            backup_kdf_iterations: default_iterations(),
            import: ImportSettings::default(),
        }
    }
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            duplicate_policy: DuplicatePolicy::Skip,
            create_groups_from_category_path: false,
            default_entry_type: default_entry_type(),
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the vault directory.
    pub const FILE_NAME: &'static str = "lockbox.toml";

    /// Load settings from `<vault_dir>/lockbox.toml`.
    ///
    /// If the file does not exist, sensible defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(vault_dir: &Path) -> Result<Self> {
        let config_path = vault_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            LockboxError::Config(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        tracing::debug!(path = %config_path.display(), "loaded settings");
        Ok(settings)
    }

    /// Full path to the database file.
    ///
    /// Example: `~/.local/share/lockbox/vault.sqlite3`
    pub fn database_path(&self, vault_dir: &Path) -> PathBuf {
        vault_dir.join(&self.database_file)
    }

    /// KDF parameters for new vaults and rotation.
    pub fn kdf_params(&self) -> KdfParams {
        KdfParams {
            iterations: self.kdf_iterations,
        }
    }

    /// Import options from the `[import]` table.
    pub fn import_options(&self) -> Result<ImportOptions> {
        let default_entry_type = self
            .import
            .default_entry_type
            .parse::<EntryType>()
            .map_err(|e| LockboxError::Config(format!("import.default_entry_type: {e}")))?;
        Ok(ImportOptions {
            duplicate_policy: self.import.duplicate_policy,
            create_groups_from_category_path: self.import.create_groups_from_category_path,
            default_entry_type,
        })
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn default_settings_are_sensible() {
        let s = Settings::default();
        assert_eq!(s.database_file, "vault.sqlite3");
        assert_eq!(s.kdf_iterations, 120_000);
        assert_eq!(s.backup_kdf_iterations, 120_000);
        assert_eq!(s.import.duplicate_policy, DuplicatePolicy::Skip);
        assert!(!s.import.create_groups_from_category_path);
        assert_eq!(s.import.default_entry_type, "web-login");
    }

    #[test]
    fn load_returns_defaults_when_no_config_file() {
        let tmp = TempDir::new().unwrap();
        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(settings.database_file, "vault.sqlite3");
    }

    #[test]
    fn load_parses_toml_file() {
        let tmp = TempDir::new().unwrap();
        let config = r#"
database_file = "passwords.db"
kdf_iterations = 200000
backup_kdf_iterations = 300000

[import]
duplicate_policy = "update"
create_groups_from_category_path = true
default_entry_type = "api-key"
"#;
        fs::write(tmp.path().join("lockbox.toml"), config).unwrap();

        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(settings.database_file, "passwords.db");
        assert_eq!(settings.kdf_params().iterations, 200_000);
        assert_eq!(settings.backup_kdf_iterations, 300_000);

        let opts = settings.import_options().unwrap();
        assert_eq!(opts.duplicate_policy, DuplicatePolicy::Update);
        assert!(opts.create_groups_from_category_path);
        assert_eq!(opts.default_entry_type, EntryType::ApiKeyToken);
    }

    #[test]
    fn load_uses_defaults_for_missing_fields() {
        let tmp = TempDir::new().unwrap();
        let config = "[import]\ncreate_groups_from_category_path = true\n";
        fs::write(tmp.path().join("lockbox.toml"), config).unwrap();

        let settings = Settings::load(tmp.path()).unwrap();
        assert!(settings.import.create_groups_from_category_path);
        // Rest should be defaults
        assert_eq!(settings.import.duplicate_policy, DuplicatePolicy::Skip);
        assert_eq!(settings.kdf_iterations, 120_000);
    }

    #[test]
    fn load_errors_on_invalid_toml() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("lockbox.toml"), "not valid {{toml").unwrap();

        let result = Settings::load(tmp.path());
        assert!(matches!(result, Err(LockboxError::Config(_))));
    }

    #[test]
    fn unknown_duplicate_policy_is_a_config_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("lockbox.toml"),
            "[import]\nduplicate_policy = \"merge\"\n",
        )
        .unwrap();
        assert!(Settings::load(tmp.path()).is_err());
    }

    #[test]
    fn bad_default_entry_type_is_reported() {
        let s = Settings {
            import: ImportSettings {
                default_entry_type: "spaceship".into(),
                ..ImportSettings::default()
            },
            ..Settings::default()
        };
        assert!(matches!(s.import_options(), Err(LockboxError::Config(_))));
    }

    #[test]
    fn database_path_respects_custom_file() {
        let s = Settings {
            database_file: "other.db".to_string(),
            ..Settings::default()
        };
        let dir = Path::new("/home/user/.local/share/lockbox");
        assert_eq!(
            s.database_path(dir),
            PathBuf::from("/home/user/.local/share/lockbox/other.db")
        );
    }
}
