use thiserror::Error;

/// All errors that can occur in Lockbox.
#[derive(Debug, Error)]
pub enum LockboxError {
    // --- Vault lifecycle ---
    #[error("Vault is not initialized, run `lockbox init` first")]
    NotInitialized,

    #[error("Vault is already initialized")]
    AlreadyInitialized,

    #[error("Wrong master password")]
    WrongPassword,

    #[error("Vault is locked, unlock it first")]
    NotUnlocked,

    // --- Input validation ---
    #[error("{0} cannot be empty")]
    EmptyInput(&'static str),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("The root group cannot be renamed, moved or deleted")]
    RootGroupProtected,

    #[error("Group is not empty: {0}")]
    NotEmpty(String),

    #[error("Duplicate name: {0}")]
    DuplicateName(String),

    #[error("{0} not found")]
    NotFound(String),

    // --- Crypto errors ---
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: wrong key or corrupted data")]
    DecryptionFailed,

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    // --- Import / backup ---
    #[error("Unrecognized format: {0}")]
    UnrecognizedFormat(String),

    #[error("Wrong backup passphrase or corrupted backup file")]
    WrongPassphraseOrCorrupt,

    #[error("Import canceled")]
    Canceled,

    // --- Storage ---
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    // --- Config errors ---
    #[error("Config file error: {0}")]
    Config(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    Serialization(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),
}

impl From<rusqlite::Error> for LockboxError {
    fn from(e: rusqlite::Error) -> Self {
        LockboxError::StoreUnavailable(e.to_string())
    }
}

/// Convenience type alias for Lockbox results.
pub type Result<T> = std::result::Result<T, LockboxError>;
