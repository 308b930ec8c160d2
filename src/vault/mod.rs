//! Vault module: master-key lifecycle.
//!
//! This module provides:
//! - The persisted KDF metadata row (`meta`)
//! - The `Vault` state machine: create, unlock, lock, rotate (`lifecycle`)

pub mod lifecycle;
pub mod meta;

pub use lifecycle::{Vault, VaultState};
pub use meta::VaultMetadata;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::kdf::{KdfParams, MIN_ITERATIONS};
    use crate::errors::LockboxError;
    use crate::store::Store;

    fn params() -> KdfParams {
        KdfParams {
            iterations: MIN_ITERATIONS,
        }
    }

    #[test]
    fn fresh_store_is_uninitialized() {
        let store = Store::open_in_memory().unwrap();
        let vault = Vault::load(&store, params()).unwrap();
        assert_eq!(vault.state(), VaultState::Uninitialized);
        assert!(matches!(vault.key(), Err(LockboxError::NotUnlocked)));
    }

    #[test]
    fn create_unlocks_and_persists_metadata() {
        let store = Store::open_in_memory().unwrap();
        let mut vault = Vault::load(&store, params()).unwrap();
        vault.create_vault(&store, "master").unwrap();
        assert_eq!(vault.state(), VaultState::Unlocked);

        let stored = meta::read(store.conn()).unwrap().unwrap();
        assert_eq!(stored.iterations, MIN_ITERATIONS);
        assert_eq!(stored.salt.len(), crate::crypto::kdf::SALT_LEN);
        assert_eq!(stored.verifier, vault.key().unwrap().verifier());
    }

    #[test]
    fn create_twice_fails() {
        let store = Store::open_in_memory().unwrap();
        let mut vault = Vault::load(&store, params()).unwrap();
        vault.create_vault(&store, "master").unwrap();

        let mut other = Vault::load(&store, params()).unwrap();
        assert!(matches!(
            other.create_vault(&store, "again"),
            Err(LockboxError::AlreadyInitialized)
        ));
    }

    #[test]
    fn create_rejects_blank_password() {
        let store = Store::open_in_memory().unwrap();
        let mut vault = Vault::load(&store, params()).unwrap();
        assert!(matches!(
            vault.create_vault(&store, "   "),
            Err(LockboxError::EmptyInput(_))
        ));
        assert_eq!(vault.state(), VaultState::Uninitialized);
    }

    #[test]
    fn unlock_before_init_fails() {
        let store = Store::open_in_memory().unwrap();
        let mut vault = Vault::load(&store, params()).unwrap();
        assert!(matches!(
            vault.unlock(&store, "master"),
            Err(LockboxError::NotInitialized)
        ));
    }

    #[test]
    fn unlock_with_right_and_wrong_password() {
        let store = Store::open_in_memory().unwrap();
        Vault::load(&store, params())
            .unwrap()
            .create_vault(&store, "master")
            .unwrap();

        let mut vault = Vault::load(&store, params()).unwrap();
        assert_eq!(vault.state(), VaultState::Locked);

        assert!(matches!(
            vault.unlock(&store, "not-master"),
            Err(LockboxError::WrongPassword)
        ));
        assert_eq!(vault.state(), VaultState::Locked);

        vault.unlock(&store, "master").unwrap();
        assert_eq!(vault.state(), VaultState::Unlocked);
    }

    #[test]
    fn unlock_uses_stored_iterations() {
        let store = Store::open_in_memory().unwrap();
        Vault::load(&store, params())
            .unwrap()
            .create_vault(&store, "master")
            .unwrap();

        // A handle configured with a different policy still opens the vault.
        let mut vault = Vault::load(
            &store,
            KdfParams {
                iterations: MIN_ITERATIONS * 2,
            },
        )
        .unwrap();
        vault.unlock(&store, "master").unwrap();
    }

    #[test]
    fn lock_is_idempotent() {
        let store = Store::open_in_memory().unwrap();
        let mut vault = Vault::load(&store, params()).unwrap();
        vault.create_vault(&store, "master").unwrap();

        vault.lock();
        vault.lock();
        assert_eq!(vault.state(), VaultState::Locked);
        assert!(vault.key().is_err());
    }

    #[test]
    fn rotation_requires_unlocked_vault() {
        let store = Store::open_in_memory().unwrap();
        let mut vault = Vault::load(&store, params()).unwrap();
        vault.create_vault(&store, "master").unwrap();
        vault.lock();

        assert!(matches!(
            vault.change_master_password(&store, "new"),
            Err(LockboxError::NotUnlocked)
        ));
    }

    #[test]
    fn rotation_rejects_blank_password() {
        let store = Store::open_in_memory().unwrap();
        let mut vault = Vault::load(&store, params()).unwrap();
        vault.create_vault(&store, "master").unwrap();

        assert!(matches!(
            vault.change_master_password(&store, ""),
            Err(LockboxError::EmptyInput(_))
        ));
    }

    #[test]
    fn rotation_switches_passwords() {
        let store = Store::open_in_memory().unwrap();
        let mut vault = Vault::load(&store, params()).unwrap();
        vault.create_vault(&store, "master").unwrap();
        let before = vault.metadata().cloned().unwrap();

        vault.change_master_password(&store, "rotated").unwrap();
        assert_ne!(vault.metadata().unwrap().salt, before.salt);

        let mut fresh = Vault::load(&store, params()).unwrap();
        assert!(matches!(
            fresh.unlock(&store, "master"),
            Err(LockboxError::WrongPassword)
        ));
        fresh.unlock(&store, "rotated").unwrap();
    }
}
