//! Integration tests for groups, entries, tags and common passwords.

use lockbox::crypto::kdf::{KdfParams, MIN_ITERATIONS};
use lockbox::errors::LockboxError;
use lockbox::repository::{
    CommonPasswordSecrets, EntryType, PasswordEntry, PasswordEntrySecrets, Repository,
};
use lockbox::store::{Store, ROOT_GROUP_ID};
use lockbox::vault::Vault;

fn open() -> (Store, Vault) {
    let store = Store::open_in_memory().unwrap();
    let mut vault = Vault::load(
        &store,
        KdfParams {
            iterations: MIN_ITERATIONS,
        },
    )
    .unwrap();
    vault.create_vault(&store, "master").unwrap();
    (store, vault)
}

fn entry(title: &str, group_id: i64, tags: &[&str]) -> PasswordEntrySecrets {
    PasswordEntrySecrets::new(
        PasswordEntry {
            group_id,
            title: title.into(),
            username: "me".into(),
            category: "Misc".into(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            ..PasswordEntry::default()
        },
        "pw",
        "",
    )
}

#[test]
fn group_tree_scenario() {
    let (store, vault) = open();
    let repo = Repository::new(&store, &vault);

    let work = repo.create_group(ROOT_GROUP_ID, "Work").unwrap();
    let servers = repo.create_group(work, "Servers").unwrap();
    let home = repo.create_group(0, "Home").unwrap();

    let tree = repo.group_tree().unwrap();
    assert_eq!(tree.path_of(servers), "Work/Servers");
    assert_eq!(tree.descendant_ids(work), vec![work, servers]);
    assert_eq!(tree.children(ROOT_GROUP_ID), &[home, work]);

    // Same name under the same parent is a duplicate; elsewhere it is fine.
    assert!(matches!(
        repo.create_group(work, "Servers"),
        Err(LockboxError::DuplicateName(_))
    ));
    repo.create_group(home, "Servers").unwrap();

    // A group with children or entries cannot be deleted.
    let id = repo.add_entry(&entry("db", servers, &[])).unwrap();
    assert!(matches!(
        repo.delete_group(work),
        Err(LockboxError::NotEmpty(_))
    ));
    assert!(matches!(
        repo.delete_group(servers),
        Err(LockboxError::NotEmpty(_))
    ));

    repo.move_entry_to_group(id, home).unwrap();
    repo.delete_group(servers).unwrap();
    repo.delete_group(work).unwrap();

    assert!(matches!(
        repo.rename_group(ROOT_GROUP_ID, "Everything"),
        Err(LockboxError::RootGroupProtected)
    ));
    assert!(matches!(
        repo.delete_group(ROOT_GROUP_ID),
        Err(LockboxError::RootGroupProtected)
    ));
}

#[test]
fn entries_in_missing_groups_land_in_root() {
    let (store, vault) = open();
    let repo = Repository::new(&store, &vault);

    let id = repo.add_entry(&entry("orphan", 999, &[])).unwrap();
    assert_eq!(repo.load_entry(id).unwrap().entry.group_id, ROOT_GROUP_ID);

    assert!(matches!(
        repo.move_entry_to_group(id, 999),
        Err(LockboxError::NotFound(_))
    ));
}

#[test]
fn tags_are_normalized_and_only_used_ones_are_listed() {
    let (store, vault) = open();
    let repo = Repository::new(&store, &vault);

    let a = repo
        .add_entry(&entry("a", ROOT_GROUP_ID, &[" Work ", "work", "", "prod"]))
        .unwrap();
    repo.add_entry(&entry("b", ROOT_GROUP_ID, &["Alpha"])).unwrap();

    assert_eq!(repo.load_entry(a).unwrap().entry.tags, vec!["prod", "Work"]);
    assert_eq!(repo.list_all_tags().unwrap(), vec!["Alpha", "prod", "Work"]);

    repo.delete_entry(a).unwrap();
    assert_eq!(repo.list_all_tags().unwrap(), vec!["Alpha"]);
}

#[test]
fn update_rewrites_fields_and_keeps_created_at() {
    let (store, vault) = open();
    let repo = Repository::new(&store, &vault);

    let id = repo
        .add_entry_with_timestamps(&entry("Mail", ROOT_GROUP_ID, &["x"]), 1_000, 2_000)
        .unwrap();

    let mut loaded = repo.load_entry(id).unwrap();
    loaded.entry.title = "Webmail".into();
    loaded.entry.entry_type = EntryType::ApiKeyToken;
    loaded.entry.tags = vec!["y".into()];
    loaded.password = "new-pw".into();
    loaded.notes = "  ".into();
    repo.update_entry(&loaded).unwrap();

    let reloaded = repo.load_entry(id).unwrap();
    assert_eq!(reloaded.entry.title, "Webmail");
    assert_eq!(reloaded.entry.entry_type, EntryType::ApiKeyToken);
    assert_eq!(reloaded.entry.tags, vec!["y"]);
    assert_eq!(reloaded.password, "new-pw");
    assert_eq!(reloaded.notes, "  ");
    assert_eq!(reloaded.entry.created_at.timestamp(), 1_000);
    assert!(reloaded.entry.updated_at.timestamp() > 2_000);
}

#[test]
fn invalid_entries_are_rejected() {
    let (store, vault) = open();
    let repo = Repository::new(&store, &vault);

    let mut no_title = entry("  ", ROOT_GROUP_ID, &[]);
    assert!(matches!(
        repo.add_entry(&no_title),
        Err(LockboxError::EmptyInput(_))
    ));

    no_title.entry.title = "ok".into();
    no_title.password = String::new();
    assert!(matches!(
        repo.add_entry(&no_title),
        Err(LockboxError::EmptyInput(_))
    ));

    assert!(matches!(
        repo.load_entry(42),
        Err(LockboxError::NotFound(_))
    ));
}

#[test]
fn categories_are_distinct_and_sorted() {
    let (store, vault) = open();
    let repo = Repository::new(&store, &vault);

    for (title, category) in [("a", "mail"), ("b", "Banking"), ("c", "mail"), ("d", " ")] {
        let mut e = entry(title, ROOT_GROUP_ID, &[]);
        e.entry.category = category.into();
        repo.add_entry(&e).unwrap();
    }
    assert_eq!(repo.list_categories().unwrap(), vec!["Banking", "mail"]);
}

#[test]
fn common_passwords_lifecycle() {
    let (store, vault) = open();
    let repo = Repository::new(&store, &vault);

    let id = repo
        .add_common_password(&CommonPasswordSecrets::new("Wi-Fi", "hunter22", "guest"))
        .unwrap();
    assert!(matches!(
        repo.add_common_password(&CommonPasswordSecrets::new("Wi-Fi", "x", "")),
        Err(LockboxError::DuplicateName(_))
    ));
    assert_eq!(repo.find_common_password("Wi-Fi").unwrap(), Some(id));

    let mut loaded = repo.load_common_password(id).unwrap();
    assert_eq!(loaded.password, "hunter22");
    assert_eq!(loaded.notes, "guest");

    loaded.password = "changed".into();
    repo.update_common_password(&loaded).unwrap();
    assert_eq!(repo.load_common_password(id).unwrap().password, "changed");

    repo.delete_common_password(id).unwrap();
    assert!(repo.list_common_passwords().unwrap().is_empty());
    assert!(matches!(
        repo.delete_common_password(id),
        Err(LockboxError::NotFound(_))
    ));
}
