//! Common passwords: named secrets that belong to no account.

use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use crate::errors::{LockboxError, Result};

use super::model::{from_unix, CommonPassword, CommonPasswordSecrets};
use super::{is_constraint_violation, Repository};

fn validate(secrets: &CommonPasswordSecrets) -> Result<()> {
    if secrets.item.name.trim().is_empty() {
        return Err(LockboxError::EmptyInput("name"));
    }
    if secrets.password.is_empty() {
        return Err(LockboxError::EmptyInput("password"));
    }
    Ok(())
}

impl Repository<'_> {
    /// Most recently updated first.
    pub fn list_common_passwords(&self) -> Result<Vec<CommonPassword>> {
        let mut stmt = self.store.conn().prepare(
            "SELECT id, name, created_at, updated_at FROM common_passwords
             ORDER BY updated_at DESC, id DESC",
        )?;
        let rows = stmt.query_map([], |r| {
            Ok(CommonPassword {
                id: r.get(0)?,
                name: r.get(1)?,
                created_at: from_unix(r.get(2)?),
                updated_at: from_unix(r.get(3)?),
            })
        })?;
        Ok(rows.collect::<std::result::Result<_, _>>()?)
    }

    /// Look up a common password by its exact name.
    pub fn find_common_password(&self, name: &str) -> Result<Option<i64>> {
        let id = self
            .store
            .conn()
            .query_row(
                "SELECT id FROM common_passwords WHERE name = ?1",
                params![name.trim()],
                |r| r.get(0),
            )
            .optional()?;
        Ok(id)
    }

    pub fn load_common_password(&self, id: i64) -> Result<CommonPasswordSecrets> {
        self.vault.key()?;
        let row = self
            .store
            .conn()
            .query_row(
                "SELECT id, name, created_at, updated_at, password_enc, notes_enc
                 FROM common_passwords WHERE id = ?1",
                params![id],
                |r| {
                    Ok((
                        CommonPassword {
                            id: r.get(0)?,
                            name: r.get(1)?,
                            created_at: from_unix(r.get(2)?),
                            updated_at: from_unix(r.get(3)?),
                        },
                        r.get::<_, Vec<u8>>(4)?,
                        r.get::<_, Option<Vec<u8>>>(5)?,
                    ))
                },
            )
            .optional()?;
        let (item, password_enc, notes_enc) =
            row.ok_or_else(|| LockboxError::NotFound(format!("common password {id}")))?;

        let password = self.open_text(Some(&password_enc))?;
        let notes = self.open_text(notes_enc.as_deref())?;
        Ok(CommonPasswordSecrets {
            item,
            password,
            notes,
        })
    }

    pub fn add_common_password(&self, secrets: &CommonPasswordSecrets) -> Result<i64> {
        validate(secrets)?;
        let name = secrets.item.name.trim();
        let password_enc = self.seal_text(&secrets.password)?;
        let notes_enc = self.seal_optional(&secrets.notes)?;
        let now = Utc::now().timestamp();

        let conn = self.store.conn();
        match conn.execute(
            "INSERT INTO common_passwords(name, password_enc, notes_enc, created_at, updated_at)
             VALUES(?1, ?2, ?3, ?4, ?4)",
            params![name, password_enc, notes_enc, now],
        ) {
            Ok(_) => {}
            Err(e) if is_constraint_violation(&e) => {
                return Err(LockboxError::DuplicateName(name.to_string()))
            }
            Err(e) => return Err(e.into()),
        }
        Ok(conn.last_insert_rowid())
    }

    pub fn update_common_password(&self, secrets: &CommonPasswordSecrets) -> Result<()> {
        let id = secrets.item.id;
        if id <= 0 {
            return Err(LockboxError::InvalidArgument(format!(
                "invalid common password id {id}"
            )));
        }
        validate(secrets)?;
        let name = secrets.item.name.trim();
        let password_enc = self.seal_text(&secrets.password)?;
        let notes_enc = self.seal_optional(&secrets.notes)?;

        let changed = match self.store.conn().execute(
            "UPDATE common_passwords
             SET name = ?1, password_enc = ?2, notes_enc = ?3, updated_at = ?4
             WHERE id = ?5",
            params![name, password_enc, notes_enc, Utc::now().timestamp(), id],
        ) {
            Ok(n) => n,
            Err(e) if is_constraint_violation(&e) => {
                return Err(LockboxError::DuplicateName(name.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        if changed == 0 {
            return Err(LockboxError::NotFound(format!("common password {id}")));
        }
        Ok(())
    }

    pub fn delete_common_password(&self, id: i64) -> Result<()> {
        self.vault.key()?;
        let changed = self
            .store
            .conn()
            .execute("DELETE FROM common_passwords WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(LockboxError::NotFound(format!("common password {id}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::unlocked;

    #[test]
    fn crud_round_trip() {
        let (store, vault) = unlocked();
        let repo = Repository::new(&store, &vault);

        let id = repo
            .add_common_password(&CommonPasswordSecrets::new("Wi-Fi", "hunter2", "guest net"))
            .unwrap();
        assert_eq!(repo.find_common_password("Wi-Fi").unwrap(), Some(id));

        let mut loaded = repo.load_common_password(id).unwrap();
        assert_eq!(loaded.item.name, "Wi-Fi");
        assert_eq!(loaded.password, "hunter2");
        assert_eq!(loaded.notes, "guest net");

        loaded.password = "correct horse".into();
        loaded.notes.clear();
        repo.update_common_password(&loaded).unwrap();
        let again = repo.load_common_password(id).unwrap();
        assert_eq!(again.password, "correct horse");
        assert_eq!(again.notes, "");

        assert_eq!(repo.list_common_passwords().unwrap().len(), 1);
        repo.delete_common_password(id).unwrap();
        assert!(repo.list_common_passwords().unwrap().is_empty());
        assert!(matches!(
            repo.delete_common_password(id),
            Err(LockboxError::NotFound(_))
        ));
    }

    #[test]
    fn rejects_blank_name_or_password() {
        let (store, vault) = unlocked();
        let repo = Repository::new(&store, &vault);
        assert!(matches!(
            repo.add_common_password(&CommonPasswordSecrets::new(" ", "pw", "")),
            Err(LockboxError::EmptyInput("name"))
        ));
        assert!(matches!(
            repo.add_common_password(&CommonPasswordSecrets::new("x", "", "")),
            Err(LockboxError::EmptyInput("password"))
        ));
    }

    #[test]
    fn names_are_unique() {
        let (store, vault) = unlocked();
        let repo = Repository::new(&store, &vault);
        repo.add_common_password(&CommonPasswordSecrets::new("pin", "1234", ""))
            .unwrap();
        assert!(matches!(
            repo.add_common_password(&CommonPasswordSecrets::new("pin", "0000", "")),
            Err(LockboxError::DuplicateName(_))
        ));
    }

    #[test]
    fn rotation_reseals_common_passwords() {
        let (store, mut vault) = unlocked();
        let id = Repository::new(&store, &vault)
            .add_common_password(&CommonPasswordSecrets::new("pin", "1234", "door"))
            .unwrap();

        vault.change_master_password(&store, "rotated").unwrap();

        let loaded = Repository::new(&store, &vault)
            .load_common_password(id)
            .unwrap();
        assert_eq!(loaded.password, "1234");
        assert_eq!(loaded.notes, "door");
    }
}
