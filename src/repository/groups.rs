//! Group hierarchy: CRUD plus an in-memory tree view.
//!
//! The root group (id 1) is seeded with the schema and can never be
//! renamed, moved or deleted. Names are unique among siblings.

use std::collections::HashMap;

use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use crate::errors::{LockboxError, Result};
use crate::store::ROOT_GROUP_ID;

use super::model::Group;
use super::{is_constraint_violation, Repository};

impl Repository<'_> {
    /// All groups, root included, ordered by name.
    pub fn list_groups(&self) -> Result<Vec<Group>> {
        let mut stmt = self
            .store
            .conn()
            .prepare("SELECT id, parent_id, name FROM groups ORDER BY name COLLATE NOCASE, id")?;
        let rows = stmt.query_map([], |r| {
            Ok(Group {
                id: r.get(0)?,
                parent_id: r.get(1)?,
                name: r.get(2)?,
            })
        })?;
        Ok(rows.collect::<std::result::Result<_, _>>()?)
    }

    /// Load the groups into a navigable tree.
    pub fn group_tree(&self) -> Result<GroupTree> {
        Ok(GroupTree::from_groups(self.list_groups()?))
    }

    /// Id of the child of `parent_id` named exactly `name`, if any.
    pub fn find_group(&self, parent_id: i64, name: &str) -> Result<Option<i64>> {
        let id = self
            .store
            .conn()
            .query_row(
                "SELECT id FROM groups WHERE parent_id = ?1 AND name = ?2",
                params![parent_id, name.trim()],
                |r| r.get(0),
            )
            .optional()?;
        Ok(id)
    }

    /// Create a child group and return its id. A non-positive
    /// `parent_id` means the root group.
    pub fn create_group(&self, parent_id: i64, name: &str) -> Result<i64> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LockboxError::EmptyInput("group name"));
        }
        let parent_id = if parent_id <= 0 { ROOT_GROUP_ID } else { parent_id };
        let conn = self.store.conn();
        let parent_exists = conn
            .query_row("SELECT 1 FROM groups WHERE id = ?1", params![parent_id], |_| {
                Ok(())
            })
            .optional()?
            .is_some();
        if !parent_exists {
            return Err(LockboxError::NotFound(format!("group {parent_id}")));
        }

        let now = Utc::now().timestamp();
        match conn.execute(
            "INSERT INTO groups(parent_id, name, created_at, updated_at) VALUES(?1, ?2, ?3, ?3)",
            params![parent_id, name, now],
        ) {
            Ok(_) => {}
            Err(e) if is_constraint_violation(&e) => {
                return Err(LockboxError::DuplicateName(name.to_string()))
            }
            Err(e) => return Err(e.into()),
        }
        let id = conn.last_insert_rowid();
        tracing::debug!(id, parent_id, name, "group created");
        Ok(id)
    }

    pub fn rename_group(&self, group_id: i64, new_name: &str) -> Result<()> {
        if group_id == ROOT_GROUP_ID {
            return Err(LockboxError::RootGroupProtected);
        }
        if group_id <= 0 {
            return Err(LockboxError::InvalidArgument(format!(
                "invalid group id {group_id}"
            )));
        }
        let name = new_name.trim();
        if name.is_empty() {
            return Err(LockboxError::EmptyInput("group name"));
        }

        let changed = match self.store.conn().execute(
            "UPDATE groups SET name = ?1, updated_at = ?2 WHERE id = ?3",
            params![name, Utc::now().timestamp(), group_id],
        ) {
            Ok(n) => n,
            Err(e) if is_constraint_violation(&e) => {
                return Err(LockboxError::DuplicateName(name.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        if changed == 0 {
            return Err(LockboxError::NotFound(format!("group {group_id}")));
        }
        Ok(())
    }

    /// Delete an empty, non-root group.
    pub fn delete_group(&self, group_id: i64) -> Result<()> {
        if group_id == ROOT_GROUP_ID {
            return Err(LockboxError::RootGroupProtected);
        }
        if group_id <= 0 {
            return Err(LockboxError::InvalidArgument(format!(
                "invalid group id {group_id}"
            )));
        }

        let tx = self.store.transaction()?;
        let children: i64 = tx.query_row(
            "SELECT COUNT(1) FROM groups WHERE parent_id = ?1",
            params![group_id],
            |r| r.get(0),
        )?;
        if children > 0 {
            return Err(LockboxError::NotEmpty(format!(
                "group {group_id} has {children} child group(s)"
            )));
        }
        let entries: i64 = tx.query_row(
            "SELECT COUNT(1) FROM password_entries WHERE group_id = ?1",
            params![group_id],
            |r| r.get(0),
        )?;
        if entries > 0 {
            return Err(LockboxError::NotEmpty(format!(
                "group {group_id} holds {entries} entr{}",
                if entries == 1 { "y" } else { "ies" }
            )));
        }

        let changed = tx.execute("DELETE FROM groups WHERE id = ?1", params![group_id])?;
        if changed == 0 {
            return Err(LockboxError::NotFound(format!("group {group_id}")));
        }
        tx.commit()?;
        tracing::debug!(group_id, "group deleted");
        Ok(())
    }
}

/// Snapshot of the group hierarchy.
#[derive(Debug, Clone, Default)]
pub struct GroupTree {
    groups: HashMap<i64, Group>,
    children: HashMap<i64, Vec<i64>>,
}

impl GroupTree {
    pub fn from_groups(groups: Vec<Group>) -> Self {
        let mut children: HashMap<i64, Vec<i64>> = HashMap::new();
        for g in &groups {
            if let Some(parent) = g.parent_id {
                children.entry(parent).or_default().push(g.id);
            }
        }
        let groups: HashMap<i64, Group> = groups.into_iter().map(|g| (g.id, g)).collect();
        for ids in children.values_mut() {
            ids.sort_by_key(|id| {
                groups
                    .get(id)
                    .map(|g| g.name.to_lowercase())
                    .unwrap_or_default()
            });
        }
        Self { groups, children }
    }

    pub fn get(&self, id: i64) -> Option<&Group> {
        self.groups.get(&id)
    }

    /// Direct children of `id`, sorted by name.
    pub fn children(&self, id: i64) -> &[i64] {
        self.children.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// `id` followed by every group beneath it, depth first.
    pub fn descendant_ids(&self, id: i64) -> Vec<i64> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if out.contains(&current) {
                continue;
            }
            out.push(current);
            stack.extend(self.children(current).iter().rev());
        }
        out
    }

    /// Slash-separated path below the root, e.g. `Work/Servers`.
    /// The root itself renders as its own name.
    pub fn path_of(&self, id: i64) -> String {
        let mut parts = Vec::new();
        let mut current = self.groups.get(&id);
        while let Some(g) = current {
            if g.id == ROOT_GROUP_ID {
                break;
            }
            if parts.len() > self.groups.len() {
                break;
            }
            parts.push(g.name.as_str());
            current = g.parent_id.and_then(|p| self.groups.get(&p));
        }
        if parts.is_empty() {
            return self
                .groups
                .get(&id)
                .map(|g| g.name.clone())
                .unwrap_or_default();
        }
        parts.reverse();
        parts.join("/")
    }

    /// Depth-first walk yielding `(depth, group)`; the root is depth 0.
    pub fn walk(&self) -> Vec<(usize, &Group)> {
        let mut out = Vec::new();
        let mut stack = vec![(0usize, ROOT_GROUP_ID)];
        while let Some((depth, id)) = stack.pop() {
            if let Some(g) = self.groups.get(&id) {
                out.push((depth, g));
            }
            for child in self.children(id).iter().rev() {
                stack.push((depth + 1, *child));
            }
        }
        out
    }
}
