//! Typed statement registry
//!
//! Every SQL string the history store issues lives here, grouped by the
//! table family it touches. A [`StatementRegistry`] is built once per
//! [`HistoryStore`](crate::history::HistoryStore) and looked up by
//! [`ItemKind`].

/// Which child table an item sync targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Snapshot,
    Diff,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Snapshot => "snapshot",
            ItemKind::Diff => "diff",
        }
    }
}

/// Lookup and creation of a parent row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentStatements {
    pub find: &'static str,
    pub insert: &'static str,
}

/// Reads and writes for the items under one parent.
///
/// Parameter order:
/// - `select`: parent id
/// - `insert`: parent id, then item columns
/// - `update`: item columns, then row id
/// - `delete`: row id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemStatements {
    pub select: &'static str,
    pub insert: &'static str,
    pub update: &'static str,
    pub delete: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementRegistry {
    snapshot: ParentStatements,
    diff: ParentStatements,
    snapshot_items: ItemStatements,
    diff_items: ItemStatements,
}

impl StatementRegistry {
    pub fn new() -> Self {
        Self {
            snapshot: ParentStatements {
                find: "SELECT id, date FROM snapshots WHERE date = ?1 ORDER BY id DESC LIMIT 1",
                insert: "INSERT INTO snapshots (date) VALUES (?1)",
            },
            diff: ParentStatements {
                find: "SELECT id, snapshot_id, date FROM diffs \
                       WHERE snapshot_id = ?1 AND date = ?2 ORDER BY id DESC LIMIT 1",
                insert: "INSERT INTO diffs (snapshot_id, date) VALUES (?1, ?2)",
            },
            snapshot_items: ItemStatements {
                select: "SELECT id, dn, info, config FROM snap_items \
                         WHERE snapshot_id = ?1 ORDER BY id",
                insert: "INSERT INTO snap_items (snapshot_id, dn, info, config) \
                         VALUES (?1, ?2, ?3, ?4)",
                update: "UPDATE snap_items SET dn = ?1, info = ?2, config = ?3 WHERE id = ?4",
                delete: "DELETE FROM snap_items WHERE id = ?1",
            },
            diff_items: ItemStatements {
                select: "SELECT id, dn, info, present, config FROM diff_items \
                         WHERE diff_id = ?1 ORDER BY id",
                insert: "INSERT INTO diff_items (diff_id, dn, info, present, config) \
                         VALUES (?1, ?2, ?3, ?4, ?5)",
                update: "UPDATE diff_items SET dn = ?1, info = ?2, present = ?3, config = ?4 \
                         WHERE id = ?5",
                delete: "DELETE FROM diff_items WHERE id = ?1",
            },
        }
    }

    pub fn parent(&self, kind: ItemKind) -> &ParentStatements {
        match kind {
            ItemKind::Snapshot => &self.snapshot,
            ItemKind::Diff => &self.diff,
        }
    }

    pub fn items(&self, kind: ItemKind) -> &ItemStatements {
        match kind {
            ItemKind::Snapshot => &self.snapshot_items,
            ItemKind::Diff => &self.diff_items,
        }
    }
}

impl Default for StatementRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_every_statement_prepares_against_schema() {
        let mut conn = Connection::open_in_memory().unwrap();
        crate::migrations::apply_migrations(&mut conn).unwrap();

        let registry = StatementRegistry::new();
        for kind in [ItemKind::Snapshot, ItemKind::Diff] {
            let parent = registry.parent(kind);
            let items = registry.items(kind);
            for sql in [
                parent.find,
                parent.insert,
                items.select,
                items.insert,
                items.update,
                items.delete,
            ] {
                assert!(conn.prepare(sql).is_ok(), "failed to prepare: {}", sql);
            }
        }
    }
}
