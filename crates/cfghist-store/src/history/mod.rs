//! History persistence
//!
//! [`HistoryStore`] owns the statement registry and exposes the pieces of
//! one reconciliation cycle:
//! - identity resolution for snapshot and diff parents
//! - the current-items read path
//! - item sync (read current, compute delta, apply mutations)
//!
//! All methods take a `&Connection`; pass a `&Transaction` to make a cycle
//! atomic. The store never commits.

mod items;
mod record;
mod resolver;

pub use record::ItemRecord;

use crate::statements::StatementRegistry;

#[derive(Debug, Clone, Default)]
pub struct HistoryStore {
    statements: StatementRegistry,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self {
            statements: StatementRegistry::new(),
        }
    }

    pub fn statements(&self) -> &StatementRegistry {
        &self.statements
    }
}
