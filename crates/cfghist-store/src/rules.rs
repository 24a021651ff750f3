//! Rule and marker persistence
//!
//! Reads the enabled rules and known markers, and owns one
//! [`TableSynchronizer`] per rule result table. Each table is synchronized
//! as a whole: every run replaces the previous run's rows.

use cfghist_core::delta::Row;
use cfghist_core::rules::{MarkerItem, Rule, RuleItem, RuleLog, RuleStatus};
use rusqlite::Connection;
use std::collections::BTreeMap;

use crate::errors::{persistence, Result};
use crate::table_sync::{TableSyncSummary, TableSynchronizer};

/// Enabled rules in id order.
///
/// # Errors
///
/// `Persistence` if the query fails.
pub fn query_enabled_rules(conn: &Connection) -> Result<Vec<Rule>> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT id, name, hash, target, script FROM rules WHERE enabled = 1 ORDER BY id",
        )
        .map_err(persistence("query_enabled_rules"))?;
    let rows = stmt
        .query_map([], |row| {
            Ok(Rule {
                id: row.get(0)?,
                name: row.get(1)?,
                hash: row.get(2)?,
                target: row.get(3)?,
                script: row.get(4)?,
            })
        })
        .map_err(persistence("query_enabled_rules"))?;

    rows.collect::<rusqlite::Result<Vec<_>>>()
        .map_err(persistence("query_enabled_rules"))
}

/// Marker ids keyed by marker name.
///
/// # Errors
///
/// `Persistence` if the query fails.
pub fn query_marker_ids(conn: &Connection) -> Result<BTreeMap<String, i64>> {
    let mut stmt = conn
        .prepare_cached("SELECT id, name FROM markers")
        .map_err(persistence("query_marker_ids"))?;
    let rows = stmt
        .query_map([], |row| Ok((row.get::<_, String>(1)?, row.get::<_, i64>(0)?)))
        .map_err(persistence("query_marker_ids"))?;

    rows.collect::<rusqlite::Result<BTreeMap<_, _>>>()
        .map_err(persistence("query_marker_ids"))
}

/// Synchronizers for the four rule result tables.
#[derive(Debug, Clone)]
pub struct RuleTables {
    statuses: TableSynchronizer,
    items: TableSynchronizer,
    logs: TableSynchronizer,
    marker_items: TableSynchronizer,
}

/// Rows for one run, in column order of each table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleRows {
    pub statuses: Vec<Row>,
    pub items: Vec<Row>,
    pub logs: Vec<Row>,
    pub marker_items: Vec<Row>,
}

/// What synchronizing one run changed, per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuleSyncSummary {
    pub statuses: TableSyncSummary,
    pub items: TableSyncSummary,
    pub logs: TableSyncSummary,
    pub marker_items: TableSyncSummary,
}

impl RuleTables {
    pub fn new() -> Self {
        Self {
            statuses: TableSynchronizer::new("rule_statuses", &[], RuleStatus::COLUMNS),
            items: TableSynchronizer::new("rule_items", &[], RuleItem::COLUMNS),
            logs: TableSynchronizer::new("rule_logs", &[], RuleLog::COLUMNS),
            marker_items: TableSynchronizer::new("marker_items", &[], MarkerItem::COLUMNS),
        }
    }

    /// Replace every rule result table with `rows`.
    ///
    /// # Errors
    ///
    /// `Persistence` if any statement fails; pass a transaction so a failure
    /// leaves all four tables untouched.
    pub fn sync(&self, conn: &Connection, rows: RuleRows) -> Result<RuleSyncSummary> {
        Ok(RuleSyncSummary {
            statuses: self.statuses.execute(conn, &[], rows.statuses)?,
            items: self.items.execute(conn, &[], rows.items)?,
            logs: self.logs.execute(conn, &[], rows.logs)?,
            marker_items: self.marker_items.execute(conn, &[], rows.marker_items)?,
        })
    }
}

impl Default for RuleTables {
    fn default() -> Self {
        Self::new()
    }
}
