//! Engine-level commands for recording history.

#![allow(clippy::result_large_err)]

use crate::commands::record::{record_diff, record_snapshot, RecordOptions, SyncReport};
use cfghist_core::model::{DiffItem, SnapshotItem};
use cfghist_store::errors::Result;
use chrono::{DateTime, Utc};
use rusqlite::Connection;

/// Engine-level commands that require a database.
#[derive(Debug, Clone)]
pub enum EngineCommand {
    /// Reconcile the snapshot at `date` with `items`.
    RecordSnapshot {
        date: DateTime<Utc>,
        items: Vec<SnapshotItem>,
        options: RecordOptions,
    },
    /// Reconcile the diff at `(snapshot_id, date)` with `items`.
    RecordDiff {
        snapshot_id: i64,
        date: DateTime<Utc>,
        items: Vec<DiffItem>,
        options: RecordOptions,
    },
}

/// Result of applying an engine command.
#[derive(Debug, Clone)]
pub enum EngineCommandResult {
    Snapshot(SyncReport<SnapshotItem>),
    Diff(SyncReport<DiffItem>),
}

/// Apply an engine command in its own transaction.
pub fn apply_engine_command(
    cmd: EngineCommand,
    conn: &mut Connection,
) -> Result<EngineCommandResult> {
    match cmd {
        EngineCommand::RecordSnapshot {
            date,
            items,
            options,
        } => record_snapshot(conn, date, items, options).map(EngineCommandResult::Snapshot),
        EngineCommand::RecordDiff {
            snapshot_id,
            date,
            items,
            options,
        } => record_diff(conn, snapshot_id, date, items, options).map(EngineCommandResult::Diff),
    }
}
