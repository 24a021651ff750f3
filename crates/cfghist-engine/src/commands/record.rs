//! Snapshot, diff, and observation recording.
//!
//! ## Cycle (in order):
//! 1. Begin transaction
//! 2. Resolve parent (fetch-or-create by second-precision date)
//! 3. Read current items, compute delta, apply mutations
//! 4. (observation only) Evaluate rules and synchronize rule tables
//! 5. Commit, or roll back on error or dry run

#![allow(clippy::result_large_err)]

use cfghist_core::delta::{DeltaOp, DeltaSummary};
use cfghist_core::errors::ExError;
use cfghist_core::model::{DiffItem, ObservedTree, SnapshotItem};
use cfghist_core::rules::RuleEvaluator;
use cfghist_core::{log_op_end, log_op_error, log_op_start};
use cfghist_core_types::RequestContext;
use cfghist_store::errors::{from_rusqlite, Result};
use cfghist_store::HistoryStore;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, Transaction};
use serde::Serialize;

use crate::rules::{RuleProcessor, RuleRunReport};

/// Options for a recording cycle.
#[derive(Debug, Clone, Default)]
pub struct RecordOptions {
    /// Compute and return the delta, then roll back instead of committing.
    pub dry_run: bool,
    /// Correlation context; a fresh one is created when absent.
    pub context: Option<RequestContext>,
}

impl RecordOptions {
    pub fn dry_run() -> Self {
        Self {
            dry_run: true,
            context: None,
        }
    }
}

/// Outcome of reconciling one parent's items.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncReport<T> {
    /// Snapshot or diff id. In a dry run against a new date this id was
    /// assigned inside the rolled-back transaction and does not persist.
    pub parent_id: i64,
    pub date: DateTime<Utc>,
    pub summary: DeltaSummary,
    pub dry_run: bool,
    /// The computed operations; only populated in a dry run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ops: Option<Vec<DeltaOp<T>>>,
}

impl<T> SyncReport<T> {
    fn new(parent_id: i64, date: DateTime<Utc>, ops: Vec<DeltaOp<T>>, dry_run: bool) -> Self {
        Self {
            parent_id,
            date,
            summary: DeltaSummary::from_ops(&ops),
            dry_run,
            ops: dry_run.then_some(ops),
        }
    }
}

/// Outcome of a full observation: snapshot items plus rule results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObservationReport {
    pub snapshot: SyncReport<SnapshotItem>,
    pub rules: RuleRunReport,
}

/// Record the snapshot for `date` so its items equal `items`.
///
/// # Errors
///
/// - `InvalidInput`: an item's info cannot be keyed
/// - `InvariantViolation`: the computed delta failed verification
/// - `Persistence`: any storage failure; nothing is committed
pub fn record_snapshot(
    conn: &mut Connection,
    date: DateTime<Utc>,
    items: Vec<SnapshotItem>,
    options: RecordOptions,
) -> Result<SyncReport<SnapshotItem>> {
    let ctx = options.context.clone().unwrap_or_default();
    log_op_start!(
        "record_snapshot",
        request_id = %ctx.request_id,
        item_count = items.len(),
        dry_run = options.dry_run
    );
    let start = std::time::Instant::now();

    let report = in_cycle(conn, options.dry_run, |tx| {
        snapshot_cycle(tx, date, items, options.dry_run)
    })
    .map_err(|e| {
        let e = correlate(e, &ctx);
        log_op_error!(
            "record_snapshot",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64
        );
        e
    })?;

    log_op_end!(
        "record_snapshot",
        duration_ms = start.elapsed().as_millis() as u64,
        request_id = %ctx.request_id,
        snapshot_id = report.parent_id,
        creates = report.summary.creates,
        updates = report.summary.updates,
        deletes = report.summary.deletes
    );
    Ok(report)
}

/// Record the diff for `(snapshot_id, date)` so its items equal `items`.
///
/// # Errors
///
/// As [`record_snapshot`]; an unknown `snapshot_id` is a `Persistence` error.
pub fn record_diff(
    conn: &mut Connection,
    snapshot_id: i64,
    date: DateTime<Utc>,
    items: Vec<DiffItem>,
    options: RecordOptions,
) -> Result<SyncReport<DiffItem>> {
    let ctx = options.context.clone().unwrap_or_default();
    log_op_start!(
        "record_diff",
        request_id = %ctx.request_id,
        snapshot_id,
        item_count = items.len(),
        dry_run = options.dry_run
    );
    let start = std::time::Instant::now();

    let store = HistoryStore::new();
    let report = in_cycle(conn, options.dry_run, |tx| {
        let diff = store.fetch_diff(tx, snapshot_id, date)?;
        let ops = store.sync_diff_items(tx, diff.id, items)?;
        Ok(SyncReport::new(diff.id, diff.date, ops, options.dry_run))
    })
    .map_err(|e| {
        let e = correlate(e, &ctx);
        log_op_error!(
            "record_diff",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64
        );
        e
    })?;

    log_op_end!(
        "record_diff",
        duration_ms = start.elapsed().as_millis() as u64,
        request_id = %ctx.request_id,
        diff_id = report.parent_id,
        creates = report.summary.creates,
        updates = report.summary.updates,
        deletes = report.summary.deletes
    );
    Ok(report)
}

/// Record a full observation: the snapshot at `tree.date` and the results of
/// every enabled rule, committed together.
///
/// Rule evaluation annotates `tree` with alerts and markers.
///
/// # Errors
///
/// As [`record_snapshot`]. Rule evaluation failures are not errors; they
/// are recorded as rule log rows.
pub fn record_observation(
    conn: &mut Connection,
    tree: &mut ObservedTree,
    evaluator: &dyn RuleEvaluator,
    options: RecordOptions,
) -> Result<ObservationReport> {
    let ctx = options.context.clone().unwrap_or_default();
    log_op_start!(
        "record_observation",
        request_id = %ctx.request_id,
        item_count = tree.count(),
        dry_run = options.dry_run
    );
    let start = std::time::Instant::now();

    let processor = RuleProcessor::new();
    let now = Utc::now();
    let report = in_cycle(conn, options.dry_run, |tx| {
        let snapshot = snapshot_cycle(tx, tree.date, tree.items.clone(), options.dry_run)?;
        let rules = processor.process(tx, tree, evaluator, now)?;
        Ok(ObservationReport { snapshot, rules })
    })
    .map_err(|e| {
        let e = correlate(e, &ctx);
        log_op_error!(
            "record_observation",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64
        );
        e
    })?;

    log_op_end!(
        "record_observation",
        duration_ms = start.elapsed().as_millis() as u64,
        request_id = %ctx.request_id,
        snapshot_id = report.snapshot.parent_id,
        changes = report.snapshot.summary.total(),
        rules = report.rules.rules_processed
    );
    Ok(report)
}

fn snapshot_cycle(
    tx: &Transaction<'_>,
    date: DateTime<Utc>,
    items: Vec<SnapshotItem>,
    dry_run: bool,
) -> Result<SyncReport<SnapshotItem>> {
    let store = HistoryStore::new();
    let snapshot = store.fetch_snapshot(tx, date)?;
    let ops = store.sync_snapshot_items(tx, snapshot.id, items)?;
    Ok(SyncReport::new(snapshot.id, snapshot.date, ops, dry_run))
}

/// Run `body` inside one transaction; commit unless it fails or `dry_run`.
fn in_cycle<R>(
    conn: &mut Connection,
    dry_run: bool,
    body: impl FnOnce(&Transaction<'_>) -> Result<R>,
) -> Result<R> {
    let tx = conn.transaction().map_err(from_rusqlite)?;
    let result = body(&tx)?;
    if dry_run {
        tx.rollback().map_err(from_rusqlite)?;
    } else {
        tx.commit().map_err(from_rusqlite)?;
    }
    Ok(result)
}

fn correlate(err: ExError, ctx: &RequestContext) -> ExError {
    let err = err.with_request_id(ctx.request_id.clone());
    match &ctx.trace_id {
        Some(trace_id) => err.with_trace_id(trace_id.clone()),
        None => err,
    }
}
