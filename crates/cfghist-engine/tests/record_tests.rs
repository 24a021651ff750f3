// Integration tests for snapshot and diff recording cycles

use cfghist_core::delta::DeltaOp;
use cfghist_core::model::{DiffItem, SnapshotItem};
use cfghist_core::ExErrorKind;
use cfghist_core_types::{RequestContext, TraceId};
use cfghist_engine::commands::{
    apply_engine_command, record_diff, record_snapshot, EngineCommand, EngineCommandResult,
    RecordOptions,
};
use cfghist_store::migrations::apply_migrations;
use cfghist_store::HistoryStore;
use chrono::{DateTime, TimeZone, Utc};
use rusqlite::Connection;
use serde_json::json;
use tempfile::TempDir;

fn setup() -> (TempDir, Connection) {
    let dir = TempDir::new().unwrap();
    let mut conn = cfghist_store::db::open(dir.path().join("history.db")).unwrap();
    apply_migrations(&mut conn).unwrap();
    (dir, conn)
}

fn at(secs: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 8, 30, secs).unwrap()
}

fn count(conn: &Connection, sql: &str) -> i64 {
    conn.query_row(sql, [], |row| row.get(0)).unwrap()
}

fn observation() -> Vec<SnapshotItem> {
    vec![
        SnapshotItem::new("root/ns-[a]", json!({"kind": "ns"}), json!({"labels": {}})),
        SnapshotItem::new("root/ns-[a]/app-[web]", json!({"kind": "app"}), json!({"replicas": 2})),
    ]
}

#[test]
fn test_record_snapshot_commits_and_is_idempotent() {
    // Given: A migrated database
    let (_dir, mut conn) = setup();

    // When: The same observation is recorded twice for the same second
    let first = record_snapshot(&mut conn, at(0), observation(), RecordOptions::default()).unwrap();
    let second =
        record_snapshot(&mut conn, at(0), observation(), RecordOptions::default()).unwrap();

    // Then: One snapshot holds both items; the second cycle changed nothing
    assert_eq!(first.parent_id, second.parent_id);
    assert_eq!(first.summary.creates, 2);
    assert!(second.summary.is_empty());
    assert!(first.ops.is_none());
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM snapshots"), 1);
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM snap_items"), 2);
}

#[test]
fn test_dry_run_reports_ops_without_writing() {
    // Given: A recorded snapshot
    let (_dir, mut conn) = setup();
    record_snapshot(&mut conn, at(0), observation(), RecordOptions::default()).unwrap();

    // When: A changed observation is recorded as a dry run
    let mut changed = observation();
    changed[1].config = json!({"replicas": 3});
    let report = record_snapshot(&mut conn, at(0), changed, RecordOptions::dry_run()).unwrap();

    // Then: The update is reported but not persisted
    assert!(report.dry_run);
    assert_eq!(report.summary.updates, 1);
    let ops = report.ops.unwrap();
    assert!(matches!(ops[0], DeltaOp::Update { .. }));

    let store = HistoryStore::new();
    let items = store.query_snapshot_items(&conn, report.parent_id).unwrap();
    assert!(items.iter().all(|row| row.item.config != json!({"replicas": 3})));
}

#[test]
fn test_dry_run_for_new_date_creates_no_parent() {
    // Given: An empty database
    let (_dir, mut conn) = setup();

    // When: A dry run targets a date with no snapshot
    let report = record_snapshot(&mut conn, at(9), observation(), RecordOptions::dry_run()).unwrap();

    // Then: Creates are reported but no snapshot row survives
    assert_eq!(report.summary.creates, 2);
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM snapshots"), 0);
}

#[test]
fn test_failed_cycle_leaves_no_parent_row() {
    // Given: An empty database
    let (_dir, mut conn) = setup();
    let mut deep = json!("leaf");
    for _ in 0..130 {
        deep = json!({ "n": deep });
    }

    let trace_id = TraceId::new();

    // When: An observation with unkeyable info is recorded under a trace
    let err = record_snapshot(
        &mut conn,
        at(1),
        vec![SnapshotItem::new("/x", deep, json!(null))],
        RecordOptions {
            dry_run: false,
            context: Some(RequestContext::new().with_trace_id(trace_id.clone())),
        },
    )
    .unwrap_err();

    // Then: The cycle fails as invalid input and the snapshot insert is rolled back
    assert_eq!(err.kind(), ExErrorKind::InvalidInput);
    assert!(err.request_id().is_some());
    assert_eq!(err.trace_id(), Some(&trace_id));
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM snapshots"), 0);
}

#[test]
fn test_record_diff_under_snapshot() {
    // Given: A recorded snapshot
    let (_dir, mut conn) = setup();
    let snapshot =
        record_snapshot(&mut conn, at(0), observation(), RecordOptions::default()).unwrap();

    // When: A diff marks the app as removed, then re-added
    let removed = vec![DiffItem::new(
        "root/ns-[a]/app-[web]",
        json!({"kind": "app"}),
        false,
        json!(null),
    )];
    let d1 = record_diff(
        &mut conn,
        snapshot.parent_id,
        at(15),
        removed,
        RecordOptions::default(),
    )
    .unwrap();
    let readded = vec![DiffItem::new(
        "root/ns-[a]/app-[web]",
        json!({"kind": "app"}),
        true,
        json!({"replicas": 2}),
    )];
    let d2 = record_diff(
        &mut conn,
        snapshot.parent_id,
        at(15),
        readded,
        RecordOptions::default(),
    )
    .unwrap();

    // Then: The same diff row is reused and its item updated in place
    assert_eq!(d1.parent_id, d2.parent_id);
    assert_eq!(d1.summary.creates, 1);
    assert_eq!(d2.summary.updates, 1);
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM diff_items"), 1);
    assert_eq!(count(&conn, "SELECT present FROM diff_items"), 1);
}

#[test]
fn test_record_diff_for_unknown_snapshot_fails() {
    // Given: An empty database
    let (_dir, mut conn) = setup();

    // When: A diff is recorded against a missing snapshot
    let err = record_diff(&mut conn, 42, at(0), vec![], RecordOptions::default()).unwrap_err();

    // Then: Persistence error, nothing written
    assert_eq!(err.kind(), ExErrorKind::Persistence);
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM diffs"), 0);
}

#[test]
fn test_apply_engine_command_dispatches() {
    // Given: A migrated database
    let (_dir, mut conn) = setup();

    // When: A snapshot command is applied
    let result = apply_engine_command(
        EngineCommand::RecordSnapshot {
            date: at(3),
            items: observation(),
            options: RecordOptions::default(),
        },
        &mut conn,
    )
    .unwrap();

    // Then: A snapshot report comes back
    match result {
        EngineCommandResult::Snapshot(report) => assert_eq!(report.summary.creates, 2),
        other => panic!("unexpected result: {:?}", other),
    }
}
