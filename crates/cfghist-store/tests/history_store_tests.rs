// Integration tests for parent resolution and item sync against SQLite

use cfghist_core::delta::{DeleteReason, DeltaOp};
use cfghist_core::model::{DiffItem, SnapshotItem};
use cfghist_core::ExErrorKind;
use cfghist_store::migrations::apply_migrations;
use cfghist_store::HistoryStore;
use chrono::{DateTime, Duration, TimeZone, Utc};
use rusqlite::{params, Connection};
use serde_json::json;

fn setup() -> Connection {
    let mut conn = cfghist_store::db::open_in_memory().unwrap();
    apply_migrations(&mut conn).unwrap();
    conn
}

fn at(secs: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, secs).unwrap()
}

fn snap(dn: &str, info: serde_json::Value, config: serde_json::Value) -> SnapshotItem {
    SnapshotItem::new(dn, info, config)
}

fn count(conn: &Connection, sql: &str) -> i64 {
    conn.query_row(sql, [], |row| row.get(0)).unwrap()
}

#[test]
fn test_fetch_snapshot_is_stable_within_a_second() {
    // Given: A store and two instants in the same second
    let conn = setup();
    let store = HistoryStore::new();
    let first = at(5) + Duration::milliseconds(100);
    let second = at(5) + Duration::milliseconds(900);

    // When: Both are resolved
    let a = store.fetch_snapshot(&conn, first).unwrap();
    let b = store.fetch_snapshot(&conn, second).unwrap();

    // Then: One row exists and both calls return it, truncated
    assert_eq!(a, b);
    assert_eq!(a.date, at(5));
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM snapshots"), 1);
}

#[test]
fn test_fetch_snapshot_returns_highest_id_match() {
    // Given: Two pre-existing snapshots sharing a date
    let conn = setup();
    for _ in 0..2 {
        conn.execute(
            "INSERT INTO snapshots (date) VALUES ('2024-05-01 12:00:07')",
            [],
        )
        .unwrap();
    }

    // When: That date is resolved
    let snapshot = HistoryStore::new().fetch_snapshot(&conn, at(7)).unwrap();

    // Then: The most recently inserted row wins and nothing new is inserted
    assert_eq!(snapshot.id, 2);
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM snapshots"), 2);
}

#[test]
fn test_fetch_diff_is_scoped_by_snapshot() {
    // Given: Two snapshots
    let conn = setup();
    let store = HistoryStore::new();
    let s1 = store.fetch_snapshot(&conn, at(1)).unwrap();
    let s2 = store.fetch_snapshot(&conn, at(2)).unwrap();

    // When: Diffs are resolved for the same date under each
    let d1 = store.fetch_diff(&conn, s1.id, at(30)).unwrap();
    let d1_again = store.fetch_diff(&conn, s1.id, at(30)).unwrap();
    let d2 = store.fetch_diff(&conn, s2.id, at(30)).unwrap();

    // Then: Each snapshot gets its own diff, reused on repeat
    assert_eq!(d1, d1_again);
    assert_ne!(d1.id, d2.id);
    assert_eq!(d2.snapshot_id, s2.id);
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM diffs"), 2);
}

#[test]
fn test_fetch_diff_rejects_unknown_snapshot() {
    // Given: An empty store
    let conn = setup();

    // When: A diff is resolved against a snapshot that does not exist
    let err = HistoryStore::new().fetch_diff(&conn, 99, at(0)).unwrap_err();

    // Then: The foreign key rejects it
    assert_eq!(err.kind(), ExErrorKind::Persistence);
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM diffs"), 0);
}

#[test]
fn test_sync_snapshot_items_creates_then_converges() {
    // Given: A snapshot with no items
    let conn = setup();
    let store = HistoryStore::new();
    let snapshot = store.fetch_snapshot(&conn, at(0)).unwrap();
    let observed = vec![
        snap("/a", json!({"kind": "ns"}), json!({"x": 1})),
        snap("/b", json!(null), json!(null)),
    ];

    // When: The same observation is synced twice
    let first = store
        .sync_snapshot_items(&conn, snapshot.id, observed.clone())
        .unwrap();
    let second = store
        .sync_snapshot_items(&conn, snapshot.id, observed)
        .unwrap();

    // Then: The first run creates both, the second does nothing
    assert_eq!(first.len(), 2);
    assert!(first.iter().all(|op| matches!(op, DeltaOp::Create { .. })));
    assert!(second.is_empty());

    let items = store.query_snapshot_items(&conn, snapshot.id).unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].item.config, json!({"x": 1}));
    assert_eq!(items[1].item.info, json!(null));
}

#[test]
fn test_sync_heals_duplicate_rows() {
    // Given: Three rows with the same key, inserted out of band
    let conn = setup();
    let store = HistoryStore::new();
    let snapshot = store.fetch_snapshot(&conn, at(0)).unwrap();
    for config in ["{\"v\":1}", "{\"v\":2}", "{\"v\":3}"] {
        conn.execute(
            "INSERT INTO snap_items (snapshot_id, dn, info, config) VALUES (?1, '/a', NULL, ?2)",
            params![snapshot.id, config],
        )
        .unwrap();
    }

    // When: The key is observed with the first row's value
    let ops = store
        .sync_snapshot_items(&conn, snapshot.id, vec![snap("/a", json!(null), json!({"v": 1}))])
        .unwrap();

    // Then: The lowest id survives and the others are deleted as duplicates
    assert_eq!(ops.len(), 2);
    assert!(ops.iter().all(|op| matches!(
        op,
        DeltaOp::Delete {
            reason: DeleteReason::Duplicate,
            ..
        }
    )));
    let items = store.query_snapshot_items(&conn, snapshot.id).unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, 1);
}

#[test]
fn test_sync_updates_in_place_and_removes_vanished() {
    // Given: Two persisted items
    let conn = setup();
    let store = HistoryStore::new();
    let snapshot = store.fetch_snapshot(&conn, at(0)).unwrap();
    store
        .sync_snapshot_items(
            &conn,
            snapshot.id,
            vec![
                snap("/keep", json!({"t": 1}), json!({"v": 1})),
                snap("/gone", json!({"t": 1}), json!({"v": 1})),
            ],
        )
        .unwrap();
    let keep_id = store
        .query_snapshot_items(&conn, snapshot.id)
        .unwrap()
        .into_iter()
        .find(|row| row.item.dn == "/keep")
        .map(|row| row.id)
        .unwrap();

    // When: /keep changes config and /gone disappears
    let ops = store
        .sync_snapshot_items(
            &conn,
            snapshot.id,
            vec![snap("/keep", json!({"t": 1}), json!({"v": 2}))],
        )
        .unwrap();

    // Then: /keep is updated under its original id and /gone is deleted
    assert_eq!(ops.len(), 2);
    let after = store.query_snapshot_items(&conn, snapshot.id).unwrap();
    assert_eq!(after.len(), 1);
    assert_eq!(after[0].id, keep_id);
    assert_eq!(after[0].item.config, json!({"v": 2}));
}

#[test]
fn test_sync_diff_items_flips_presence() {
    // Given: A diff with one present item
    let conn = setup();
    let store = HistoryStore::new();
    let snapshot = store.fetch_snapshot(&conn, at(0)).unwrap();
    let diff = store.fetch_diff(&conn, snapshot.id, at(10)).unwrap();
    store
        .sync_diff_items(
            &conn,
            diff.id,
            vec![DiffItem::new("/a", json!(null), true, json!({"v": 1}))],
        )
        .unwrap();

    // When: The same key is observed as absent
    let ops = store
        .sync_diff_items(
            &conn,
            diff.id,
            vec![DiffItem::new("/a", json!(null), false, json!(null))],
        )
        .unwrap();

    // Then: The row is updated, not replaced
    assert_eq!(ops.len(), 1);
    assert!(matches!(ops[0], DeltaOp::Update { target_id: 1, .. }));
    let items = store.query_diff_items(&conn, diff.id).unwrap();
    assert_eq!(items.len(), 1);
    assert!(!items[0].item.present);
}

#[test]
fn test_sync_is_scoped_to_parent() {
    // Given: Two snapshots each holding /a
    let conn = setup();
    let store = HistoryStore::new();
    let s1 = store.fetch_snapshot(&conn, at(1)).unwrap();
    let s2 = store.fetch_snapshot(&conn, at(2)).unwrap();
    let item = snap("/a", json!(null), json!(null));
    store.sync_snapshot_items(&conn, s1.id, vec![item.clone()]).unwrap();
    store.sync_snapshot_items(&conn, s2.id, vec![item]).unwrap();

    // When: The first snapshot is synced to empty
    store.sync_snapshot_items(&conn, s1.id, vec![]).unwrap();

    // Then: Only the first snapshot lost its item
    assert!(store.query_snapshot_items(&conn, s1.id).unwrap().is_empty());
    assert_eq!(store.query_snapshot_items(&conn, s2.id).unwrap().len(), 1);
}

#[test]
fn test_invalid_info_aborts_before_writing() {
    // Given: A snapshot with one persisted item
    let conn = setup();
    let store = HistoryStore::new();
    let snapshot = store.fetch_snapshot(&conn, at(0)).unwrap();
    store
        .sync_snapshot_items(&conn, snapshot.id, vec![snap("/a", json!(null), json!(null))])
        .unwrap();

    // When: An observation holds info nested too deep to key
    let mut deep = json!(1);
    for _ in 0..200 {
        deep = json!([deep]);
    }
    let err = store
        .sync_snapshot_items(&conn, snapshot.id, vec![snap("/b", deep, json!(null))])
        .unwrap_err();

    // Then: It is rejected and the existing row is untouched
    assert_eq!(err.kind(), ExErrorKind::InvalidInput);
    assert_eq!(store.query_snapshot_items(&conn, snapshot.id).unwrap().len(), 1);
}
