// Per-operation trace events emitted by item sync. Kept in its own binary so
// the process-wide capture sees no other test's events.

use cfghist_core::logging_facility::test_capture::init_test_capture;
use cfghist_core::model::SnapshotItem;
use cfghist_store::migrations::apply_migrations;
use cfghist_store::HistoryStore;
use chrono::{TimeZone, Utc};
use serde_json::json;

#[test]
fn test_sync_logs_one_event_per_applied_op() {
    let capture = init_test_capture();

    // Given: A snapshot holding /a and /b
    let mut conn = cfghist_store::db::open_in_memory().unwrap();
    apply_migrations(&mut conn).unwrap();
    let store = HistoryStore::new();
    let snapshot = store
        .fetch_snapshot(&conn, Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap())
        .unwrap();
    store
        .sync_snapshot_items(
            &conn,
            snapshot.id,
            vec![
                SnapshotItem::new("/a", json!(null), json!({"v": 1})),
                SnapshotItem::new("/b", json!(null), json!({"v": 1})),
            ],
        )
        .unwrap();
    let b_id = store
        .query_snapshot_items(&conn, snapshot.id)
        .unwrap()
        .into_iter()
        .find(|row| row.item.dn == "/b")
        .map(|row| row.id)
        .unwrap();

    // When: /b vanishes
    store
        .sync_snapshot_items(
            &conn,
            snapshot.id,
            vec![SnapshotItem::new("/a", json!(null), json!({"v": 1}))],
        )
        .unwrap();

    // Then: Two creates were logged without a target, then one delete of /b
    let ops: Vec<_> = capture
        .with_field("message", "item op")
        .into_iter()
        .map(|e| {
            (
                e.field("action").unwrap_or_default().to_string(),
                e.field("target_id").unwrap_or_default().to_string(),
            )
        })
        .collect();
    assert_eq!(
        ops,
        vec![
            ("C".to_string(), "None".to_string()),
            ("C".to_string(), "None".to_string()),
            ("D".to_string(), format!("Some({})", b_id)),
        ]
    );
}
