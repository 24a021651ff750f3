// Integration tests for schema migrations on an on-disk database

use cfghist_store::db;
use cfghist_store::migrations::apply_migrations;
use tempfile::TempDir;

fn table_names(conn: &rusqlite::Connection) -> Vec<String> {
    let mut stmt = conn
        .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
        .unwrap();
    stmt.query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<Vec<String>, _>>()
        .unwrap()
}

#[test]
fn test_migrations_create_history_and_rule_tables() {
    // Given: A fresh database file
    let dir = TempDir::new().unwrap();
    let mut conn = db::open(dir.path().join("history.db")).unwrap();

    // When: Migrations are applied
    apply_migrations(&mut conn).unwrap();

    // Then: Every table exists
    let tables = table_names(&conn);
    for expected in [
        "diff_items",
        "diffs",
        "marker_items",
        "markers",
        "rule_items",
        "rule_logs",
        "rule_statuses",
        "rules",
        "schema_version",
        "snap_items",
        "snapshots",
    ] {
        assert!(tables.iter().any(|t| t == expected), "missing {}", expected);
    }
}

#[test]
fn test_migrations_survive_reopen() {
    // Given: A migrated database that is closed
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("history.db");
    {
        let mut conn = db::open(&path).unwrap();
        apply_migrations(&mut conn).unwrap();
    }

    // When: It is reopened and migrated again
    let mut conn = db::open(&path).unwrap();
    apply_migrations(&mut conn).unwrap();

    // Then: Each migration is recorded once
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 2);
}
