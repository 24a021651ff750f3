//! Row mapping for snapshot and diff items.

use cfghist_core::model::{DeltaItem, DiffItem, Persisted, SnapshotItem};
use rusqlite::types::{Type, Value as SqlValue};
use rusqlite::Row;
use serde_json::Value;

use crate::statements::ItemKind;
use crate::values::{payload_from_sql, payload_to_sql};

/// An item kind the history store can read and write.
///
/// Column order follows the kind's [`ItemStatements`](crate::statements::ItemStatements).
pub trait ItemRecord: DeltaItem {
    const KIND: ItemKind;

    /// Decode one row produced by the kind's `select` statement.
    fn read_row(row: &Row<'_>) -> rusqlite::Result<Persisted<Self>>;

    /// Parameters for `insert`: parent id first.
    fn insert_params(&self, parent_id: i64) -> Vec<SqlValue>;

    /// Parameters for `update`: row id last.
    fn update_params(&self, target_id: i64) -> Vec<SqlValue>;
}

fn payload_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Value> {
    let text: Option<String> = row.get(idx)?;
    payload_from_sql(text.as_deref())
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

impl ItemRecord for SnapshotItem {
    const KIND: ItemKind = ItemKind::Snapshot;

    fn read_row(row: &Row<'_>) -> rusqlite::Result<Persisted<Self>> {
        Ok(Persisted::new(
            row.get(0)?,
            SnapshotItem::new(
                row.get::<_, String>(1)?,
                payload_column(row, 2)?,
                payload_column(row, 3)?,
            ),
        ))
    }

    fn insert_params(&self, parent_id: i64) -> Vec<SqlValue> {
        vec![
            SqlValue::Integer(parent_id),
            SqlValue::Text(self.dn.clone()),
            payload_to_sql(&self.info),
            payload_to_sql(&self.config),
        ]
    }

    fn update_params(&self, target_id: i64) -> Vec<SqlValue> {
        vec![
            SqlValue::Text(self.dn.clone()),
            payload_to_sql(&self.info),
            payload_to_sql(&self.config),
            SqlValue::Integer(target_id),
        ]
    }
}

impl ItemRecord for DiffItem {
    const KIND: ItemKind = ItemKind::Diff;

    fn read_row(row: &Row<'_>) -> rusqlite::Result<Persisted<Self>> {
        Ok(Persisted::new(
            row.get(0)?,
            DiffItem::new(
                row.get::<_, String>(1)?,
                payload_column(row, 2)?,
                row.get::<_, bool>(3)?,
                payload_column(row, 4)?,
            ),
        ))
    }

    fn insert_params(&self, parent_id: i64) -> Vec<SqlValue> {
        vec![
            SqlValue::Integer(parent_id),
            SqlValue::Text(self.dn.clone()),
            payload_to_sql(&self.info),
            SqlValue::Integer(i64::from(self.present)),
            payload_to_sql(&self.config),
        ]
    }

    fn update_params(&self, target_id: i64) -> Vec<SqlValue> {
        vec![
            SqlValue::Text(self.dn.clone()),
            payload_to_sql(&self.info),
            SqlValue::Integer(i64::from(self.present)),
            payload_to_sql(&self.config),
            SqlValue::Integer(target_id),
        ]
    }
}
