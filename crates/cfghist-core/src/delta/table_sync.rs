//! Exact-row planning for simple synchronized tables.
//!
//! Tables such as rule statuses or marker items have no semantic key: a row
//! either matches a target row column-for-column or it does not. Matching is
//! a multiset match, so two identical target rows need two persisted rows.
//! There is no update and no duplicate healing.

use serde_json::Value;
use std::collections::{BTreeMap, VecDeque};

use crate::delta::key::canonical_json;
use crate::errors::Result;

/// Column values in declared column order.
pub type Row = Vec<Value>;

#[derive(Debug, Clone, PartialEq)]
pub enum TableOp {
    Insert { row: Row },
    Delete { id: i64 },
}

/// Bring a value into the shape SQLite hands back when the row is read:
/// booleans become `0`/`1`, arrays and objects become JSON text.
pub fn normalize_value(value: Value) -> Value {
    match value {
        Value::Bool(b) => Value::from(i64::from(b)),
        Value::Array(_) | Value::Object(_) => Value::String(value.to_string()),
        other => other,
    }
}

/// Plan the deletes and inserts that make `current` equal `target`.
///
/// Deletes come first, in ascending id order, followed by inserts in target
/// order. Target rows are normalized with [`normalize_value`] before matching.
///
/// # Errors
///
/// Propagates canonical serialization failures.
pub fn plan_table_sync(current: Vec<(i64, Row)>, target: Vec<Row>) -> Result<Vec<TableOp>> {
    let mut available: BTreeMap<String, VecDeque<i64>> = BTreeMap::new();
    let mut current = current;
    current.sort_by_key(|(id, _)| *id);
    for (id, row) in current {
        let key = canonical_json(&Value::Array(row))?;
        available.entry(key).or_default().push_back(id);
    }

    let mut inserts = Vec::new();
    for row in target {
        let row: Row = row.into_iter().map(normalize_value).collect();
        let key = canonical_json(&Value::Array(row.clone()))?;
        let matched = available.get_mut(&key).and_then(VecDeque::pop_front);
        if matched.is_none() {
            inserts.push(TableOp::Insert { row });
        }
    }

    let mut stale: Vec<i64> = available.into_values().flatten().collect();
    stale.sort_unstable();

    let mut ops: Vec<TableOp> = stale.into_iter().map(|id| TableOp::Delete { id }).collect();
    ops.extend(inserts);
    Ok(ops)
}
