//! Snapshot and diff items.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An item the delta engine can reconcile.
///
/// `dn` and `info` form the semantic identity; [`same_value`](Self::same_value)
/// compares every non-identity field as well, so an item whose key matches
/// but whose payload differs is an update rather than a create.
pub trait DeltaItem: Clone + std::fmt::Debug {
    fn dn(&self) -> &str;

    fn info(&self) -> &Value;

    /// Value-for-value comparison over all fields except the persisted id.
    fn same_value(&self, other: &Self) -> bool;
}

/// One node of the observed tree attached to a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotItem {
    pub dn: String,
    #[serde(default)]
    pub info: Value,
    #[serde(default)]
    pub config: Value,
}

impl SnapshotItem {
    pub fn new(dn: impl Into<String>, info: Value, config: Value) -> Self {
        Self {
            dn: dn.into(),
            info,
            config,
        }
    }
}

impl DeltaItem for SnapshotItem {
    fn dn(&self) -> &str {
        &self.dn
    }

    fn info(&self) -> &Value {
        &self.info
    }

    fn same_value(&self, other: &Self) -> bool {
        self.dn == other.dn
            && payload_eq(&self.info, &other.info)
            && payload_eq(&self.config, &other.config)
    }
}

/// One node change attached to a diff.
///
/// `present` records whether the node existed at the diff's timestamp. It is
/// payload, not identity: flipping it updates the row in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffItem {
    pub dn: String,
    #[serde(default)]
    pub info: Value,
    #[serde(default = "default_present")]
    pub present: bool,
    #[serde(default)]
    pub config: Value,
}

fn default_present() -> bool {
    true
}

impl DiffItem {
    pub fn new(dn: impl Into<String>, info: Value, present: bool, config: Value) -> Self {
        Self {
            dn: dn.into(),
            info,
            present,
            config,
        }
    }
}

impl DeltaItem for DiffItem {
    fn dn(&self) -> &str {
        &self.dn
    }

    fn info(&self) -> &Value {
        &self.info
    }

    fn same_value(&self, other: &Self) -> bool {
        self.dn == other.dn
            && self.present == other.present
            && payload_eq(&self.info, &other.info)
            && payload_eq(&self.config, &other.config)
    }
}

/// An item as read back from storage, together with its row id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Persisted<T> {
    pub id: i64,
    #[serde(flatten)]
    pub item: T,
}

impl<T> Persisted<T> {
    pub fn new(id: i64, item: T) -> Self {
        Self { id, item }
    }
}

/// Structural equality for opaque JSON payloads.
///
/// An object member holding `null` is treated the same as an absent member,
/// so `{"a": 1, "b": null}` equals `{"a": 1}`. Numbers compare by their JSON
/// representation (`1` and `1.0` differ), matching how keys are derived.
pub fn payload_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Object(left), Value::Object(right)) => {
            let left_len = left.values().filter(|v| !v.is_null()).count();
            let right_len = right.values().filter(|v| !v.is_null()).count();
            left_len == right_len
                && left
                    .iter()
                    .filter(|(_, v)| !v.is_null())
                    .all(|(k, v)| right.get(k).is_some_and(|w| payload_eq(v, w)))
        }
        (Value::Array(left), Value::Array(right)) => {
            left.len() == right.len() && left.iter().zip(right).all(|(x, y)| payload_eq(x, y))
        }
        _ => a == b,
    }
}
