//! Time-bucketed parent records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The tree as observed at one wall-clock second.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: i64,
    pub date: DateTime<Utc>,
}

/// Changes between a snapshot's baseline and a later observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diff {
    pub id: i64,
    pub snapshot_id: i64,
    pub date: DateTime<Utc>,
}
