//! Delta operation types.

use serde::{Deserialize, Serialize};

/// Why a persisted row is being removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteReason {
    /// Another row with the same key was kept as the representative
    Duplicate,
    /// The key no longer appears in the observation
    Vanished,
}

/// One reconciling operation against a parent's item set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum DeltaOp<T> {
    /// Insert a row for an observed item whose key is not persisted
    Create { item: T },
    /// Rewrite the representative row for a key whose value changed
    Update {
        target_id: i64,
        item: T,
        current: T,
    },
    /// Remove a persisted row
    Delete { target_id: i64, reason: DeleteReason },
}

impl<T> DeltaOp<T> {
    /// Persisted row this operation touches, if any
    pub fn target_id(&self) -> Option<i64> {
        match self {
            DeltaOp::Create { .. } => None,
            DeltaOp::Update { target_id, .. } | DeltaOp::Delete { target_id, .. } => {
                Some(*target_id)
            }
        }
    }

    /// Single-letter action code for per-op trace events
    pub fn action_code(&self) -> &'static str {
        match self {
            DeltaOp::Create { .. } => "C",
            DeltaOp::Update { .. } => "U",
            DeltaOp::Delete { .. } => "D",
        }
    }
}

/// Per-action counts of a delta.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaSummary {
    pub creates: usize,
    pub updates: usize,
    pub deletes: usize,
}

impl DeltaSummary {
    pub fn from_ops<T>(ops: &[DeltaOp<T>]) -> Self {
        ops.iter().fold(Self::default(), |mut acc, op| {
            match op {
                DeltaOp::Create { .. } => acc.creates += 1,
                DeltaOp::Update { .. } => acc.updates += 1,
                DeltaOp::Delete { .. } => acc.deletes += 1,
            }
            acc
        })
    }

    pub fn total(&self) -> usize {
        self.creates + self.updates + self.deletes
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}
