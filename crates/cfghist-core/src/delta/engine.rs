//! Delta computation.
//!
//! [`produce_delta`] indexes both sides, classifies every key with
//! [`reconcile`], and checks the result with [`verify_delta`] before
//! handing it to storage.

use std::collections::{BTreeMap, BTreeSet};

use crate::delta::index::{index_current, index_observed, CurrentIndex, ObservedIndex};
use crate::delta::model::{DeleteReason, DeltaOp};
use crate::errors::{HistError, Result};
use crate::model::{DeltaItem, Persisted};

/// Compute the operations that reconcile `current` with `observed`.
///
/// # Errors
///
/// - `NonCanonicalInfo` / `NestingTooDeep`: an item's key cannot be derived
/// - `DeltaInvariant`: the computed operations fail verification
pub fn produce_delta<T: DeltaItem>(
    observed: Vec<T>,
    current: Vec<Persisted<T>>,
) -> Result<Vec<DeltaOp<T>>> {
    let observed = index_observed(observed)?;
    let current = index_current(current)?;

    let ops = reconcile(&observed, &current);
    verify_delta(&observed, &current, &ops)?;

    Ok(ops)
}

/// Classify every key into create, update, or delete operations.
///
/// For a key present on both sides the lowest persisted id is the
/// representative: it is updated when its value differs and left alone
/// otherwise. Every other row under that key is deleted. Keys that vanished
/// from the observation lose all their rows.
pub fn reconcile<T: DeltaItem>(
    observed: &ObservedIndex<T>,
    current: &CurrentIndex<T>,
) -> Vec<DeltaOp<T>> {
    let mut ops = Vec::new();

    for (key, item) in observed {
        let mut rows = current.get(key).into_iter().flatten();

        match rows.next() {
            None => ops.push(DeltaOp::Create { item: item.clone() }),
            Some((id, representative)) => {
                if !item.same_value(representative) {
                    ops.push(DeltaOp::Update {
                        target_id: *id,
                        item: item.clone(),
                        current: representative.clone(),
                    });
                }
            }
        }

        for (id, _) in rows {
            ops.push(DeltaOp::Delete {
                target_id: *id,
                reason: DeleteReason::Duplicate,
            });
        }
    }

    for (key, rows) in current {
        if observed.contains_key(key) {
            continue;
        }
        for id in rows.keys() {
            ops.push(DeltaOp::Delete {
                target_id: *id,
                reason: DeleteReason::Vanished,
            });
        }
    }

    ops
}

/// Check that `ops` accounts for its inputs exactly.
///
/// - every persisted row is touched at most once, and only rows that exist
/// - updates target a representative of an observed key
/// - duplicate deletes never target a representative
/// - vanished deletes only target keys missing from the observation
/// - creates match the number of observed keys with no persisted row
///
/// # Errors
///
/// `DeltaInvariant` describing the first violation found.
pub fn verify_delta<T: DeltaItem>(
    observed: &ObservedIndex<T>,
    current: &CurrentIndex<T>,
    ops: &[DeltaOp<T>],
) -> Result<()> {
    let mut row_keys: BTreeMap<i64, (&str, bool)> = BTreeMap::new();
    for (key, rows) in current {
        for (position, id) in rows.keys().enumerate() {
            row_keys.insert(*id, (key.as_str(), position == 0));
        }
    }

    let mut touched = BTreeSet::new();
    let mut creates = 0usize;

    for op in ops {
        let Some(target_id) = op.target_id() else {
            creates += 1;
            continue;
        };

        if !touched.insert(target_id) {
            return Err(invariant(format!("row {} touched twice", target_id)));
        }
        let Some((key, is_representative)) = row_keys.get(&target_id).copied() else {
            return Err(invariant(format!("row {} is not persisted", target_id)));
        };
        let observed_key = observed.contains_key(key);

        match op {
            DeltaOp::Update { .. } if !(observed_key && is_representative) => {
                return Err(invariant(format!(
                    "update of row {} is not against a representative",
                    target_id
                )));
            }
            DeltaOp::Delete {
                reason: DeleteReason::Duplicate,
                ..
            } if !observed_key || is_representative => {
                return Err(invariant(format!(
                    "duplicate delete of row {} would drop the representative",
                    target_id
                )));
            }
            DeltaOp::Delete {
                reason: DeleteReason::Vanished,
                ..
            } if observed_key => {
                return Err(invariant(format!(
                    "row {} deleted as vanished but its key is observed",
                    target_id
                )));
            }
            _ => {}
        }
    }

    let expected_creates = observed
        .keys()
        .filter(|key| !current.contains_key(*key))
        .count();
    if creates != expected_creates {
        return Err(invariant(format!(
            "{} creates for {} unmatched observed keys",
            creates, expected_creates
        )));
    }

    Ok(())
}

fn invariant(reason: String) -> HistError {
    HistError::DeltaInvariant { reason }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delta::key::derive_key;
    use crate::model::SnapshotItem;
    use serde_json::json;

    fn snap(dn: &str, k: i64, c: i64) -> SnapshotItem {
        SnapshotItem::new(dn, json!({"k": k}), json!({"c": c}))
    }

    #[test]
    fn test_verify_rejects_double_touch() {
        let observed = index_observed(vec![snap("/a", 1, 1)]).unwrap();
        let current = index_current(vec![Persisted::new(7, snap("/a", 1, 2))]).unwrap();
        let ops = vec![
            DeltaOp::Update {
                target_id: 7,
                item: snap("/a", 1, 1),
                current: snap("/a", 1, 2),
            },
            DeltaOp::Delete {
                target_id: 7,
                reason: DeleteReason::Duplicate,
            },
        ];
        let err = verify_delta(&observed, &current, &ops).unwrap_err();
        assert!(matches!(err, HistError::DeltaInvariant { .. }));
    }

    #[test]
    fn test_verify_rejects_unknown_row() {
        let observed = index_observed(Vec::<SnapshotItem>::new()).unwrap();
        let current = index_current(Vec::<Persisted<SnapshotItem>>::new()).unwrap();
        let ops: Vec<DeltaOp<SnapshotItem>> = vec![DeltaOp::Delete {
            target_id: 99,
            reason: DeleteReason::Vanished,
        }];
        assert!(verify_delta(&observed, &current, &ops).is_err());
    }

    #[test]
    fn test_verify_rejects_missing_create() {
        let observed = index_observed(vec![snap("/new", 1, 1)]).unwrap();
        let current = index_current(Vec::<Persisted<SnapshotItem>>::new()).unwrap();
        assert!(verify_delta(&observed, &current, &[]).is_err());
    }

    #[test]
    fn test_verify_rejects_vanished_delete_of_observed_key() {
        let observed = index_observed(vec![snap("/a", 1, 1)]).unwrap();
        let current = index_current(vec![
            Persisted::new(1, snap("/a", 1, 1)),
            Persisted::new(2, snap("/a", 1, 1)),
        ])
        .unwrap();
        let ops: Vec<DeltaOp<SnapshotItem>> = vec![DeltaOp::Delete {
            target_id: 2,
            reason: DeleteReason::Vanished,
        }];
        assert!(verify_delta(&observed, &current, &ops).is_err());
    }

    #[test]
    fn test_reconcile_output_is_verified() {
        let observed = index_observed(vec![snap("/a", 1, 1), snap("/b", 1, 1)]).unwrap();
        let current = index_current(vec![
            Persisted::new(3, snap("/a", 1, 5)),
            Persisted::new(4, snap("/a", 1, 1)),
            Persisted::new(8, snap("/z", 0, 0)),
        ])
        .unwrap();

        let ops = reconcile(&observed, &current);
        verify_delta(&observed, &current, &ops).unwrap();

        let a_key = derive_key("/a", &json!({"k": 1})).unwrap();
        assert!(current.contains_key(&a_key));
        assert_eq!(ops.len(), 4);
    }
}
