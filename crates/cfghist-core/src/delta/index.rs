//! Observed and current-state indexing.

use std::collections::BTreeMap;

use crate::delta::key::derive_key;
use crate::errors::Result;
use crate::model::{DeltaItem, Persisted};

/// Observed items by key. At most one item per key.
pub type ObservedIndex<T> = BTreeMap<String, T>;

/// Persisted items by key, then by row id.
///
/// The inner map keeps every row sharing a key. Iteration yields ids in
/// ascending order, which makes the lowest id the representative.
pub type CurrentIndex<T> = BTreeMap<String, BTreeMap<i64, T>>;

/// Index the observed collection. A repeated key keeps its last item.
///
/// # Errors
///
/// Propagates key derivation failures.
pub fn index_observed<T: DeltaItem>(observed: Vec<T>) -> Result<ObservedIndex<T>> {
    let mut index = BTreeMap::new();
    for item in observed {
        let key = derive_key(item.dn(), item.info())?;
        if index.insert(key, item).is_some() {
            tracing::debug!("observed key repeated, keeping last occurrence");
        }
    }
    Ok(index)
}

/// Index the persisted collection without dropping any row.
///
/// # Errors
///
/// Propagates key derivation failures.
pub fn index_current<T: DeltaItem>(current: Vec<Persisted<T>>) -> Result<CurrentIndex<T>> {
    let mut index: CurrentIndex<T> = BTreeMap::new();
    for Persisted { id, item } in current {
        let key = derive_key(item.dn(), item.info())?;
        index.entry(key).or_default().insert(id, item);
    }
    Ok(index)
}
