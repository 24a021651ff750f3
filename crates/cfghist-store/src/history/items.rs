//! Current-item reads and delta application.

use cfghist_core::delta::{produce_delta, DeltaOp, DeltaSummary};
use cfghist_core::model::{DiffItem, Persisted, SnapshotItem};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, Connection};

use crate::errors::{persistence, Result};
use crate::executor::{apply_all, Mutation};
use crate::history::{HistoryStore, ItemRecord};

impl HistoryStore {
    /// Read every persisted item under `parent_id`, in ascending id order.
    ///
    /// # Errors
    ///
    /// `Persistence` if the query fails or a stored payload is not valid JSON.
    pub fn query_items<T: ItemRecord>(
        &self,
        conn: &Connection,
        parent_id: i64,
    ) -> Result<Vec<Persisted<T>>> {
        let sql = self.statements().items(T::KIND).select;
        let mut stmt = conn.prepare_cached(sql).map_err(persistence("query_items"))?;
        let rows = stmt
            .query_map(params![parent_id], T::read_row)
            .map_err(persistence("query_items"))?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(persistence("query_items"))
    }

    pub fn query_snapshot_items(
        &self,
        conn: &Connection,
        snapshot_id: i64,
    ) -> Result<Vec<Persisted<SnapshotItem>>> {
        self.query_items(conn, snapshot_id)
    }

    pub fn query_diff_items(
        &self,
        conn: &Connection,
        diff_id: i64,
    ) -> Result<Vec<Persisted<DiffItem>>> {
        self.query_items(conn, diff_id)
    }

    /// Compute the operations that bring `parent_id`'s items in line with
    /// `observed`, without writing anything.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for an item whose key cannot be derived,
    /// `InvariantViolation` if the delta fails verification, `Persistence`
    /// if current items cannot be read.
    pub fn plan_items<T: ItemRecord>(
        &self,
        conn: &Connection,
        parent_id: i64,
        observed: Vec<T>,
    ) -> Result<Vec<DeltaOp<T>>> {
        let current = self.query_items::<T>(conn, parent_id)?;
        tracing::debug!(
            kind = T::KIND.as_str(),
            parent_id,
            observed = observed.len(),
            current = current.len(),
            "computing item delta"
        );
        Ok(produce_delta(observed, current)?)
    }

    /// Translate delta operations into mutations for `parent_id`.
    pub fn to_mutations<T: ItemRecord>(&self, parent_id: i64, ops: &[DeltaOp<T>]) -> Vec<Mutation> {
        let statements = self.statements().items(T::KIND);
        ops.iter()
            .map(|op| match op {
                DeltaOp::Create { item } => {
                    Mutation::new(statements.insert, item.insert_params(parent_id))
                }
                DeltaOp::Update {
                    target_id, item, ..
                } => Mutation::new(statements.update, item.update_params(*target_id)),
                DeltaOp::Delete { target_id, .. } => {
                    Mutation::new(statements.delete, vec![SqlValue::Integer(*target_id)])
                }
            })
            .collect()
    }

    /// Reconcile `parent_id`'s items with `observed` and apply the result.
    ///
    /// Returns the applied operations. Pass a transaction to keep the sync
    /// atomic with the parent resolution that produced `parent_id`.
    ///
    /// # Errors
    ///
    /// See [`plan_items`](Self::plan_items); additionally `Persistence` if a
    /// mutation fails.
    pub fn sync_items<T: ItemRecord>(
        &self,
        conn: &Connection,
        parent_id: i64,
        observed: Vec<T>,
    ) -> Result<Vec<DeltaOp<T>>> {
        let ops = self.plan_items(conn, parent_id, observed)?;
        let mutations = self.to_mutations(parent_id, &ops);
        let affected = apply_all(conn, &mutations)?;

        for op in &ops {
            tracing::trace!(
                kind = T::KIND.as_str(),
                parent_id,
                action = op.action_code(),
                target_id = ?op.target_id(),
                "item op"
            );
        }
        let summary = DeltaSummary::from_ops(&ops);
        tracing::debug!(
            kind = T::KIND.as_str(),
            parent_id,
            creates = summary.creates,
            updates = summary.updates,
            deletes = summary.deletes,
            affected,
            "applied item delta"
        );
        Ok(ops)
    }

    pub fn sync_snapshot_items(
        &self,
        conn: &Connection,
        snapshot_id: i64,
        items: Vec<SnapshotItem>,
    ) -> Result<Vec<DeltaOp<SnapshotItem>>> {
        self.sync_items(conn, snapshot_id, items)
    }

    pub fn sync_diff_items(
        &self,
        conn: &Connection,
        diff_id: i64,
        items: Vec<DiffItem>,
    ) -> Result<Vec<DeltaOp<DiffItem>>> {
        self.sync_items(conn, diff_id, items)
    }
}
