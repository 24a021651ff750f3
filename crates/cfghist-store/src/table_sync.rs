//! Exact-row synchronization for simple tables
//!
//! A [`TableSynchronizer`] owns one table and a set of filter columns that
//! scope it (for example `rule_id`). Executing it replaces the scoped rows
//! with the target rows using the minimum deletes and inserts: rows already
//! matching a target row column-for-column are left in place.

use cfghist_core::delta::{plan_table_sync, Row, TableOp};
use cfghist_core::errors::{ExError, ExErrorKind};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection};
use serde_json::Value;

use crate::errors::{persistence, Result};
use crate::executor::{apply_all, Mutation};
use crate::values::{json_to_sql, sql_to_json};

/// What one synchronization changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableSyncSummary {
    pub inserted: usize,
    pub deleted: usize,
}

#[derive(Debug, Clone)]
pub struct TableSynchronizer {
    table: &'static str,
    filter_columns: Vec<&'static str>,
    columns: Vec<&'static str>,
    select_sql: String,
    insert_sql: String,
    delete_sql: String,
}

impl TableSynchronizer {
    /// Build a synchronizer for `table`.
    ///
    /// Identifiers are compile-time constants; they are quoted, not bound.
    pub fn new(
        table: &'static str,
        filter_columns: &[&'static str],
        columns: &[&'static str],
    ) -> Self {
        let quote = |name: &str| format!("\"{}\"", name);

        let select_cols = std::iter::once("id")
            .chain(columns.iter().copied())
            .map(quote)
            .collect::<Vec<_>>()
            .join(", ");
        let where_clause = if filter_columns.is_empty() {
            String::new()
        } else {
            let conditions = filter_columns
                .iter()
                .enumerate()
                .map(|(i, col)| format!("{} = ?{}", quote(col), i + 1))
                .collect::<Vec<_>>()
                .join(" AND ");
            format!(" WHERE {}", conditions)
        };
        let select_sql = format!(
            "SELECT {} FROM {}{} ORDER BY \"id\"",
            select_cols,
            quote(table),
            where_clause
        );

        let insert_cols: Vec<&str> = filter_columns
            .iter()
            .chain(columns.iter())
            .copied()
            .collect();
        let placeholders = (1..=insert_cols.len())
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(", ");
        let insert_sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote(table),
            insert_cols
                .iter()
                .map(|c| quote(c))
                .collect::<Vec<_>>()
                .join(", "),
            placeholders
        );

        let delete_sql = format!("DELETE FROM {} WHERE \"id\" = ?1", quote(table));

        Self {
            table,
            filter_columns: filter_columns.to_vec(),
            columns: columns.to_vec(),
            select_sql,
            insert_sql,
            delete_sql,
        }
    }

    /// Read the rows currently in scope as `(id, columns)`.
    ///
    /// # Errors
    ///
    /// `Persistence` if the query fails.
    pub fn query_current(&self, conn: &Connection, filter: &[Value]) -> Result<Vec<(i64, Row)>> {
        let width = self.columns.len();
        let mut stmt = conn
            .prepare(&self.select_sql)
            .map_err(persistence("table_sync_query"))?;
        let rows = stmt
            .query_map(params_from_iter(filter.iter().map(json_to_sql)), |row| {
                let id: i64 = row.get(0)?;
                let mut values = Vec::with_capacity(width);
                for idx in 1..=width {
                    values.push(sql_to_json(row.get_ref(idx)?));
                }
                Ok((id, values))
            })
            .map_err(persistence("table_sync_query"))?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(persistence("table_sync_query"))
    }

    /// Make the rows scoped by `filter` equal `rows`.
    ///
    /// `filter` values are bound to the filter columns and prepended to every
    /// inserted row. Runs on the caller's connection or transaction.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if `filter` or a row has the wrong width, `Persistence`
    /// if a statement fails.
    pub fn execute(
        &self,
        conn: &Connection,
        filter: &[Value],
        rows: Vec<Row>,
    ) -> Result<TableSyncSummary> {
        if filter.len() != self.filter_columns.len() {
            return Err(self.width_error("filter", self.filter_columns.len(), filter.len()));
        }
        if let Some(row) = rows.iter().find(|row| row.len() != self.columns.len()) {
            return Err(self.width_error("row", self.columns.len(), row.len()));
        }

        let current = self.query_current(conn, filter)?;
        let ops = plan_table_sync(current, rows)?;

        let filter_params: Vec<SqlValue> = filter.iter().map(json_to_sql).collect();
        let mut summary = TableSyncSummary::default();
        let mutations: Vec<Mutation> = ops
            .iter()
            .map(|op| match op {
                TableOp::Delete { id } => {
                    summary.deleted += 1;
                    Mutation::new(self.delete_sql.clone(), vec![SqlValue::Integer(*id)])
                }
                TableOp::Insert { row } => {
                    summary.inserted += 1;
                    let params = filter_params
                        .iter()
                        .cloned()
                        .chain(row.iter().map(json_to_sql))
                        .collect();
                    Mutation::new(self.insert_sql.clone(), params)
                }
            })
            .collect();

        apply_all(conn, &mutations)?;

        tracing::debug!(
            table = self.table,
            inserted = summary.inserted,
            deleted = summary.deleted,
            "synchronized table"
        );
        Ok(summary)
    }

    fn width_error(&self, what: &str, expected: usize, actual: usize) -> ExError {
        ExError::new(ExErrorKind::InvalidInput)
            .with_op("table_sync")
            .with_entity_id(self.table)
            .with_message(format!(
                "{} has {} values, expected {}",
                what, actual, expected
            ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_sql() {
        let sync = TableSynchronizer::new("marker_items", &["marker_id"], &["dn"]);
        assert_eq!(
            sync.select_sql,
            "SELECT \"id\", \"dn\" FROM \"marker_items\" WHERE \"marker_id\" = ?1 ORDER BY \"id\""
        );
        assert_eq!(
            sync.insert_sql,
            "INSERT INTO \"marker_items\" (\"marker_id\", \"dn\") VALUES (?1, ?2)"
        );
        assert_eq!(sync.delete_sql, "DELETE FROM \"marker_items\" WHERE \"id\" = ?1");
    }

    #[test]
    fn test_unfiltered_select_has_no_where() {
        let sync = TableSynchronizer::new("rule_logs", &[], &["rule_id", "kind", "msg"]);
        assert!(!sync.select_sql.contains("WHERE"));
    }
}
