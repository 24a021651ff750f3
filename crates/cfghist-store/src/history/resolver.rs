//! Fetch-or-create for parent rows.

use cfghist_core::model::{format_db_date, parse_db_date, truncate_to_second, Diff, Snapshot};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::errors::{persistence, Result};
use crate::history::HistoryStore;
use crate::statements::ItemKind;

impl HistoryStore {
    /// Resolve the snapshot for `date`, truncated to the second.
    ///
    /// Returns the most recently inserted snapshot with that date, or inserts
    /// one. Two callers racing on the same second in separate transactions
    /// can both insert; nothing in the schema prevents it.
    ///
    /// # Errors
    ///
    /// `Persistence` on query or insert failure, `Serialization` if a stored
    /// date cannot be parsed.
    pub fn fetch_snapshot(&self, conn: &Connection, date: DateTime<Utc>) -> Result<Snapshot> {
        let statements = self.statements().parent(ItemKind::Snapshot);
        let date_text = format_db_date(date);

        let found = conn
            .query_row(statements.find, params![date_text], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
            })
            .optional()
            .map_err(persistence("fetch_snapshot"))?;

        if let Some((id, stored)) = found {
            tracing::debug!(snapshot_id = id, date = %date_text, "found snapshot");
            return Ok(Snapshot {
                id,
                date: parse_db_date(&stored)?,
            });
        }

        conn.execute(statements.insert, params![date_text])
            .map_err(persistence("fetch_snapshot"))?;
        let id = conn.last_insert_rowid();
        tracing::debug!(snapshot_id = id, date = %date_text, "created snapshot");

        Ok(Snapshot {
            id,
            date: truncate_to_second(date),
        })
    }

    /// Resolve the diff for `(snapshot_id, date)`, truncated to the second.
    ///
    /// # Errors
    ///
    /// `Persistence` on query or insert failure (including an unknown
    /// `snapshot_id`), `Serialization` if a stored date cannot be parsed.
    pub fn fetch_diff(
        &self,
        conn: &Connection,
        snapshot_id: i64,
        date: DateTime<Utc>,
    ) -> Result<Diff> {
        let statements = self.statements().parent(ItemKind::Diff);
        let date_text = format_db_date(date);

        let found = conn
            .query_row(statements.find, params![snapshot_id, date_text], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })
            .optional()
            .map_err(persistence("fetch_diff"))?;

        if let Some((id, snapshot_id, stored)) = found {
            tracing::debug!(diff_id = id, snapshot_id, date = %date_text, "found diff");
            return Ok(Diff {
                id,
                snapshot_id,
                date: parse_db_date(&stored)?,
            });
        }

        conn.execute(statements.insert, params![snapshot_id, date_text])
            .map_err(|e| {
                persistence("fetch_diff")(e).with_entity_id(snapshot_id.to_string())
            })?;
        let id = conn.last_insert_rowid();
        tracing::debug!(diff_id = id, snapshot_id, date = %date_text, "created diff");

        Ok(Diff {
            id,
            snapshot_id,
            date: truncate_to_second(date),
        })
    }
}
