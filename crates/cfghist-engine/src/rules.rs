//! Rule processing
//!
//! Evaluates every enabled rule against an observation, folds the outcomes
//! into an [`ExecutionContext`], and synchronizes the rule result tables to
//! match it.

#![allow(clippy::result_large_err)]

use cfghist_core::model::ObservedTree;
use cfghist_core::rules::{ExecutionContext, RuleEvaluator};
use cfghist_core::{log_op_end, log_op_error, log_op_start};
use cfghist_store::errors::{from_rusqlite, Result};
use cfghist_store::rules::{query_enabled_rules, query_marker_ids, RuleRows, RuleTables};
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;

/// Totals for one rule run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RuleRunReport {
    pub rules_processed: usize,
    pub error_count: u32,
    pub item_count: u32,
    pub marker_items: usize,
}

#[derive(Debug, Clone, Default)]
pub struct RuleProcessor {
    tables: RuleTables,
}

impl RuleProcessor {
    pub fn new() -> Self {
        Self {
            tables: RuleTables::new(),
        }
    }

    /// Evaluate enabled rules and persist their results in one transaction.
    ///
    /// # Errors
    ///
    /// `Persistence` if rules cannot be read or results cannot be written;
    /// nothing is committed in that case.
    pub fn execute(
        &self,
        conn: &mut Connection,
        tree: &mut ObservedTree,
        evaluator: &dyn RuleEvaluator,
    ) -> Result<RuleRunReport> {
        log_op_start!("rule_processing", item_count = tree.count());
        let start = std::time::Instant::now();

        let result = self
            .process_in_transaction(conn, tree, evaluator)
            .map_err(|e| {
                log_op_error!(
                    "rule_processing",
                    e.clone(),
                    duration_ms = start.elapsed().as_millis() as u64
                );
                e
            })?;

        log_op_end!(
            "rule_processing",
            duration_ms = start.elapsed().as_millis() as u64,
            rules = result.rules_processed,
            errors = result.error_count
        );
        Ok(result)
    }

    fn process_in_transaction(
        &self,
        conn: &mut Connection,
        tree: &mut ObservedTree,
        evaluator: &dyn RuleEvaluator,
    ) -> Result<RuleRunReport> {
        let tx = conn.transaction().map_err(from_rusqlite)?;
        let report = self.process(&tx, tree, evaluator, Utc::now())?;
        tx.commit().map_err(from_rusqlite)?;
        Ok(report)
    }

    /// Evaluate enabled rules and synchronize results on `conn`.
    ///
    /// Does not open a transaction; callers combine this with other work in
    /// theirs. Status rows are stamped with `now`.
    ///
    /// # Errors
    ///
    /// `Persistence` if rules or markers cannot be read or results cannot
    /// be written.
    pub fn process(
        &self,
        conn: &Connection,
        tree: &mut ObservedTree,
        evaluator: &dyn RuleEvaluator,
        now: DateTime<Utc>,
    ) -> Result<RuleRunReport> {
        let rules = query_enabled_rules(conn)?;
        let marker_ids = query_marker_ids(conn)?;

        let mut context = ExecutionContext::new();
        for rule in &rules {
            tracing::debug!(rule = %rule.name, "evaluating rule");
            let outcome = evaluator.evaluate(tree, rule);
            context.accept_outcome(tree, rule, outcome, now, |name| {
                marker_ids.get(name).copied()
            });
        }

        let report = RuleRunReport {
            rules_processed: context.rule_statuses.len(),
            error_count: context.rule_statuses.values().map(|s| s.error_count).sum(),
            item_count: context.rule_statuses.values().map(|s| s.item_count).sum(),
            marker_items: context.marker_items.len(),
        };

        let rows = RuleRows {
            statuses: context.status_rows(),
            items: context.item_rows(),
            logs: context.log_rows(),
            marker_items: context.marker_item_rows(),
        };
        let sync = self.tables.sync(conn, rows)?;
        tracing::debug!(
            statuses_inserted = sync.statuses.inserted,
            items_inserted = sync.items.inserted,
            items_deleted = sync.items.deleted,
            "synchronized rule tables"
        );

        Ok(report)
    }
}
