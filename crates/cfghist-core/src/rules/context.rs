//! Accumulation of rule results across one processing run.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::model::{Alert, AlertSeverity, AlertSource, ObservedTree};
use crate::rules::model::{
    MarkerItem, Rule, RuleItem, RuleItemResult, RuleLog, RuleOutcome, RuleStatus,
};

/// Rows collected while processing every enabled rule.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionContext {
    pub rule_statuses: BTreeMap<i64, RuleStatus>,
    pub rule_items: Vec<RuleItem>,
    pub rule_logs: Vec<RuleLog>,
    pub marker_items: Vec<MarkerItem>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one rule's outcome into the context and annotate `tree`.
    ///
    /// `marker_id` resolves a marker name to its stored id; markers it does
    /// not know are still raised on the tree but produce no marker item row.
    pub fn accept_outcome<F>(
        &mut self,
        tree: &mut ObservedTree,
        rule: &Rule,
        outcome: RuleOutcome,
        now: DateTime<Utc>,
        marker_id: F,
    ) where
        F: Fn(&str) -> Option<i64>,
    {
        let mut status = RuleStatus {
            rule_id: rule.id,
            hash: rule.hash.clone(),
            date: now,
            error_count: 0,
            item_count: 0,
        };

        match outcome {
            RuleOutcome::Success { items } => {
                for (dn, result) in items {
                    if let Some(rule_item) =
                        self.accept_item(tree, rule, &dn, result, &marker_id)
                    {
                        status.item_count += 1;
                        self.rule_items.push(rule_item);
                    }
                }
            }
            RuleOutcome::Failure { messages } => {
                tracing::error!(rule = %rule.name, failures = messages.len(), "rule evaluation failed");
                for msg in messages {
                    self.rule_logs.push(RuleLog {
                        rule_id: rule.id,
                        kind: "error".to_string(),
                        msg,
                    });
                    status.error_count += 1;
                }
            }
        }

        self.rule_statuses.insert(rule.id, status);
    }

    fn accept_item<F>(
        &mut self,
        tree: &mut ObservedTree,
        rule: &Rule,
        dn: &str,
        result: RuleItemResult,
        marker_id: &F,
    ) -> Option<RuleItem>
    where
        F: Fn(&str) -> Option<i64>,
    {
        let severity = if result.has_error {
            Some(AlertSeverity::Error)
        } else if result.has_warning {
            Some(AlertSeverity::Warn)
        } else {
            None
        };

        if let Some(severity) = severity {
            tree.raise_alert(
                dn,
                Alert {
                    id: format!("rule-{}", rule.name),
                    severity,
                    msg: format!("Rule {} failed.", rule.name),
                    source: AlertSource {
                        kind: "rule".to_string(),
                        id: rule.name.clone(),
                    },
                },
            );
        }

        let mut markers = Vec::new();
        for marker in &result.marks {
            tree.raise_marker(dn, marker);
            markers.push(marker.clone());
            if let Some(id) = marker_id(marker) {
                self.marker_items.push(MarkerItem {
                    marker_id: id,
                    dn: dn.to_string(),
                });
            }
        }

        if severity.is_none() && markers.is_empty() {
            return None;
        }

        Some(RuleItem {
            rule_id: rule.id,
            dn: dn.to_string(),
            has_error: severity == Some(AlertSeverity::Error),
            has_warning: severity == Some(AlertSeverity::Warn),
            markers: (!markers.is_empty()).then_some(markers),
        })
    }

    pub fn status_rows(&self) -> Vec<crate::delta::table_sync::Row> {
        self.rule_statuses.values().map(RuleStatus::to_row).collect()
    }

    pub fn item_rows(&self) -> Vec<crate::delta::table_sync::Row> {
        self.rule_items.iter().map(RuleItem::to_row).collect()
    }

    pub fn log_rows(&self) -> Vec<crate::delta::table_sync::Row> {
        self.rule_logs.iter().map(RuleLog::to_row).collect()
    }

    pub fn marker_item_rows(&self) -> Vec<crate::delta::table_sync::Row> {
        self.marker_items.iter().map(MarkerItem::to_row).collect()
    }
}
