//! Rule records and evaluation outcomes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

use crate::delta::table_sync::Row;
use crate::model::{format_db_date, ObservedTree};

/// An enabled rule as stored in the `rules` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub id: i64,
    pub name: String,
    pub hash: String,
    pub target: String,
    pub script: String,
}

/// What a rule concluded about one dn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleItemResult {
    #[serde(default)]
    pub has_error: bool,
    #[serde(default)]
    pub has_warning: bool,
    #[serde(default)]
    pub marks: BTreeSet<String>,
}

/// Outcome of evaluating one rule against one observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RuleOutcome {
    Success {
        items: BTreeMap<String, RuleItemResult>,
    },
    Failure {
        messages: Vec<String>,
    },
}

/// Evaluates rules against an observed tree.
pub trait RuleEvaluator {
    fn evaluate(&self, tree: &ObservedTree, rule: &Rule) -> RuleOutcome;
}

/// One row per processed rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleStatus {
    pub rule_id: i64,
    pub hash: String,
    pub date: DateTime<Utc>,
    pub error_count: u32,
    pub item_count: u32,
}

impl RuleStatus {
    pub const COLUMNS: &'static [&'static str] =
        &["rule_id", "hash", "date", "error_count", "item_count"];

    pub fn to_row(&self) -> Row {
        vec![
            Value::from(self.rule_id),
            Value::from(self.hash.clone()),
            Value::from(format_db_date(self.date)),
            Value::from(self.error_count),
            Value::from(self.item_count),
        ]
    }
}

/// A dn a rule flagged or marked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleItem {
    pub rule_id: i64,
    pub dn: String,
    pub has_error: bool,
    pub has_warning: bool,
    pub markers: Option<Vec<String>>,
}

impl RuleItem {
    pub const COLUMNS: &'static [&'static str] =
        &["rule_id", "dn", "has_error", "has_warning", "markers"];

    pub fn to_row(&self) -> Row {
        vec![
            Value::from(self.rule_id),
            Value::from(self.dn.clone()),
            Value::from(self.has_error),
            Value::from(self.has_warning),
            self.markers
                .as_ref()
                .map_or(Value::Null, |markers| Value::from(markers.clone())),
        ]
    }
}

/// A diagnostic emitted when a rule fails to evaluate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleLog {
    pub rule_id: i64,
    pub kind: String,
    pub msg: String,
}

impl RuleLog {
    pub const COLUMNS: &'static [&'static str] = &["rule_id", "kind", "msg"];

    pub fn to_row(&self) -> Row {
        vec![
            Value::from(self.rule_id),
            Value::from(self.kind.clone()),
            Value::from(self.msg.clone()),
        ]
    }
}

/// A dn carrying a known marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerItem {
    pub marker_id: i64,
    pub dn: String,
}

impl MarkerItem {
    pub const COLUMNS: &'static [&'static str] = &["marker_id", "dn"];

    pub fn to_row(&self) -> Row {
        vec![Value::from(self.marker_id), Value::from(self.dn.clone())]
    }
}
