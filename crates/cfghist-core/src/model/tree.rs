//! The observed configuration tree handed to rule evaluation.
//!
//! Rule processing annotates the tree with alerts and markers per `dn`; the
//! annotations live beside the items rather than inside their payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::model::item::SnapshotItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Error,
    Warn,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertSource {
    pub kind: String,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub severity: AlertSeverity,
    pub msg: String,
    pub source: AlertSource,
}

/// One observation of the tree at `date`.
#[derive(Debug, Clone, Default)]
pub struct ObservedTree {
    pub date: DateTime<Utc>,
    pub items: Vec<SnapshotItem>,
    alerts: BTreeMap<String, Vec<Alert>>,
    markers: BTreeMap<String, BTreeSet<String>>,
}

impl ObservedTree {
    pub fn new(date: DateTime<Utc>, items: Vec<SnapshotItem>) -> Self {
        Self {
            date,
            items,
            alerts: BTreeMap::new(),
            markers: BTreeMap::new(),
        }
    }

    /// Number of items in the observation
    pub fn count(&self) -> usize {
        self.items.len()
    }

    pub fn raise_alert(&mut self, dn: &str, alert: Alert) {
        self.alerts.entry(dn.to_string()).or_default().push(alert);
    }

    pub fn raise_marker(&mut self, dn: &str, marker: &str) {
        self.markers
            .entry(dn.to_string())
            .or_default()
            .insert(marker.to_string());
    }

    pub fn alerts_for(&self, dn: &str) -> &[Alert] {
        self.alerts.get(dn).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn markers_for(&self, dn: &str) -> Option<&BTreeSet<String>> {
        self.markers.get(dn)
    }

    pub fn alerts(&self) -> &BTreeMap<String, Vec<Alert>> {
        &self.alerts
    }

    pub fn markers(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.markers
    }
}
