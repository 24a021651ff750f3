//! Rule processing contract and result translation.
//!
//! Rule evaluation itself is external: a [`RuleEvaluator`] inspects an
//! [`ObservedTree`](crate::model::ObservedTree) for one rule and reports per-dn
//! flags and markers, or a list of failure messages. This module turns those
//! outcomes into alerts and markers on the tree and into the rows persisted
//! for rule statuses, rule items, rule logs, and marker items.

pub mod context;
pub mod model;

pub use context::ExecutionContext;
pub use model::{
    MarkerItem, Rule, RuleEvaluator, RuleItem, RuleItemResult, RuleLog, RuleOutcome, RuleStatus,
};
