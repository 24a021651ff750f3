//! cfghist Core - history reconciliation kernel
//!
//! This crate holds everything about configuration history that does not
//! touch storage:
//! - Snapshot and diff item models
//! - Content-keyed delta engine (key derivation, current-state indexing,
//!   create/update/delete classification with duplicate healing)
//! - Exact-row planner for simple synchronized tables
//! - Translation of rule evaluation results into rule/marker rows
//! - Error and logging facilities shared by the other crates

pub mod delta;
pub mod errors;
pub mod logging_facility;
pub mod model;
pub mod rules;

// Re-exported so the logging macros resolve schema constants through `$crate`.
pub use cfghist_core_types;

pub use delta::{produce_delta, DeltaOp, DeltaSummary};
pub use errors::{ExError, ExErrorKind, HistError, Result};
pub use model::{DeltaItem, Diff, DiffItem, ObservedTree, Persisted, Snapshot, SnapshotItem};
