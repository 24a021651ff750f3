//! History domain model.
//!
//! Parents ([`Snapshot`], [`Diff`]) are time-bucketed rows owned by storage.
//! Items ([`SnapshotItem`], [`DiffItem`]) are tree nodes attached to a parent
//! and identified by `(dn, info)`; everything else on an item is payload.

pub mod item;
pub mod parent;
pub mod time;
pub mod tree;

pub use item::{payload_eq, DeltaItem, DiffItem, Persisted, SnapshotItem};
pub use parent::{Diff, Snapshot};
pub use time::{format_db_date, parse_db_date, truncate_to_second};
pub use tree::{Alert, AlertSeverity, AlertSource, ObservedTree};
