//! Content-keyed delta engine.
//!
//! Reconciles a freshly observed item collection against the persisted
//! collection for the same parent and produces the create/update/delete
//! operations that bring storage in line with the observation.
//!
//! ## Entry point
//!
//! ```ignore
//! use cfghist_core::delta::produce_delta;
//!
//! let ops = produce_delta(observed_items, persisted_items)?;
//! ```
//!
//! ## Guarantees
//!
//! - **Order independence**: keys are canonical serializations of
//!   `{dn, info}`, so object member order never matters.
//! - **Determinism**: observed and current collections are indexed in
//!   `BTreeMap`s; output order depends only on keys and persisted ids.
//! - **Duplicate healing**: when several persisted rows share a key, the row
//!   with the lowest id is kept as the representative and all others are
//!   deleted.
//! - **Idempotence**: against converged storage the delta is empty.

pub mod engine;
pub mod index;
pub mod key;
pub mod model;
pub mod table_sync;

pub use engine::{produce_delta, reconcile, verify_delta};
pub use index::{index_current, index_observed, CurrentIndex, ObservedIndex};
pub use key::{canonical_json, derive_key, MAX_NESTING_DEPTH};
pub use model::{DeleteReason, DeltaOp, DeltaSummary};
pub use table_sync::{plan_table_sync, Row, TableOp};
