//! Command orchestration layer.
//!
//! ## Logging Ownership
//!
//! The engine layer owns lifecycle logging for cycles:
//! - `log_op_start!` at entry
//! - `log_op_end!` on success
//! - `log_op_error!` on failure
//!
//! Lower layers (store, core) use only `tracing::debug!()` for internal details.

pub mod engine_command;
pub mod record;

pub use engine_command::{apply_engine_command, EngineCommand, EngineCommandResult};
pub use record::{
    record_diff, record_observation, record_snapshot, ObservationReport, RecordOptions,
    SyncReport,
};
