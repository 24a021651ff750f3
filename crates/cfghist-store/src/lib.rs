//! cfghist Store - SQLite persistence for configuration history
//!
//! Provides:
//! - Connection setup and embedded migrations with checksums
//! - A typed statement registry owned by [`history::HistoryStore`]
//! - Identity resolution for snapshot and diff parent rows
//! - Current-item reads and delta application for snapshot/diff items
//! - Exact-row synchronization for rule and marker tables

pub mod db;
pub mod errors;
pub mod executor;
pub mod history;
pub mod migrations;
pub mod rules;
pub mod statements;
pub mod table_sync;
mod values;

// Re-export key types
pub use errors::Result;
pub use history::HistoryStore;
