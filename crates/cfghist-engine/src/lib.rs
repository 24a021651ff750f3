//! cfghist Engine - Orchestration layer
//!
//! Runs reconciliation cycles: each command opens one transaction, resolves
//! the parent row, reconciles its items (and, for a full observation,
//! processes rules), then commits or rolls back as a unit.

pub mod commands;
pub mod rules;
