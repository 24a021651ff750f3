//! Error handling for cfghist-store
//!
//! Wraps cfghist-core ExError with store-specific helpers

use cfghist_core::errors::{ExError, ExErrorKind};

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Create a migration error
pub fn migration_error(migration_id: &str, reason: &str) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("migration")
        .with_message(format!("Migration {} failed: {}", migration_id, reason))
}

/// Create a checksum mismatch error
pub fn checksum_mismatch(migration_id: &str, expected: &str, actual: &str) -> ExError {
    ExError::new(ExErrorKind::ConstraintViolation)
        .with_op("migration_checksum")
        .with_message(format!(
            "Checksum mismatch for migration {}: expected {}, got {}",
            migration_id, expected, actual
        ))
}

/// Create a database error from rusqlite::Error
pub fn from_rusqlite(err: rusqlite::Error) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("sqlite")
        .with_message(err.to_string())
}

/// Map a rusqlite error to a persistence error tagged with `op`
pub fn persistence(op: &'static str) -> impl Fn(rusqlite::Error) -> ExError {
    move |err| {
        ExError::new(ExErrorKind::Persistence)
            .with_op(op)
            .with_message(err.to_string())
    }
}

/// Create an I/O error (e.g. the database directory cannot be created)
pub fn io_error(op: &str, err: std::io::Error) -> ExError {
    ExError::new(ExErrorKind::Io)
        .with_op(op.to_string())
        .with_message(err.to_string())
}
