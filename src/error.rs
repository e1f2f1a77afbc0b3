use std::path::PathBuf;
use thiserror::Error;

use crate::platform::Pid;

/// Application error type
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Row {row} is not a condition row (conditions: {len})")]
    OutOfRange { row: usize, len: usize },

    #[error("Could not create activation observer for pid {pid} (AX error {code})")]
    ResourceCreation { pid: Pid, code: i32 },

    #[error("Input source '{input_source_id}' for '{application_identifier}' is not installed")]
    StaleReference {
        application_identifier: String,
        input_source_id: String,
    },

    #[error("Invalid {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    #[error("Input source error: {0}")]
    InputSource(String),

    #[error("No frontmost application")]
    NoFrontmostApplication,

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Invalid config {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not determine project directories")]
    NoProjectDirs,

    #[error("Automatic input switching is only supported on macOS")]
    UnsupportedPlatform,

    #[error("Switch service is no longer running")]
    ChannelClosed,
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Check if a rusqlite error is a UNIQUE constraint violation
pub fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(e, rusqlite::Error::SqliteFailure(err, _)
        if err.code == rusqlite::ffi::ErrorCode::ConstraintViolation)
}
