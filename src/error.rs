//! Error types for kanri
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (unknown id, bad args)
//! - 3: Blocked by validation (schedule conflict, epic mismatch)
//! - 4: Operation failed (I/O, corrupt data file)

use thiserror::Error;

use crate::task::ItemKind;

/// Exit codes for the kanri CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const VALIDATION_BLOCKED: i32 = 3;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for kanri operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("{kind} not found: {id}")]
    NotFound { kind: ItemKind, id: u32 },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // Validation blocks (exit code 3)
    #[error("Schedule conflict: {reason}")]
    ScheduleConflict { reason: String },

    #[error("Subtask {id} belongs to epic {stored}, not epic {requested}")]
    EpicMismatch { id: u32, stored: u32, requested: u32 },

    // Operation failures (exit code 4)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Corrupt data file: {0}")]
    Corrupt(String),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            // User errors
            Error::NotFound { .. } | Error::InvalidArgument(_) => exit_codes::USER_ERROR,

            // Validation blocks
            Error::ScheduleConflict { .. } | Error::EpicMismatch { .. } => {
                exit_codes::VALIDATION_BLOCKED
            }

            // Operation failures
            Error::Io(_)
            | Error::Json(_)
            | Error::Csv(_)
            | Error::TomlParse(_)
            | Error::Corrupt(_) => exit_codes::OPERATION_FAILED,
        }
    }

    /// Structured details for the JSON error envelope
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::NotFound { kind, id } => Some(serde_json::json!({
                "kind": kind.to_string(),
                "id": id,
            })),
            Error::EpicMismatch {
                id,
                stored,
                requested,
            } => Some(serde_json::json!({
                "id": id,
                "stored_epic": stored,
                "requested_epic": requested,
            })),
            _ => None,
        }
    }

    pub(crate) fn schedule_conflict(reason: impl Into<String>) -> Self {
        Error::ScheduleConflict {
            reason: reason.into(),
        }
    }
}

/// Result type alias for kanri operations
pub type Result<T> = std::result::Result<T, Error>;

/// Wrapper for displaying errors in JSON format
#[derive(serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&Error> for JsonError {
    fn from(err: &Error) -> Self {
        JsonError {
            error: err.to_string(),
            code: err.exit_code(),
            details: err.details(),
        }
    }
}
