// ABOUTME: Error taxonomy for the storage engine: contention, constraint, corruption and init failures.
// ABOUTME: Classifies raw SQLite errors so the retry wrapper only ever retries contention.

use std::path::PathBuf;

use playvault_core::CoreError;
use rusqlite::ErrorCode;
use thiserror::Error;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Any engine error that is neither contention nor a constraint violation.
    #[error("sqlite error: {0}")]
    Sqlite(rusqlite::Error),

    /// The store was busy or locked by another writer. Retried by the retry
    /// wrapper; surfaced only once `attempts` have been exhausted.
    #[error("store busy after {attempts} attempt(s): {source}")]
    Contention {
        attempts: u32,
        #[source]
        source: rusqlite::Error,
    },

    /// Unique, foreign-key, check or not-null violation. Never retried.
    #[error("constraint violation: {0}")]
    Constraint(rusqlite::Error),

    /// A stored JSON value failed to decode.
    #[error("corrupt value in {table} for key {key}: {source}")]
    Corrupt {
        table: &'static str,
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// A stored enum column held a value outside its domain.
    #[error("invalid stored value: {0}")]
    InvalidValue(#[from] CoreError),

    #[error("failed to encode document: {0}")]
    Serialize(#[source] serde_json::Error),

    /// The password hasher rejected its input or parameters.
    #[error("failed to hash password: {0}")]
    PasswordHash(String),

    #[error("cannot restore user {0} without a stored secret")]
    MissingSecret(String),

    /// The data directory could not be created. Fatal at startup.
    #[error("failed to create data directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The store file could not be opened or bootstrapped. Fatal at startup.
    #[error("failed to open store at {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("storage worker failed: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl StoreError {
    /// True for busy/locked failures that the retry wrapper may retry.
    pub fn is_contention(&self) -> bool {
        matches!(self, StoreError::Contention { .. })
    }

    /// True for unique/foreign-key/check violations.
    pub fn is_constraint(&self) -> bool {
        matches!(self, StoreError::Constraint(_))
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        if is_contention_error(&err) {
            StoreError::Contention {
                attempts: 1,
                source: err,
            }
        } else if err.sqlite_error_code() == Some(ErrorCode::ConstraintViolation) {
            StoreError::Constraint(err)
        } else {
            StoreError::Sqlite(err)
        }
    }
}

/// Contention is detected by error code first, then by message for errors
/// that reach us already stringified.
fn is_contention_error(err: &rusqlite::Error) -> bool {
    match err.sqlite_error_code() {
        Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked) => true,
        _ => {
            let msg = err.to_string().to_lowercase();
            msg.contains("database is locked") || msg.contains("database is busy")
        }
    }
}
