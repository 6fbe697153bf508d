// ABOUTME: Error type for parsing playvault domain values out of their stored text form.
// ABOUTME: Raised when a role, origin or category type column holds an unknown value.

use thiserror::Error;

/// Errors that can occur while converting stored text into domain enums.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("unknown role: {0}")]
    UnknownRole(String),

    #[error("unknown origin: {0}")]
    UnknownOrigin(String),

    #[error("unknown category type: {0}")]
    UnknownCategoryType(String),
}
