//! Error types for timex operations.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimexError {
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid offset: {0}")]
    InvalidOffset(String),

    #[error("Context required: {0}")]
    ContextRequired(String),

    #[error("Inconsistent range: {0}")]
    RangeInconsistent(String),

    #[error("Overflow: {0}")]
    Overflow(String),

    #[error("Missing value: {0}")]
    MissingValue(String),

    #[error("Inverted range: {0}")]
    InvertedRange(String),

    #[error("Domain mismatch: {0}")]
    DomainMismatch(String),

    /// An expression was used before it was ever given a value.
    #[error("expression has no value (never parsed or assigned)")]
    Unset,
}

impl TimexError {
    /// True for errors that signal a caller bug rather than bad input.
    pub fn is_programming_error(&self) -> bool {
        matches!(self, TimexError::Unset)
    }
}

pub type Result<T> = std::result::Result<T, TimexError>;
