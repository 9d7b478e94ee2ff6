//! Event error types

use thiserror::Error;

use crate::time::{IndexError, TimeRangeError, UtilityError};

/// Errors raised when constructing or combining events
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EventError {
    /// Constructor arguments could not be turned into an event
    #[error("Invalid event: {0}")]
    Invalid(String),

    /// Events of different variants were merged together
    #[error("Cannot merge events of different types: {0} and {1}")]
    MixedTypes(String, String),

    /// Events being merged disagree on their time key
    #[error("Cannot merge events with different keys: {0} and {1}")]
    KeyMismatch(String, String),

    /// Two events being merged both carry the same field
    #[error("Duplicate field '{0}' while merging events")]
    DuplicateField(String),

    /// Instant conversion failed (including naive datetimes)
    #[error(transparent)]
    Utility(#[from] UtilityError),

    #[error(transparent)]
    TimeRange(#[from] TimeRangeError),

    #[error(transparent)]
    Index(#[from] IndexError),
}

/// Result type alias for event operations
pub type EventResult<T> = Result<T, EventError>;
