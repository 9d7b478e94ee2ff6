//! Time primitive error types

use thiserror::Error;

/// Errors raised by instant conversion utilities
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UtilityError {
    /// A datetime without timezone information reached a conversion
    #[error("Naive datetime is not allowed, attach a timezone first: {0}")]
    NaiveDatetime(String),

    /// Milliseconds value cannot be represented as a datetime
    #[error("Timestamp out of range: {0} ms")]
    OutOfRange(i64),
}

/// Errors raised when building or modifying a time range
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TimeRangeError {
    /// Begin comes after end
    #[error("Invalid time range: begin {begin} is after end {end}")]
    Inverted { begin: i64, end: i64 },

    /// Malformed input to a range constructor
    #[error("Invalid time range: {0}")]
    Malformed(String),

    /// Instant conversion failed
    #[error(transparent)]
    Utility(#[from] UtilityError),
}

/// Errors raised when parsing index strings or window descriptions
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndexError {
    /// The index string matches neither the fixed nor the calendar grammar
    #[error("Unable to parse index string: {0}")]
    Parse(String),

    /// The window is not a fixed duration like `30s`, `5m`, `1h` or `1d`
    #[error("Invalid window duration: {0}")]
    Window(String),

    /// Instant conversion failed
    #[error(transparent)]
    Utility(#[from] UtilityError),

    /// Resolved range was invalid
    #[error(transparent)]
    Range(#[from] TimeRangeError),
}

/// Result type alias for instant utilities
pub type UtilityResult<T> = Result<T, UtilityError>;

/// Result type alias for time range operations
pub type TimeRangeResult<T> = Result<T, TimeRangeError>;

/// Result type alias for index operations
pub type IndexResult<T> = Result<T, IndexError>;
