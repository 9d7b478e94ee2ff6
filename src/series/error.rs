//! TimeSeries error types

use thiserror::Error;

use crate::collection::CollectionError;
use crate::event::EventError;
use crate::pipeline::PipelineError;
use crate::time::{IndexError, TimeRangeError};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TimeSeriesError {
    /// Input is not a usable wire-format object
    #[error("Invalid wire format: {0}")]
    Wire(String),

    /// First column must be `time`, `timerange` or `index`
    #[error("Unknown key column: {0}")]
    BadColumn(String),

    /// A points row could not be turned into an event
    #[error("Bad point at row {row}: {reason}")]
    BadPoint { row: usize, reason: String },

    /// Events are not in non-decreasing begin-time order
    #[error("Events are not in chronological order")]
    NotChronological,

    #[error(transparent)]
    Collection(#[from] CollectionError),

    #[error(transparent)]
    Event(#[from] EventError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    TimeRange(#[from] TimeRangeError),
}

pub type TimeSeriesResult<T> = Result<T, TimeSeriesError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TimeSeriesError::BadPoint {
            row: 3,
            reason: "expected 3 values".to_string(),
        };
        assert_eq!(err.to_string(), "Bad point at row 3: expected 3 values");
        assert_eq!(
            TimeSeriesError::BadColumn("bogus_type".to_string()).to_string(),
            "Unknown key column: bogus_type"
        );
    }

    #[test]
    fn test_nested_errors_are_transparent() {
        let inner = IndexError::Parse("nope".to_string());
        let err: TimeSeriesError = inner.clone().into();
        assert_eq!(err.to_string(), inner.to_string());
    }
}
