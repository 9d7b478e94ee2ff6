//! Pipeline and processor error types

use thiserror::Error;

use crate::collection::CollectionError;
use crate::event::{EventError, EventType};
use crate::time::{IndexError, TimeRangeError};

/// Errors raised by individual processors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProcessorError {
    /// A required option is missing or has a bad value
    #[error("Invalid option for {processor}: {reason}")]
    InvalidOption {
        processor: &'static str,
        reason: String,
    },

    /// The processor cannot handle this event variant
    #[error("{processor} cannot process {event_type} events")]
    UnsupportedEvent {
        processor: &'static str,
        event_type: EventType,
    },

    /// Conversion between event variants is not possible
    #[error("Cannot convert {from} event to {to}: {reason}")]
    Conversion {
        from: EventType,
        to: EventType,
        reason: String,
    },

    #[error(transparent)]
    Event(#[from] EventError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    TimeRange(#[from] TimeRangeError),
}

impl ProcessorError {
    pub(crate) fn invalid(processor: &'static str, reason: impl Into<String>) -> Self {
        ProcessorError::InvalidOption {
            processor,
            reason: reason.into(),
        }
    }
}

/// Errors raised while building or running a pipeline
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// `emit_on` must be `eachEvent`, `discard` or `flush`
    #[error("Unknown emit_on value: {0}")]
    UnknownEmitOn(String),

    /// Window must be `global`, `daily`, `monthly`, `yearly` or a duration
    #[error("Invalid window: {0}")]
    InvalidWindow(String),

    /// A required pipeline option is missing or inconsistent
    #[error("Invalid pipeline option: {0}")]
    InvalidOption(String),

    /// `.to()` was called before `from_source`
    #[error("Pipeline has no source")]
    NoSource,

    /// Operation only available for bounded sources
    #[error("{0} requires a bounded source")]
    RequiresBounded(&'static str),

    /// A stream received events of a different variant
    #[error("Stream carries {expected} events, got a {found} event")]
    MixedEventTypes { expected: EventType, found: EventType },

    #[error(transparent)]
    Processor(#[from] ProcessorError),

    #[error(transparent)]
    Collection(#[from] CollectionError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Event(#[from] EventError),
}

/// Result type alias for processors
pub type ProcessorResult<T> = Result<T, ProcessorError>;

/// Result type alias for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProcessorError::invalid("align", "unknown method cubic");
        assert_eq!(err.to_string(), "Invalid option for align: unknown method cubic");

        let err = ProcessorError::UnsupportedEvent {
            processor: "rate",
            event_type: EventType::Range,
        };
        assert_eq!(err.to_string(), "rate cannot process range events");
    }

    #[test]
    fn test_processor_error_conversion() {
        let err: PipelineError = ProcessorError::invalid("fill", "bad").into();
        assert!(matches!(err, PipelineError::Processor(_)));
    }
}
