//! Crate-wide error and warning types
//!
//! Each subsystem raises its own error enum (see `time::error`,
//! `event::error`, `collection::error`, `series::error`, `pipeline::error`).
//! [`Error`] wraps all of them for callers that just want one type.
//!
//! Warnings are never returned: they are logged through `tracing` and the
//! operation carries on.

use thiserror::Error;

use crate::collection::{CollectionError, FilterError};
use crate::config::ConfigError;
use crate::event::EventError;
use crate::pipeline::{PipelineError, ProcessorError};
use crate::series::TimeSeriesError;
use crate::time::{IndexError, TimeRangeError, UtilityError};

/// Any error pond can raise
#[derive(Error, Debug)]
pub enum Error {
    #[error("Event error: {0}")]
    Event(#[from] EventError),

    #[error("Collection error: {0}")]
    Collection(#[from] CollectionError),

    #[error("Filter error: {0}")]
    Filter(#[from] FilterError),

    #[error("TimeRange error: {0}")]
    TimeRange(#[from] TimeRangeError),

    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    #[error("Utility error: {0}")]
    Utility(#[from] UtilityError),

    #[error("TimeSeries error: {0}")]
    TimeSeries(#[from] TimeSeriesError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Processor error: {0}")]
    Processor(#[from] ProcessorError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for mixed pond operations
pub type Result<T> = std::result::Result<T, Error>;

/// Non-fatal conditions reported while processing
#[derive(Debug, Clone, PartialEq)]
pub enum Warning {
    /// A local-time calendar index was requested, UTC was used instead
    LocalTimeCoerced { index: String },

    /// A value that must be numeric was not, the field was skipped
    NonNumericValue { context: &'static str, path: String },

    /// A tracked field path is absent from an event
    MissingPath { context: &'static str, path: String },

    /// Two consecutive events share a timestamp so no rate can be derived
    ZeroDuration { context: &'static str, at: i64 },
}

impl Warning {
    /// Subsystem the warning belongs to
    pub fn category(&self) -> &'static str {
        match self {
            Warning::LocalTimeCoerced { .. } => "utility",
            Warning::NonNumericValue { .. }
            | Warning::MissingPath { .. }
            | Warning::ZeroDuration { .. } => "processor",
        }
    }

    /// Log the warning
    pub fn emit(&self) {
        tracing::warn!(category = self.category(), "{}", self);
    }
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::LocalTimeCoerced { index } => write!(
                f,
                "Calendar index {} requested in local time, resolving in UTC",
                index
            ),
            Warning::NonNumericValue { context, path } => {
                write!(f, "{}: non-numeric value at {}, skipping", context, path)
            }
            Warning::MissingPath { context, path } => {
                write!(f, "{}: path {} does not exist in event data", context, path)
            }
            Warning::ZeroDuration { context, at } => {
                write!(f, "{}: zero-length interval at {} ms", context, at)
            }
        }
    }
}
