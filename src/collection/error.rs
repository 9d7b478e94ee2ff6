//! Collection error types

use thiserror::Error;

use crate::event::{EventError, EventType};

/// Errors raised by collection operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CollectionError {
    /// Events of a different variant were added to a collection
    #[error("Collection holds {expected} events, cannot add a {found} event")]
    MixedEventTypes { expected: EventType, found: EventType },

    /// Positional access past the end
    #[error("Index {index} out of range for collection of size {size}")]
    OutOfRange { index: usize, size: usize },

    /// A field path used for sorting or grouping is absent
    #[error("Bad field path: {0}")]
    BadPath(String),

    /// More quantiles were requested than there are events
    #[error("Cannot compute {requested} quantiles over {size} events")]
    QuantileCount { requested: usize, size: usize },

    #[error(transparent)]
    Event(#[from] EventError),
}

/// Result type alias for collection operations
pub type CollectionResult<T> = Result<T, CollectionError>;
