//! # pond
//!
//! Time-series event processing: immutable events and collections, named
//! time series with a JSON wire format, and composable pipelines that align,
//! fill, differentiate and aggregate events in batch or streaming mode.
//!
//! ## Features
//!
//! - **Three event shapes**: point events, time-range events and indexed events
//! - **Immutable collections**: cheap clones, every transform returns a new value
//! - **Reducers**: sum, avg, percentiles and custom functions with a missing-value policy
//! - **Pipelines**: windowing, grouping and emission control over a processor chain
//! - **Streams**: push events in as they arrive and receive results via callbacks
//!
//! ## Modules
//!
//! - [`time`]: Time ranges, index strings and time utilities
//! - [`event`]: Events, field paths and event combinators
//! - [`collection`]: Immutable, ordered event collections
//! - [`reducer`]: Reducers over value lists
//! - [`series`]: Named time series and the wire format
//! - [`pipeline`]: Processors, windowing and pipeline execution
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pond::pipeline::AlignOptions;
//! use pond::reducer::Reducer;
//! use pond::TimeSeries;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let series = TimeSeries::from_json_str(
//!         r#"{"name": "traffic", "columns": ["time", "in"],
//!             "points": [[0, 10], [70000, 25], [140000, 40]]}"#,
//!     )?;
//!
//!     // Resample onto a one-minute grid
//!     let aligned = series.align(AlignOptions::new().field_spec(["in"]).window("1m"))?;
//!     println!("{}", aligned);
//!
//!     // Five-minute averages
//!     let rolled = series.fixed_window_rollup("5m", [("in_avg", "in", Reducer::avg())], false)?;
//!     println!("{}", rolled.to_json());
//!
//!     Ok(())
//! }
//! ```

pub mod collection;
pub mod config;
pub mod error;
pub mod event;
pub mod pipeline;
pub mod reducer;
pub mod series;
pub mod time;

// Re-export top-level types for convenience
pub use collection::{Collection, CollectionError, CollectionResult};

pub use error::{Error, Result, Warning};

pub use event::{Event, EventError, EventKey, EventResult, EventType, FieldPath};

pub use pipeline::{
    Collector, EmitOn, GroupBy, Output, Pipeline, PipelineError, PipelineResult, ProcessorError,
    Runner, Source, Stream, Window, WindowedCollection,
};

pub use reducer::{FilterError, Interpolation, MissingPolicy, Reducer};

pub use series::{TimeSeries, TimeSeriesError, TimeSeriesResult, WireFormat};

pub use time::{Index, IndexError, TimeRange, TimeRangeError, UtilityError};

pub use config::{Config, ConfigError, LoggingConfig, PipelineDefaults};
