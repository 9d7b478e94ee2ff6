//! Event processing pipelines
//!
//! ```text
//!  Source                 processors                      Output
//! ┌──────────────┐     ┌───────┐   ┌──────┐   ┌─────────┐   ┌───────────────┐
//! │ Collection   │────▶│ Align │──▶│ Rate │──▶│Aggregate│──▶│ Events        │
//! │ Stream       │     └───────┘   └──────┘   └────┬────┘   │ Collections   │
//! └──────────────┘                                 │        └───────────────┘
//!                                             Collector
//!                                   (window, group_by, emit_on)
//! ```
//!
//! Bounded sources run in batch mode: a [`Runner`] pushes every event and
//! flushes once. Streams run in push mode: the caller adds events and
//! [`Stream::stop`] flushes.

pub mod builder;
pub mod collector;
pub mod error;
pub mod io;
pub mod processor;
pub mod runner;
pub mod window;

pub use builder::Pipeline;
pub use collector::{Collector, WindowedCollection};
pub use error::{PipelineError, PipelineResult, ProcessorError, ProcessorResult};
pub use io::{Output, Source, Stream};
pub use processor::{
    AlignMethod, AlignOptions, Alignment, ConvertOptions, FillMethod, FillOptions, Processor,
    RateOptions,
};
pub use runner::Runner;
pub use window::{EmitOn, GroupBy, GroupFn, Window, WindowConfig};
