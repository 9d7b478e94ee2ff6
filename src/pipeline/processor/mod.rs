//! Processors
//!
//! A processor is one stage of a pipeline. It receives events one at a time,
//! may keep state between them, and hands zero or more events to the next
//! stage through an [`Emitter`]. At the end of a batch (or when a stream is
//! stopped) it receives a single `flush` so buffered state can drain.
//!
//! ```text
//! source ─▶ Align ─▶ Rate ─▶ Aggregator ─▶ output
//!             │        │         │
//!          previous  previous  Collector
//! ```
//!
//! Processors added to a [`Pipeline`](super::Pipeline) are prototypes: each
//! run gets a [`Processor::fresh`] copy with the same configuration and none
//! of the accumulated state.

pub mod aggregator;
pub mod align;
pub mod collapser;
pub mod converter;
pub mod filler;
pub mod filter;
pub mod mapper;
pub mod offset;
pub mod rate;
pub mod selector;
pub mod taker;

pub use aggregator::{AggregateField, Aggregator};
pub use align::{Align, AlignMethod, AlignOptions};
pub use collapser::Collapser;
pub use converter::{Alignment, ConvertOptions, Converter};
pub use filler::{FillMethod, FillOptions, Filler};
pub use filter::Filter;
pub use mapper::Mapper;
pub use offset::Offset;
pub use rate::{Rate, RateOptions};
pub use selector::Selector;
pub use taker::Taker;

use super::error::PipelineResult;
use crate::event::Event;

/// Downstream side of a processor
pub struct Emitter<'a> {
    sink: Option<&'a mut dyn FnMut(Event) -> PipelineResult<()>>,
}

impl<'a> Emitter<'a> {
    pub fn new(sink: &'a mut dyn FnMut(Event) -> PipelineResult<()>) -> Self {
        Self { sink: Some(sink) }
    }

    /// An emitter with nobody listening
    pub fn detached() -> Self {
        Self { sink: None }
    }

    pub fn has_observers(&self) -> bool {
        self.sink.is_some()
    }

    /// Push an event to the next stage
    pub fn emit(&mut self, event: Event) -> PipelineResult<()> {
        match &mut self.sink {
            Some(sink) => (*sink)(event),
            None => Ok(()),
        }
    }
}

/// One stage of a pipeline
///
/// Every processor is a no-op while its emitter has no observers: it neither
/// emits nor updates its state.
pub trait Processor {
    /// Short name for logs and errors
    fn name(&self) -> &'static str;

    /// Same configuration, no accumulated state
    fn fresh(&self) -> Box<dyn Processor>;

    fn add_event(&mut self, event: Event, out: &mut Emitter<'_>) -> PipelineResult<()>;

    /// End of input; emit anything still buffered
    fn flush(&mut self, _out: &mut Emitter<'_>) -> PipelineResult<()> {
        Ok(())
    }
}
