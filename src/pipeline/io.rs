//! Pipeline inputs and outputs
//!
//! A pipeline reads from a [`Source`]: either a bounded [`Collection`] that a
//! [`Runner`](super::Runner) pulls through the chain, or a [`Stream`] the
//! caller pushes events into. Results leave through an [`Output`], as
//! individual events or as window/group collections.

use std::cell::RefCell;
use std::rc::Rc;

use super::collector::{Collector, WindowedCollection};
use super::error::{PipelineError, PipelineResult};
use super::runner::Chain;
use super::window::WindowConfig;
use crate::collection::Collection;
use crate::event::{Event, EventType};
use crate::series::TimeSeries;

/// Where a pipeline's events come from
#[derive(Debug, Clone)]
pub enum Source {
    /// Batch mode
    Bounded(Collection),
    /// Stream mode
    Stream(Stream),
}

impl Source {
    pub fn is_bounded(&self) -> bool {
        matches!(self, Source::Bounded(_))
    }

    /// `batch` or `stream`
    pub fn mode(&self) -> &'static str {
        match self {
            Source::Bounded(_) => "batch",
            Source::Stream(_) => "stream",
        }
    }
}

impl From<Collection> for Source {
    fn from(collection: Collection) -> Self {
        Source::Bounded(collection)
    }
}

impl From<&Collection> for Source {
    fn from(collection: &Collection) -> Self {
        Source::Bounded(collection.clone())
    }
}

impl From<Stream> for Source {
    fn from(stream: Stream) -> Self {
        Source::Stream(stream)
    }
}

impl From<&Stream> for Source {
    fn from(stream: &Stream) -> Self {
        Source::Stream(stream.clone())
    }
}

impl From<TimeSeries> for Source {
    fn from(series: TimeSeries) -> Self {
        Source::Bounded(series.collection().clone())
    }
}

impl From<&TimeSeries> for Source {
    fn from(series: &TimeSeries) -> Self {
        Source::Bounded(series.collection().clone())
    }
}

struct StreamState {
    running: bool,
    event_type: Option<EventType>,
    chains: Vec<Chain>,
}

/// Unbounded, caller-driven event source
///
/// Clones share the same subscribers. Every event pushed with
/// [`add_event`](Stream::add_event) runs synchronously through each
/// subscribed pipeline before the call returns. Output callbacks must not
/// push back into the stream they are reading from.
#[derive(Clone)]
pub struct Stream {
    inner: Rc<RefCell<StreamState>>,
}

impl Stream {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(StreamState {
                running: true,
                event_type: None,
                chains: Vec::new(),
            })),
        }
    }

    pub fn start(&self) {
        self.inner.borrow_mut().running = true;
    }

    /// Stop accepting events and flush every subscribed pipeline
    pub fn stop(&self) -> PipelineResult<()> {
        let mut state = self.inner.borrow_mut();
        state.running = false;
        tracing::debug!(pipelines = state.chains.len(), "stream stopped, flushing");
        for chain in state.chains.iter_mut() {
            chain.flush()?;
        }
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.inner.borrow().running
    }

    /// Push one event through every subscribed pipeline
    ///
    /// All events on a stream must share one variant. Events arriving while
    /// the stream is stopped, or before anything subscribed, are dropped.
    pub fn add_event(&self, event: Event) -> PipelineResult<()> {
        let mut state = self.inner.borrow_mut();
        let found = event.event_type();
        match state.event_type {
            Some(expected) if expected != found => {
                return Err(PipelineError::MixedEventTypes { expected, found });
            }
            Some(_) => {}
            None => state.event_type = Some(found),
        }

        if !state.running || state.chains.is_empty() {
            return Ok(());
        }
        let last = state.chains.len() - 1;
        for (i, chain) in state.chains.iter_mut().enumerate() {
            if i == last {
                return chain.push(event);
            }
            chain.push(event.clone())?;
        }
        Ok(())
    }

    pub(crate) fn subscribe(&self, chain: Chain) {
        self.inner.borrow_mut().chains.push(chain);
    }
}

impl Default for Stream {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Stream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.borrow();
        f.debug_struct("Stream")
            .field("running", &state.running)
            .field("event_type", &state.event_type)
            .field("pipelines", &state.chains.len())
            .finish()
    }
}

/// Where a pipeline's results go
pub enum Output {
    /// Every event reaching the end of the chain
    Events(Box<dyn FnMut(Event)>),
    /// Window/group collections, released per the pipeline's `emit_on`
    Collections(Box<dyn FnMut(WindowedCollection)>),
}

impl Output {
    pub fn events<F>(callback: F) -> Self
    where
        F: FnMut(Event) + 'static,
    {
        Output::Events(Box::new(callback))
    }

    pub fn collections<F>(callback: F) -> Self
    where
        F: FnMut(WindowedCollection) + 'static,
    {
        Output::Collections(Box::new(callback))
    }

    pub(crate) fn into_sink(self, config: &WindowConfig) -> Box<dyn PipelineOut> {
        match self {
            Output::Events(callback) => Box::new(EventOut { callback }),
            Output::Collections(callback) => Box::new(CollectionOut {
                collector: Collector::new(config.clone()),
                callback,
            }),
        }
    }
}

impl std::fmt::Debug for Output {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Output::Events(_) => write!(f, "Output::Events"),
            Output::Collections(_) => write!(f, "Output::Collections"),
        }
    }
}

/// Terminal stage of a chain
pub(crate) trait PipelineOut {
    fn add_event(&mut self, event: Event) -> PipelineResult<()>;

    fn flush(&mut self) -> PipelineResult<()>;
}

struct EventOut {
    callback: Box<dyn FnMut(Event)>,
}

impl PipelineOut for EventOut {
    fn add_event(&mut self, event: Event) -> PipelineResult<()> {
        (self.callback)(event);
        Ok(())
    }

    fn flush(&mut self) -> PipelineResult<()> {
        Ok(())
    }
}

struct CollectionOut {
    collector: Collector,
    callback: Box<dyn FnMut(WindowedCollection)>,
}

impl PipelineOut for CollectionOut {
    fn add_event(&mut self, event: Event) -> PipelineResult<()> {
        for windowed in self.collector.add_event(event)? {
            (self.callback)(windowed);
        }
        Ok(())
    }

    fn flush(&mut self) -> PipelineResult<()> {
        for windowed in self.collector.flush() {
            (self.callback)(windowed);
        }
        Ok(())
    }
}
