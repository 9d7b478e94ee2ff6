//! Execution plans, chains and the batch runner
//!
//! A [`Pipeline`] holds processor prototypes in an arena linked backwards
//! from its last node. Running it compiles that into an [`ExecutionPlan`]
//! (the ordered prototypes) and instantiates a [`Chain`]: fresh processor
//! state plus the requested output.
//!
//! ```text
//! nodes:  [align] <- [rate] <- [aggregate]      prev links
//! plan:   align -> rate -> aggregate            ordered prototypes
//! chain:  Align' -> Rate' -> Aggregator' -> out fresh state per run
//! ```

use std::rc::Rc;

use super::builder::Pipeline;
use super::error::{PipelineError, PipelineResult};
use super::io::{Output, PipelineOut, Source};
use super::processor::{Emitter, Processor};
use crate::collection::Collection;
use crate::event::Event;

/// Ordered processor prototypes of one pipeline
pub(crate) struct ExecutionPlan {
    prototypes: Vec<Rc<dyn Processor>>,
}

impl ExecutionPlan {
    pub(crate) fn compile(pipeline: &Pipeline) -> Self {
        let nodes = pipeline.nodes();
        let mut prototypes = Vec::new();
        let mut cursor = pipeline.last_node();
        while let Some(i) = cursor {
            let Some(node) = nodes.get(i) else { break };
            prototypes.push(Rc::clone(&node.prototype));
            cursor = node.prev;
        }
        prototypes.reverse();
        Self { prototypes }
    }

    pub(crate) fn len(&self) -> usize {
        self.prototypes.len()
    }

    pub(crate) fn names(&self) -> Vec<&'static str> {
        self.prototypes.iter().map(|p| p.name()).collect()
    }

    /// Fresh processors feeding `output`
    pub(crate) fn instantiate(&self, output: Box<dyn PipelineOut>) -> Chain {
        Chain {
            processors: self.prototypes.iter().map(|p| p.fresh()).collect(),
            output,
        }
    }
}

/// Live processors of one run, ending in an output
pub(crate) struct Chain {
    processors: Vec<Box<dyn Processor>>,
    output: Box<dyn PipelineOut>,
}

impl Chain {
    pub(crate) fn push(&mut self, event: Event) -> PipelineResult<()> {
        push(&mut self.processors, self.output.as_mut(), event)
    }

    /// Flush each processor in order, then the output
    pub(crate) fn flush(&mut self) -> PipelineResult<()> {
        flush(&mut self.processors, self.output.as_mut())
    }
}

fn push(
    processors: &mut [Box<dyn Processor>],
    output: &mut dyn PipelineOut,
    event: Event,
) -> PipelineResult<()> {
    match processors.split_first_mut() {
        None => output.add_event(event),
        Some((head, rest)) => {
            let mut sink = |e: Event| push(&mut *rest, &mut *output, e);
            let mut emitter = Emitter::new(&mut sink);
            head.add_event(event, &mut emitter)
        }
    }
}

fn flush(processors: &mut [Box<dyn Processor>], output: &mut dyn PipelineOut) -> PipelineResult<()> {
    match processors.split_first_mut() {
        None => output.flush(),
        Some((head, rest)) => {
            {
                let mut sink = |e: Event| push(&mut *rest, &mut *output, e);
                let mut emitter = Emitter::new(&mut sink);
                head.flush(&mut emitter)?;
            }
            flush(rest, output)
        }
    }
}

/// Pulls a bounded source through a freshly instantiated chain
pub struct Runner {
    collection: Collection,
    chain: Chain,
}

impl Runner {
    pub fn new(pipeline: &Pipeline, output: Output) -> PipelineResult<Self> {
        let collection = match pipeline.source() {
            Some(Source::Bounded(collection)) => collection.clone(),
            Some(Source::Stream(_)) => return Err(PipelineError::RequiresBounded("Runner")),
            None => return Err(PipelineError::NoSource),
        };
        let plan = ExecutionPlan::compile(pipeline);
        tracing::debug!(
            processors = plan.len(),
            events = collection.size(),
            "compiled pipeline"
        );
        let chain = plan.instantiate(output.into_sink(pipeline.config()));
        Ok(Self { collection, chain })
    }

    /// Push every source event, then flush unless `force_flush` is false
    pub fn start(mut self, force_flush: bool) -> PipelineResult<()> {
        for event in self.collection.events() {
            self.chain.push(event.clone())?;
        }
        if force_flush {
            self.chain.flush()?;
        }
        Ok(())
    }
}
