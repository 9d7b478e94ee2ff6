//! Filter: drop events failing a predicate

use std::rc::Rc;

use super::{Emitter, Processor};
use crate::event::Event;
use crate::pipeline::error::PipelineResult;

pub type PredicateFn = Rc<dyn Fn(&Event) -> bool>;

#[derive(Clone)]
pub struct Filter {
    predicate: PredicateFn,
}

impl Filter {
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&Event) -> bool + 'static,
    {
        Self {
            predicate: Rc::new(predicate),
        }
    }

    pub fn from_fn(predicate: PredicateFn) -> Self {
        Self { predicate }
    }
}

impl Processor for Filter {
    fn name(&self) -> &'static str {
        "filter"
    }

    fn fresh(&self) -> Box<dyn Processor> {
        Box::new(self.clone())
    }

    fn add_event(&mut self, event: Event, out: &mut Emitter<'_>) -> PipelineResult<()> {
        if !out.has_observers() || !(self.predicate)(&event) {
            return Ok(());
        }
        out.emit(event)
    }
}
