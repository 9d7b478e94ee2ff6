//! Mapper: transform each event with a user function

use std::rc::Rc;

use super::{Emitter, Processor};
use crate::event::Event;
use crate::pipeline::error::PipelineResult;

/// Event-to-event transform
pub type MapFn = Rc<dyn Fn(&Event) -> Event>;

#[derive(Clone)]
pub struct Mapper {
    op: MapFn,
}

impl Mapper {
    pub fn new<F>(op: F) -> Self
    where
        F: Fn(&Event) -> Event + 'static,
    {
        Self { op: Rc::new(op) }
    }

    pub fn from_fn(op: MapFn) -> Self {
        Self { op }
    }
}

impl Processor for Mapper {
    fn name(&self) -> &'static str {
        "mapper"
    }

    fn fresh(&self) -> Box<dyn Processor> {
        Box::new(self.clone())
    }

    fn add_event(&mut self, event: Event, out: &mut Emitter<'_>) -> PipelineResult<()> {
        if !out.has_observers() {
            return Ok(());
        }
        out.emit((self.op)(&event))
    }
}
