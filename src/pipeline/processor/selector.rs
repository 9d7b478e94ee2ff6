//! Selector: keep only some fields

use super::{Emitter, Processor};
use crate::event::{Event, FieldPath};
use crate::pipeline::error::PipelineResult;

#[derive(Debug, Clone)]
pub struct Selector {
    fields: Vec<FieldPath>,
}

impl Selector {
    pub fn new(fields: Vec<FieldPath>) -> Self {
        Self { fields }
    }
}

impl Processor for Selector {
    fn name(&self) -> &'static str {
        "selector"
    }

    fn fresh(&self) -> Box<dyn Processor> {
        Box::new(self.clone())
    }

    fn add_event(&mut self, event: Event, out: &mut Emitter<'_>) -> PipelineResult<()> {
        if !out.has_observers() {
            return Ok(());
        }
        out.emit(Event::selector(&event, &self.fields))
    }
}
