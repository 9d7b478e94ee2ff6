//! Collapser: reduce several fields of one event into a new field

use super::{Emitter, Processor};
use crate::event::{Event, FieldPath};
use crate::pipeline::error::PipelineResult;
use crate::reducer::Reducer;

#[derive(Debug, Clone)]
pub struct Collapser {
    fields: Vec<FieldPath>,
    name: String,
    reducer: Reducer,
    append: bool,
}

impl Collapser {
    pub fn new(fields: Vec<FieldPath>, name: impl Into<String>, reducer: Reducer, append: bool) -> Self {
        Self {
            fields,
            name: name.into(),
            reducer,
            append,
        }
    }
}

impl Processor for Collapser {
    fn name(&self) -> &'static str {
        "collapser"
    }

    fn fresh(&self) -> Box<dyn Processor> {
        Box::new(self.clone())
    }

    fn add_event(&mut self, event: Event, out: &mut Emitter<'_>) -> PipelineResult<()> {
        if !out.has_observers() {
            return Ok(());
        }
        out.emit(event.collapse(&self.fields, &self.name, &self.reducer, self.append))
    }
}
