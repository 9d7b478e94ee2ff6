//! Offset: add a constant to numeric fields

use serde_json::Value;

use super::{Emitter, Processor};
use crate::event::{field_spec, Data, Event, FieldPath};
use crate::event::path::nested_set;
use crate::pipeline::error::PipelineResult;

/// Adds `by` to each selected field
///
/// The emitted event keeps only the selected fields. Non-numeric values are
/// carried over unchanged.
#[derive(Debug, Clone)]
pub struct Offset {
    by: f64,
    fields: Vec<FieldPath>,
}

impl Offset {
    pub fn new(by: f64, fields: Option<Vec<FieldPath>>) -> Self {
        Self {
            by,
            fields: fields.unwrap_or_else(|| field_spec(["value"])),
        }
    }
}

impl Processor for Offset {
    fn name(&self) -> &'static str {
        "offset"
    }

    fn fresh(&self) -> Box<dyn Processor> {
        Box::new(self.clone())
    }

    fn add_event(&mut self, event: Event, out: &mut Emitter<'_>) -> PipelineResult<()> {
        if !out.has_observers() {
            return Ok(());
        }
        let mut data = Data::new();
        for field in &self.fields {
            let shifted = match event.get_path(field) {
                Some(Value::Number(n)) => n
                    .as_f64()
                    .map(|v| Value::from(v + self.by))
                    .unwrap_or(Value::Null),
                Some(other) => other.clone(),
                None => continue,
            };
            nested_set(&mut data, field, shifted);
        }
        out.emit(event.set_data(data))
    }
}
