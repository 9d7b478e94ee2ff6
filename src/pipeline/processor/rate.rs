//! Rate: per-second derivative between consecutive points
//!
//! Each pair of consecutive point events yields one range event spanning
//! them, with `<field>_rate` set to the change per second.

use serde_json::Value;

use super::{Emitter, Processor};
use crate::error::Warning;
use crate::event::path::nested_set;
use crate::event::{field_spec, Data, Event, EventType, FieldPath};
use crate::pipeline::error::{PipelineResult, ProcessorError};
use crate::time::TimeRange;

#[derive(Debug, Clone)]
pub struct RateOptions {
    pub field_spec: Vec<FieldPath>,
    /// When false, negative rates (counter resets) become null
    pub allow_negative: bool,
}

impl Default for RateOptions {
    fn default() -> Self {
        Self {
            field_spec: field_spec(["value"]),
            allow_negative: true,
        }
    }
}

impl RateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field_spec<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<FieldPath>,
    {
        self.field_spec = field_spec(paths);
        self
    }

    pub fn allow_negative(mut self, allow: bool) -> Self {
        self.allow_negative = allow;
        self
    }
}

#[derive(Debug, Clone)]
pub struct Rate {
    options: RateOptions,
    previous: Option<Event>,
}

impl Rate {
    pub fn new(options: RateOptions) -> PipelineResult<Self> {
        if options.field_spec.is_empty() {
            return Err(ProcessorError::invalid("rate", "field spec is empty").into());
        }
        Ok(Self {
            options,
            previous: None,
        })
    }

    fn rate_for(&self, field: &FieldPath, previous: &Event, current: &Event, delta_ms: i64) -> Value {
        let (Some(prev), Some(curr)) = (previous.get_path(field), current.get_path(field)) else {
            return Value::Null;
        };
        let (Some(p), Some(c)) = (prev.as_f64(), curr.as_f64()) else {
            if !prev.is_null() && !curr.is_null() {
                Warning::NonNumericValue {
                    context: "rate",
                    path: field.to_dotted(),
                }
                .emit();
            }
            return Value::Null;
        };
        if delta_ms == 0 {
            Warning::ZeroDuration {
                context: "rate",
                at: current.timestamp_ms(),
            }
            .emit();
            return Value::Null;
        }

        let rate = (c - p) / (delta_ms as f64 / 1000.0);
        if !self.options.allow_negative && rate < 0.0 {
            Value::Null
        } else {
            Value::from(rate)
        }
    }
}

impl Processor for Rate {
    fn name(&self) -> &'static str {
        "rate"
    }

    fn fresh(&self) -> Box<dyn Processor> {
        Box::new(Rate {
            options: self.options.clone(),
            previous: None,
        })
    }

    fn add_event(&mut self, event: Event, out: &mut Emitter<'_>) -> PipelineResult<()> {
        if !out.has_observers() {
            return Ok(());
        }
        if event.event_type() != EventType::Point {
            return Err(ProcessorError::UnsupportedEvent {
                processor: "rate",
                event_type: event.event_type(),
            }
            .into());
        }

        let Some(previous) = self.previous.replace(event.clone()) else {
            return Ok(());
        };

        let delta_ms = event.timestamp_ms() - previous.timestamp_ms();
        let mut data = Data::new();
        for field in &self.options.field_spec {
            let rate = self.rate_for(field, &previous, &event, delta_ms);
            nested_set(&mut data, &field.with_suffix("_rate"), rate);
        }
        let range = TimeRange::new(previous.timestamp(), event.timestamp())
            .map_err(ProcessorError::from)?;
        out.emit(Event::with_range(range, data))
    }
}
