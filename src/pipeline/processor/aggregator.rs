//! Aggregator: reduce each window/group collection into one event
//!
//! Events are gathered by a [`Collector`] configured from the pipeline's
//! window, grouping and emit policy. Each collection the collector releases
//! becomes one event: indexed by its window key, or ranged over the
//! collection's extents for the global window.

use serde_json::Value;

use super::{Emitter, Processor};
use crate::event::path::nested_set;
use crate::event::{Data, Event, FieldPath};
use crate::pipeline::collector::{Collector, WindowedCollection};
use crate::pipeline::error::{PipelineResult, ProcessorError};
use crate::pipeline::window::WindowConfig;
use crate::reducer::Reducer;
use crate::time::Index;

/// One output column: `output = reducer(input values)`
#[derive(Debug, Clone)]
pub struct AggregateField {
    pub output: String,
    pub input: FieldPath,
    pub reducer: Reducer,
}

impl AggregateField {
    pub fn new(output: impl Into<String>, input: impl Into<FieldPath>, reducer: Reducer) -> Self {
        Self {
            output: output.into(),
            input: input.into(),
            reducer,
        }
    }
}

#[derive(Debug)]
pub struct Aggregator {
    fields: Vec<AggregateField>,
    config: WindowConfig,
    collector: Collector,
}

impl Aggregator {
    pub fn new(fields: Vec<AggregateField>, config: WindowConfig) -> PipelineResult<Self> {
        if fields.is_empty() {
            return Err(ProcessorError::invalid("aggregator", "no fields to aggregate").into());
        }
        Ok(Self {
            collector: Collector::new(config.clone()),
            fields,
            config,
        })
    }

    fn to_event(&self, windowed: &WindowedCollection) -> PipelineResult<Option<Event>> {
        let collection = &windowed.collection;
        let mut data = Data::new();
        for field in &self.fields {
            let values: Vec<Value> = collection
                .events()
                .map(|e| e.get_path(&field.input).cloned().unwrap_or(Value::Null))
                .collect();
            nested_set(&mut data, &FieldPath::parse(&field.output), field.reducer.reduce(&values));
        }

        if self.config.window.is_global() {
            let Some(range) = collection.range() else {
                return Ok(None);
            };
            Ok(Some(Event::with_range(range, data)))
        } else {
            let index = Index::with_utc(windowed.window_key.as_str(), self.config.utc)?;
            Ok(Some(Event::with_index(index, data)))
        }
    }

    fn emit_all(&self, released: Vec<WindowedCollection>, out: &mut Emitter<'_>) -> PipelineResult<()> {
        for windowed in &released {
            if let Some(event) = self.to_event(windowed)? {
                out.emit(event)?;
            }
        }
        Ok(())
    }
}

impl Processor for Aggregator {
    fn name(&self) -> &'static str {
        "aggregator"
    }

    fn fresh(&self) -> Box<dyn Processor> {
        Box::new(Aggregator {
            fields: self.fields.clone(),
            config: self.config.clone(),
            collector: Collector::new(self.config.clone()),
        })
    }

    fn add_event(&mut self, event: Event, out: &mut Emitter<'_>) -> PipelineResult<()> {
        if !out.has_observers() {
            return Ok(());
        }
        let released = self.collector.add_event(event)?;
        self.emit_all(released, out)
    }

    fn flush(&mut self, out: &mut Emitter<'_>) -> PipelineResult<()> {
        if !out.has_observers() {
            return Ok(());
        }
        let released = self.collector.flush();
        tracing::debug!(collections = released.len(), "aggregator flush");
        self.emit_all(released, out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventType;
    use crate::pipeline::processor::testing::{run, run_unflushed};
    use crate::pipeline::window::{EmitOn, GroupBy, Window};
    use serde_json::json;

    fn events() -> Vec<Event> {
        [(0, 1), (30_000, 3), (60_000, 5), (90_000, 7), (120_000, 9)]
            .iter()
            .map(|(ms, v)| Event::new(*ms, json!({"value": v, "kind": "x"})).unwrap())
            .collect()
    }

    fn config(window: &str, emit_on: EmitOn) -> WindowConfig {
        let mut config = WindowConfig::new();
        config.window = Window::parse(window).unwrap();
        config.emit_on = emit_on;
        config
    }

    fn fields() -> Vec<AggregateField> {
        vec![
            AggregateField::new("total", "value", Reducer::sum()),
            AggregateField::new("peak", "value", Reducer::max()),
        ]
    }

    #[test]
    fn test_requires_fields() {
        assert!(Aggregator::new(Vec::new(), WindowConfig::new()).is_err());
    }

    #[test]
    fn test_discard_emits_sealed_windows() {
        let mut agg = Aggregator::new(fields(), config("1m", EmitOn::Discard)).unwrap();
        let out = run_unflushed(&mut agg, events()).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].event_type(), EventType::Indexed);
        assert_eq!(out[0].index().map(|i| i.as_string()), Some("1m-0"));
        assert_eq!(out[0].get("total").and_then(|v| v.as_f64()), Some(4.0));
        assert_eq!(out[1].get("peak").and_then(|v| v.as_f64()), Some(7.0));
    }

    #[test]
    fn test_flush_emits_everything_once() {
        let mut agg = Aggregator::new(fields(), config("1m", EmitOn::Flush)).unwrap();
        let out = run(&mut agg, events()).unwrap();
        let totals: Vec<f64> = out
            .iter()
            .filter_map(|e| e.get("total").and_then(|v| v.as_f64()))
            .collect();
        assert_eq!(totals, vec![4.0, 12.0, 9.0]);
    }

    #[test]
    fn test_global_window_is_range_event() {
        let mut agg = Aggregator::new(fields(), config("global", EmitOn::Flush)).unwrap();
        let out = run(&mut agg, events()).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].event_type(), EventType::Range);
        assert_eq!(out[0].begin().timestamp_millis(), 0);
        assert_eq!(out[0].end().timestamp_millis(), 120_000);
        assert_eq!(out[0].get("total").and_then(|v| v.as_f64()), Some(25.0));
    }

    #[test]
    fn test_grouped_output() {
        let mut cfg = config("global", EmitOn::Flush);
        cfg.group_by = GroupBy::from("kind");
        let mut agg = Aggregator::new(fields(), cfg).unwrap();
        let out = run(&mut agg, events()).unwrap();
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_fresh_drops_state() {
        let mut agg = Aggregator::new(fields(), config("1m", EmitOn::Flush)).unwrap();
        run_unflushed(&mut agg, events()).unwrap();
        let mut fresh = agg.fresh();
        let out = run(fresh.as_mut(), Vec::new()).unwrap();
        assert!(out.is_empty());
    }
}
