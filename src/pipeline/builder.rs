//! Pipeline builder
//!
//! A [`Pipeline`] is an immutable description: every chain call returns a new
//! pipeline that shares the existing processor nodes and appends one more.
//! Nothing runs until [`Pipeline::to`] (or one of its shorthands) is called.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use super::collector::WindowedCollection;
use super::error::{PipelineError, PipelineResult};
use super::io::{Output, Source};
use super::processor::{
    AggregateField, Aggregator, Align, AlignOptions, Collapser, ConvertOptions, Converter,
    FillOptions, Filler, Filter, Mapper, Offset, Processor, Rate, RateOptions, Selector, Taker,
};
use super::runner::{ExecutionPlan, Runner};
use super::window::{EmitOn, GroupBy, Window, WindowConfig};
use crate::collection::Collection;
use crate::event::{field_spec, Event, EventType, FieldPath};
use crate::reducer::Reducer;

/// A processor prototype and the node feeding it
#[derive(Clone)]
pub(crate) struct ProcessorNode {
    pub(crate) prototype: Rc<dyn Processor>,
    pub(crate) prev: Option<usize>,
}

/// Chainable description of a processing pipeline
///
/// ```text
/// Pipeline::new()
///     .from_source(&series)        batch (Collection) or stream (Stream)
///     .window_by("5m")?            settings read by later stages
///     .emit_on("discard")?
///     .aggregate([..])?            processor nodes
///     .as_events(..)?
///     .to_event_list()?            run
/// ```
#[derive(Clone, Default)]
pub struct Pipeline {
    source: Option<Source>,
    config: WindowConfig,
    nodes: Rc<Vec<ProcessorNode>>,
    last: Option<usize>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self {
            config: WindowConfig::new(),
            ..Default::default()
        }
    }

    // ============================================
    // Settings
    // ============================================

    /// Batch source (Collection, TimeSeries) or stream source
    pub fn from_source(mut self, source: impl Into<Source>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// `global`, `daily`, `monthly`, `yearly` or a duration such as `5m`
    pub fn window_by(self, window: &str) -> PipelineResult<Self> {
        self.window_by_utc(window, true)
    }

    /// Like [`window_by`](Self::window_by), choosing the calendar zone.
    /// Fixed windows are always resolved in UTC.
    pub fn window_by_utc(mut self, window: &str, utc: bool) -> PipelineResult<Self> {
        let window = Window::parse(window)?;
        self.config.utc = window.is_fixed() || utc;
        self.config.window = window;
        Ok(self)
    }

    pub fn clear_window(mut self) -> Self {
        self.config.window = Window::Global;
        self.config.utc = true;
        self
    }

    /// Group by a field path, or a closure via [`GroupBy::func`]
    pub fn group_by(mut self, group_by: impl Into<GroupBy>) -> Self {
        self.config.group_by = group_by.into();
        self
    }

    pub fn clear_group_by(mut self) -> Self {
        self.config.group_by = GroupBy::None;
        self
    }

    /// `eachEvent`, `discard` or `flush`
    pub fn emit_on(mut self, emit_on: &str) -> PipelineResult<Self> {
        self.config.emit_on = emit_on.parse::<EmitOn>()?;
        Ok(self)
    }

    pub fn source(&self) -> Option<&Source> {
        self.source.as_ref()
    }

    pub fn config(&self) -> &WindowConfig {
        &self.config
    }

    pub fn window(&self) -> &Window {
        &self.config.window
    }

    pub fn get_emit_on(&self) -> EmitOn {
        self.config.emit_on
    }

    pub fn get_utc(&self) -> bool {
        self.config.utc
    }

    /// `batch`, `stream`, or `None` before a source is set
    pub fn mode(&self) -> Option<&'static str> {
        self.source.as_ref().map(Source::mode)
    }

    pub(crate) fn nodes(&self) -> &[ProcessorNode] {
        &self.nodes
    }

    pub(crate) fn last_node(&self) -> Option<usize> {
        self.last
    }

    // ============================================
    // Processors
    // ============================================

    fn append(mut self, processor: impl Processor + 'static) -> Self {
        let mut nodes = (*self.nodes).clone();
        nodes.push(ProcessorNode {
            prototype: Rc::new(processor),
            prev: self.last,
        });
        self.last = Some(nodes.len() - 1);
        self.nodes = Rc::new(nodes);
        self
    }

    /// Add `by` to each field (defaults to `value`)
    pub fn offset_by(self, by: f64, fields: Option<Vec<FieldPath>>) -> Self {
        self.append(Offset::new(by, fields))
    }

    /// Reduce each window/group into one event
    ///
    /// `fields` is a list of `(output name, input path, reducer)`.
    pub fn aggregate<I, S, P>(self, fields: I) -> PipelineResult<Self>
    where
        I: IntoIterator<Item = (S, P, Reducer)>,
        S: Into<String>,
        P: Into<FieldPath>,
    {
        let fields: Vec<AggregateField> = fields
            .into_iter()
            .map(|(output, input, reducer)| AggregateField::new(output, input, reducer))
            .collect();
        if fields.is_empty() {
            return Err(PipelineError::InvalidOption(
                "aggregate needs at least one field".to_string(),
            ));
        }
        if matches!(self.source, Some(Source::Stream(_))) && self.config.window.is_global() {
            return Err(PipelineError::InvalidOption(
                "streaming aggregation needs a window".to_string(),
            ));
        }
        let aggregator = Aggregator::new(fields, self.config.clone())?;
        Ok(self.append(aggregator))
    }

    pub fn as_events(self, options: ConvertOptions) -> PipelineResult<Self> {
        let converter = Converter::new(EventType::Point, options)?;
        Ok(self.append(converter))
    }

    pub fn as_time_range_events(self, options: ConvertOptions) -> PipelineResult<Self> {
        let converter = Converter::new(EventType::Range, options)?;
        Ok(self.append(converter))
    }

    pub fn as_indexed_events(self, options: ConvertOptions) -> PipelineResult<Self> {
        let converter = Converter::new(EventType::Indexed, options)?;
        Ok(self.append(converter))
    }

    pub fn map<F>(self, op: F) -> Self
    where
        F: Fn(&Event) -> Event + 'static,
    {
        self.append(Mapper::new(op))
    }

    pub fn filter<F>(self, predicate: F) -> Self
    where
        F: Fn(&Event) -> bool + 'static,
    {
        self.append(Filter::new(predicate))
    }

    /// Keep only the listed fields
    pub fn select<I, P>(self, fields: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<FieldPath>,
    {
        self.append(Selector::new(field_spec(fields)))
    }

    /// Reduce several fields into `name`, keeping the rest when `append`
    pub fn collapse<I, P>(self, fields: I, name: &str, reducer: Reducer, append: bool) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<FieldPath>,
    {
        self.append(Collapser::new(field_spec(fields), name, reducer, append))
    }

    /// Pass at most `limit` events per window/group
    pub fn take(self, limit: usize) -> Self {
        let taker = Taker::new(limit, self.config.clone());
        self.append(taker)
    }

    pub fn fill(self, options: FillOptions) -> PipelineResult<Self> {
        let filler = Filler::new(options)?;
        Ok(self.append(filler))
    }

    pub fn align(self, options: AlignOptions) -> PipelineResult<Self> {
        let align = Align::new(options)?;
        Ok(self.append(align))
    }

    pub fn rate(self, options: RateOptions) -> PipelineResult<Self> {
        let rate = Rate::new(options)?;
        Ok(self.append(rate))
    }

    // ============================================
    // Evaluation
    // ============================================

    /// Run the pipeline into `output`
    ///
    /// A bounded source runs to completion and is flushed. A stream source
    /// subscribes a fresh chain; events flow as the caller pushes them.
    pub fn to(&self, output: Output) -> PipelineResult<()> {
        match &self.source {
            None => Err(PipelineError::NoSource),
            Some(Source::Bounded(_)) => Runner::new(self, output)?.start(true),
            Some(Source::Stream(stream)) => {
                let plan = ExecutionPlan::compile(self);
                tracing::debug!(processors = plan.len(), "subscribing pipeline to stream");
                stream.subscribe(plan.instantiate(output.into_sink(&self.config)));
                Ok(())
            }
        }
    }

    pub fn to_event_callback<F>(&self, callback: F) -> PipelineResult<()>
    where
        F: FnMut(Event) + 'static,
    {
        self.to(Output::events(callback))
    }

    pub fn to_collection_callback<F>(&self, callback: F) -> PipelineResult<()>
    where
        F: FnMut(WindowedCollection) + 'static,
    {
        self.to(Output::collections(callback))
    }

    /// Run a bounded pipeline and return its output events
    pub fn to_event_list(&self) -> PipelineResult<Vec<Event>> {
        self.require_bounded("to_event_list")?;
        let results = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&results);
        self.to(Output::events(move |event| sink.borrow_mut().push(event)))?;
        let events = std::mem::take(&mut *results.borrow_mut());
        Ok(events)
    }

    /// Run a bounded pipeline and return its output collections keyed by
    /// `window--group` (or `all`)
    pub fn to_keyed_collections(&self) -> PipelineResult<BTreeMap<String, Collection>> {
        self.require_bounded("to_keyed_collections")?;
        let results = Rc::new(RefCell::new(BTreeMap::new()));
        let sink = Rc::clone(&results);
        self.to(Output::collections(move |windowed: WindowedCollection| {
            sink.borrow_mut()
                .insert(windowed.output_key(), windowed.collection);
        }))?;
        let collections = std::mem::take(&mut *results.borrow_mut());
        Ok(collections)
    }

    /// Run a bounded pipeline and return its output collections in the
    /// order they were released, each with its `window--group` key
    pub fn to_collection_list(&self) -> PipelineResult<Vec<(String, Collection)>> {
        self.require_bounded("to_collection_list")?;
        let results = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&results);
        self.to(Output::collections(move |windowed: WindowedCollection| {
            sink.borrow_mut()
                .push((windowed.output_key(), windowed.collection));
        }))?;
        let collections = std::mem::take(&mut *results.borrow_mut());
        Ok(collections)
    }

    fn require_bounded(&self, op: &'static str) -> PipelineResult<()> {
        match &self.source {
            None => Err(PipelineError::NoSource),
            Some(Source::Stream(_)) => Err(PipelineError::RequiresBounded(op)),
            Some(Source::Bounded(_)) => Ok(()),
        }
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let chain: Vec<&'static str> = ExecutionPlan::compile(self).names();
        f.debug_struct("Pipeline")
            .field("mode", &self.mode())
            .field("config", &self.config)
            .field("processors", &chain)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::io::Stream;
    use crate::pipeline::processor::{AlignMethod, Alignment, FillMethod};
    use crate::series::TimeSeries;
    use serde_json::{json, Value};

    fn points(rows: &[(i64, Value)]) -> Collection {
        let events = rows
            .iter()
            .map(|(ms, v)| Event::new(*ms, json!({"value": v})).unwrap())
            .collect();
        Collection::from_events(events).unwrap()
    }

    fn simple_gap_data() -> Collection {
        points(&[
            (1_471_824_030_000, json!(0.75)),
            (1_471_824_105_000, json!(2)),
            (1_471_824_210_000, json!(1)),
            (1_471_824_390_000, json!(1)),
            (1_471_824_510_000, json!(3)),
            (1_471_824_525_000, json!(5)),
        ])
    }

    fn values(events: &[Event], field: &str) -> Vec<Option<f64>> {
        events
            .iter()
            .map(|e| e.get(field).and_then(Value::as_f64))
            .collect()
    }

    #[test]
    fn test_settings_are_validated() {
        assert!(Pipeline::new().window_by("fortnight").is_err());
        assert_eq!(
            Pipeline::new().emit_on("sometimes").err(),
            Some(PipelineError::UnknownEmitOn("sometimes".to_string()))
        );
        let p = Pipeline::new().window_by_utc("daily", false).unwrap();
        assert!(!p.get_utc());
        let p = Pipeline::new().window_by_utc("1h", false).unwrap();
        assert!(p.get_utc());
        assert_eq!(p.clear_window().window(), &Window::Global);
    }

    #[test]
    fn test_chain_calls_do_not_mutate() {
        let base = Pipeline::new().from_source(simple_gap_data());
        let taken = base.clone().take(2);
        assert_eq!(base.to_event_list().unwrap().len(), 6);
        assert_eq!(taken.to_event_list().unwrap().len(), 2);
        assert_eq!(base.mode(), Some("batch"));
    }

    #[test]
    fn test_align_then_rate() {
        let rows = points(&[(89_000, json!(100)), (181_000, json!(200))]);
        let out = Pipeline::new()
            .from_source(rows)
            .align(AlignOptions::new().window("30s"))
            .unwrap()
            .rate(RateOptions::new())
            .unwrap()
            .to_event_list()
            .unwrap();
        assert_eq!(out.len(), 3);
        for rate in values(&out, "value_rate") {
            let rate = rate.unwrap();
            assert!((rate - 1.0869565217391304).abs() < 1e-9);
        }
    }

    #[test]
    fn test_align_linear_with_limit() {
        let out = Pipeline::new()
            .from_source(simple_gap_data())
            .align(AlignOptions::new().window("1m").method(AlignMethod::Linear).limit(2))
            .unwrap()
            .to_event_list()
            .unwrap();
        let got = values(&out, "value");
        assert_eq!(got.len(), 8);
        assert_eq!(got[3..6], [None, None, None]);
        assert_eq!(got[6], Some(1.5));
    }

    #[test]
    fn test_fill_chain_for_two_fields() {
        let events = vec![
            Event::new(0, json!({"a": 1, "b": 10})).unwrap(),
            Event::new(1000, json!({"a": null, "b": null})).unwrap(),
            Event::new(2000, json!({"a": 3, "b": 30})).unwrap(),
        ];
        let out = Pipeline::new()
            .from_source(Collection::from_events(events).unwrap())
            .fill(FillOptions::new().method(FillMethod::Linear).field_spec(["a"]))
            .unwrap()
            .fill(FillOptions::new().method(FillMethod::Linear).field_spec(["b"]))
            .unwrap()
            .to_event_list()
            .unwrap();
        assert_eq!(values(&out, "a"), vec![Some(1.0), Some(2.0), Some(3.0)]);
        assert_eq!(values(&out, "b"), vec![Some(10.0), Some(20.0), Some(30.0)]);
    }

    #[test]
    fn test_rollup_to_points() {
        let hourly = points(&[
            (0, json!(1)),
            (1_800_000, json!(2)),
            (3_600_000, json!(3)),
            (5_400_000, json!(4)),
        ]);
        let out = Pipeline::new()
            .from_source(hourly)
            .window_by("1h")
            .unwrap()
            .emit_on("flush")
            .unwrap()
            .aggregate([("value", "value", Reducer::avg())])
            .unwrap()
            .as_events(ConvertOptions::new().alignment(Alignment::Lag))
            .unwrap()
            .to_event_list()
            .unwrap();
        assert_eq!(values(&out, "value"), vec![Some(1.5), Some(3.5)]);
        assert_eq!(out[1].timestamp_ms(), 3_600_000);
    }

    #[test]
    fn test_keyed_collections() {
        let events = vec![
            Event::new(0, json!({"value": 1, "host": "a"})).unwrap(),
            Event::new(1000, json!({"value": 2, "host": "b"})).unwrap(),
            Event::new(61_000, json!({"value": 3, "host": "a"})).unwrap(),
        ];
        let collections = Pipeline::new()
            .from_source(Collection::from_events(events.clone()).unwrap())
            .window_by("1m")
            .unwrap()
            .group_by("host")
            .emit_on("flush")
            .unwrap()
            .to_keyed_collections()
            .unwrap();
        let keys: Vec<&String> = collections.keys().collect();
        assert_eq!(keys, vec!["1m-0--a", "1m-0--b", "1m-1--a"]);

        let all = Pipeline::new()
            .from_source(Collection::from_events(events).unwrap())
            .emit_on("flush")
            .unwrap()
            .to_keyed_collections()
            .unwrap();
        assert_eq!(all.get("all").map(Collection::size), Some(3));
    }

    #[test]
    fn test_collection_list_in_release_order() {
        let rows: Vec<(i64, Value)> = (0..11).map(|i| (i * 60_000, json!(i))).collect();
        let collections = Pipeline::new()
            .from_source(points(&rows))
            .window_by("1m")
            .unwrap()
            .emit_on("discard")
            .unwrap()
            .to_collection_list()
            .unwrap();
        let keys: Vec<&str> = collections.iter().map(|(key, _)| key.as_str()).collect();
        assert_eq!(keys.len(), 11);
        assert_eq!(keys[9], "1m-9");
        assert_eq!(keys[10], "1m-10");
        assert!(collections.iter().all(|(_, c)| c.size() == 1));
    }

    #[test]
    fn test_stream_aggregation() {
        let stream = Stream::new();
        let results = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&results);
        Pipeline::new()
            .from_source(&stream)
            .window_by("1m")
            .unwrap()
            .emit_on("discard")
            .unwrap()
            .aggregate([("total", "value", Reducer::sum())])
            .unwrap()
            .to_event_callback(move |e| sink.borrow_mut().push(e))
            .unwrap();

        for (ms, v) in [(0, 1), (30_000, 2), (60_000, 3), (90_000, 4), (120_000, 5)] {
            stream.add_event(Event::new(ms, json!(v)).unwrap()).unwrap();
        }
        assert_eq!(values(&results.borrow(), "total"), vec![Some(3.0), Some(7.0)]);

        stream.stop().unwrap();
        assert!(!stream.is_running());
        assert_eq!(results.borrow().len(), 3);

        stream.add_event(Event::new(180_000, json!(6)).unwrap()).unwrap();
        assert_eq!(results.borrow().len(), 3);
    }

    #[test]
    fn test_stream_rejects_mixed_events() {
        let stream = Stream::new();
        stream.add_event(Event::new(0, json!(1)).unwrap()).unwrap();
        let indexed = Event::indexed("1h-1", true, json!(1)).unwrap();
        assert!(matches!(
            stream.add_event(indexed),
            Err(PipelineError::MixedEventTypes { .. })
        ));
    }

    #[test]
    fn test_stream_global_aggregate_rejected() {
        let stream = Stream::new();
        let err = Pipeline::new()
            .from_source(&stream)
            .aggregate([("total", "value", Reducer::sum())])
            .err();
        assert!(matches!(err, Some(PipelineError::InvalidOption(_))));
        assert!(Pipeline::new()
            .from_source(&stream)
            .to_event_list()
            .is_err());
    }

    #[test]
    fn test_from_timeseries() {
        let series = TimeSeries::from_collection("traffic", simple_gap_data()).unwrap();
        let out = Pipeline::new()
            .from_source(&series)
            .offset_by(1.0, None)
            .to_event_list()
            .unwrap();
        assert_eq!(out[0].value().and_then(Value::as_f64), Some(1.75));
    }
}
