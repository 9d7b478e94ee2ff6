//! TimeSeries: a named, chronological collection with metadata
//!
//! A [`TimeSeries`] is the user-facing wrapper around a [`Collection`]. It
//! reads and writes the JSON [wire format](wire::WireFormat) and offers the
//! common transforms (fill, align, rate, rollups) by building and running a
//! [`Pipeline`] over itself.

pub mod error;
pub mod wire;

pub use error::{TimeSeriesError, TimeSeriesResult};
pub use wire::WireFormat;

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::collection::Collection;
use crate::event::path::nested_set;
use crate::event::{field_spec, Data, Event, EventType, FieldPath};
use crate::pipeline::{
    AlignOptions, ConvertOptions, FillOptions, Pipeline, PipelineResult, RateOptions,
};
use crate::reducer::{Interpolation, Reducer};
use crate::time::{Index, TimeRange};

/// Named, chronologically ordered series of events
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    name: String,
    index: Option<Index>,
    utc: bool,
    meta: Map<String, Value>,
    collection: Collection,
}

impl TimeSeries {
    // ============================================
    // Construction
    // ============================================

    /// Build from a wire-format structure
    pub fn from_wire(wire: WireFormat) -> TimeSeriesResult<Self> {
        let (key_column, fields) = wire
            .columns
            .split_first()
            .ok_or_else(|| TimeSeriesError::Wire("no columns".to_string()))?;
        let event_type = EventType::from_column(key_column)
            .ok_or_else(|| TimeSeriesError::BadColumn(key_column.clone()))?;

        let mut events = Vec::with_capacity(wire.points.len());
        for (row, point) in wire.points.iter().enumerate() {
            events.push(point_to_event(event_type, fields, point, wire.utc, row)?);
        }

        let index = wire
            .index
            .map(|s| Index::with_utc(s, wire.utc))
            .transpose()?;

        Self::build(wire.name, index, wire.utc, wire.meta, Collection::from_events(events)?)
    }

    /// Build from a parsed JSON wire-format value
    pub fn from_json_value(value: Value) -> TimeSeriesResult<Self> {
        let wire: WireFormat =
            serde_json::from_value(value).map_err(|e| TimeSeriesError::Wire(e.to_string()))?;
        Self::from_wire(wire)
    }

    /// Build from a JSON wire-format string
    pub fn from_json_str(s: &str) -> TimeSeriesResult<Self> {
        let wire: WireFormat =
            serde_json::from_str(s).map_err(|e| TimeSeriesError::Wire(e.to_string()))?;
        Self::from_wire(wire)
    }

    pub fn from_events(name: impl Into<String>, events: Vec<Event>) -> TimeSeriesResult<Self> {
        Self::from_collection(name, Collection::from_events(events)?)
    }

    pub fn from_collection(name: impl Into<String>, collection: Collection) -> TimeSeriesResult<Self> {
        Self::build(name.into(), None, true, Map::new(), collection)
    }

    fn build(
        name: String,
        index: Option<Index>,
        utc: bool,
        meta: Map<String, Value>,
        collection: Collection,
    ) -> TimeSeriesResult<Self> {
        if !collection.is_chronological() {
            return Err(TimeSeriesError::NotChronological);
        }
        Ok(Self {
            name,
            index,
            utc,
            meta,
            collection,
        })
    }

    /// Same metadata over a different collection
    pub fn set_collection(&self, collection: Collection) -> TimeSeriesResult<Self> {
        Self::build(
            self.name.clone(),
            self.index.clone(),
            self.utc,
            self.meta.clone(),
            collection,
        )
    }

    pub fn set_name(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    /// Set one metadata key; `name` and `utc` update the dedicated fields
    pub fn set_meta(&self, key: &str, value: Value) -> TimeSeriesResult<Self> {
        let mut next = self.clone();
        match (key, value) {
            ("name", Value::String(name)) => next.name = name,
            ("utc", Value::Bool(utc)) => next.utc = utc,
            ("index", Value::String(index)) => next.index = Some(Index::with_utc(index, self.utc)?),
            (key, value) => {
                next.meta.insert(key.to_string(), value);
            }
        }
        Ok(next)
    }

    // ============================================
    // Serialization
    // ============================================

    pub fn to_wire(&self) -> WireFormat {
        let key_column = self
            .collection
            .event_type()
            .unwrap_or(EventType::Point)
            .column_name();
        let fields = self.collection.columns();

        let mut columns = Vec::with_capacity(fields.len() + 1);
        columns.push(key_column.to_string());
        columns.extend(fields.iter().cloned());

        WireFormat {
            name: self.name.clone(),
            columns,
            points: self.collection.events().map(|e| e.to_point(&fields)).collect(),
            index: self.index.as_ref().map(|i| i.as_string().to_string()),
            utc: self.utc,
            meta: self.meta.clone(),
        }
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self.to_wire()).unwrap_or(Value::Null)
    }

    // ============================================
    // Accessors
    // ============================================

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index(&self) -> Option<&Index> {
        self.index.as_ref()
    }

    pub fn index_as_string(&self) -> Option<&str> {
        self.index.as_ref().map(Index::as_string)
    }

    pub fn index_as_range(&self) -> Option<TimeRange> {
        self.index.as_ref().map(Index::as_timerange)
    }

    pub fn is_utc(&self) -> bool {
        self.utc
    }

    /// All metadata, including `name`, `utc` and `index`
    pub fn meta(&self) -> Map<String, Value> {
        let mut meta = self.meta.clone();
        meta.insert("name".to_string(), Value::from(self.name.clone()));
        meta.insert("utc".to_string(), Value::from(self.utc));
        if let Some(index) = &self.index {
            meta.insert("index".to_string(), Value::from(index.as_string()));
        }
        meta
    }

    pub fn meta_value(&self, key: &str) -> Option<Value> {
        self.meta().remove(key)
    }

    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.collection.events()
    }

    pub fn size(&self) -> usize {
        self.collection.size()
    }

    pub fn size_valid(&self, path: impl Into<FieldPath>) -> usize {
        self.collection.size_valid(path)
    }

    pub fn at(&self, pos: usize) -> TimeSeriesResult<&Event> {
        Ok(self.collection.at(pos)?)
    }

    pub fn at_time(&self, t: &DateTime<Utc>) -> Option<&Event> {
        self.collection.at_time(t)
    }

    pub fn bisect(&self, t: &DateTime<Utc>, begin: usize) -> Option<usize> {
        self.collection.bisect(t, begin)
    }

    pub fn range(&self) -> Option<TimeRange> {
        self.collection.range()
    }

    pub fn begin(&self) -> Option<DateTime<Utc>> {
        self.range().map(|r| r.begin())
    }

    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.range().map(|r| r.end())
    }

    /// Top-level data columns
    pub fn columns(&self) -> Vec<String> {
        self.collection.columns()
    }

    // ============================================
    // Derived series
    // ============================================

    pub fn slice(&self, begin: usize, end: usize) -> TimeSeriesResult<Self> {
        self.set_collection(self.collection.slice(begin, end))
    }

    pub fn clean(&self, path: impl Into<FieldPath>) -> TimeSeriesResult<Self> {
        self.set_collection(self.collection.clean(path))
    }

    pub fn collapse<I, P>(&self, fields: I, name: &str, reducer: &Reducer, append: bool) -> TimeSeriesResult<Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<FieldPath>,
    {
        let fields = field_spec(fields);
        self.set_collection(self.collection.collapse(&fields, name, reducer, append))
    }

    pub fn select<I, P>(&self, fields: I) -> TimeSeriesResult<Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<FieldPath>,
    {
        let fields = field_spec(fields);
        self.set_collection(self.collection.select(&fields))
    }

    pub fn map<F>(&self, f: F) -> TimeSeriesResult<Self>
    where
        F: Fn(&Event) -> Event,
    {
        self.set_collection(self.collection.map(f)?)
    }

    pub fn filter<F>(&self, f: F) -> TimeSeriesResult<Self>
    where
        F: Fn(&Event) -> bool,
    {
        self.set_collection(self.collection.filter(f))
    }

    /// Rename top-level data columns
    pub fn rename_columns(&self, renames: &HashMap<String, String>) -> TimeSeriesResult<Self> {
        let renamed = self.collection.map(|event| {
            let data: Data = event
                .data()
                .iter()
                .map(|(k, v)| (renames.get(k).cloned().unwrap_or_else(|| k.clone()), v.clone()))
                .collect();
            event.set_data(data)
        })?;
        self.set_collection(renamed)
    }

    // ============================================
    // Reducers
    // ============================================

    pub fn aggregate(&self, reducer: &Reducer, path: impl Into<FieldPath>) -> Value {
        self.collection.aggregate(reducer, path)
    }

    pub fn count(&self) -> usize {
        self.collection.count()
    }

    pub fn sum(&self, path: impl Into<FieldPath>) -> Value {
        self.collection.sum(path)
    }

    pub fn avg(&self, path: impl Into<FieldPath>) -> Value {
        self.collection.avg(path)
    }

    pub fn mean(&self, path: impl Into<FieldPath>) -> Value {
        self.collection.mean(path)
    }

    pub fn max(&self, path: impl Into<FieldPath>) -> Value {
        self.collection.max(path)
    }

    pub fn min(&self, path: impl Into<FieldPath>) -> Value {
        self.collection.min(path)
    }

    pub fn median(&self, path: impl Into<FieldPath>) -> Value {
        self.collection.median(path)
    }

    pub fn stdev(&self, path: impl Into<FieldPath>) -> Value {
        self.collection.stdev(path)
    }

    pub fn first(&self, path: impl Into<FieldPath>) -> Value {
        self.collection.first_value(path)
    }

    pub fn last(&self, path: impl Into<FieldPath>) -> Value {
        self.collection.last_value(path)
    }

    pub fn difference(&self, path: impl Into<FieldPath>) -> Value {
        self.collection.difference(path)
    }

    pub fn percentile(&self, q: f64, path: impl Into<FieldPath>, interp: Interpolation) -> Value {
        self.collection.percentile(q, path, interp)
    }

    pub fn quantile(
        &self,
        n: usize,
        path: impl Into<FieldPath>,
        interp: Interpolation,
    ) -> TimeSeriesResult<Vec<Value>> {
        Ok(self.collection.quantile(n, path, interp)?)
    }

    // ============================================
    // Pipeline transforms
    // ============================================

    /// A pipeline reading from this series
    pub fn pipeline(&self) -> Pipeline {
        Pipeline::new().from_source(self)
    }

    fn from_pipeline(&self, pipeline: PipelineResult<Pipeline>) -> TimeSeriesResult<Self> {
        let events = pipeline?.to_event_list()?;
        self.set_collection(Collection::from_events(events)?)
    }

    pub fn fill(&self, options: FillOptions) -> TimeSeriesResult<Self> {
        self.from_pipeline(self.pipeline().fill(options))
    }

    pub fn align(&self, options: AlignOptions) -> TimeSeriesResult<Self> {
        self.from_pipeline(self.pipeline().align(options))
    }

    pub fn rate(&self, options: RateOptions) -> TimeSeriesResult<Self> {
        self.from_pipeline(self.pipeline().rate(options))
    }

    /// Aggregate into `window` buckets, one event per bucket
    ///
    /// Buckets come out as indexed events, or as point events centred in
    /// their bucket with `to_events`.
    pub fn fixed_window_rollup<I, S, P>(&self, window: &str, fields: I, to_events: bool) -> TimeSeriesResult<Self>
    where
        I: IntoIterator<Item = (S, P, Reducer)>,
        S: Into<String>,
        P: Into<FieldPath>,
    {
        let rolled = self
            .pipeline()
            .window_by_utc(window, self.utc)?
            .emit_on("flush")?
            .aggregate(fields)?;
        let rolled = if to_events {
            rolled.as_events(ConvertOptions::new())
        } else {
            Ok(rolled)
        };
        self.from_pipeline(rolled)
    }

    pub fn hourly_rollup<I, S, P>(&self, fields: I, to_events: bool) -> TimeSeriesResult<Self>
    where
        I: IntoIterator<Item = (S, P, Reducer)>,
        S: Into<String>,
        P: Into<FieldPath>,
    {
        self.fixed_window_rollup("1h", fields, to_events)
    }

    pub fn daily_rollup<I, S, P>(&self, fields: I, to_events: bool) -> TimeSeriesResult<Self>
    where
        I: IntoIterator<Item = (S, P, Reducer)>,
        S: Into<String>,
        P: Into<FieldPath>,
    {
        self.fixed_window_rollup("daily", fields, to_events)
    }

    pub fn monthly_rollup<I, S, P>(&self, fields: I, to_events: bool) -> TimeSeriesResult<Self>
    where
        I: IntoIterator<Item = (S, P, Reducer)>,
        S: Into<String>,
        P: Into<FieldPath>,
    {
        self.fixed_window_rollup("monthly", fields, to_events)
    }

    pub fn yearly_rollup<I, S, P>(&self, fields: I, to_events: bool) -> TimeSeriesResult<Self>
    where
        I: IntoIterator<Item = (S, P, Reducer)>,
        S: Into<String>,
        P: Into<FieldPath>,
    {
        self.fixed_window_rollup("yearly", fields, to_events)
    }

    /// Split into one series per fixed window, in time order, each named by
    /// its window index
    pub fn collect_by_fixed_window(&self, window: &str) -> TimeSeriesResult<Vec<(String, Self)>> {
        let collections = self
            .pipeline()
            .window_by(window)?
            .emit_on("discard")?
            .to_collection_list()?;
        collections
            .into_iter()
            .map(|(key, collection)| {
                let series = self.set_collection(collection)?.set_name(key.clone());
                Ok((key, series))
            })
            .collect()
    }

    // ============================================
    // Comparison and list operations
    // ============================================

    /// Same metadata and the very same underlying event list
    pub fn equal(a: &TimeSeries, b: &TimeSeries) -> bool {
        a.meta() == b.meta() && a.collection.shares_events(&b.collection)
    }

    /// Same metadata and equal events
    pub fn same(a: &TimeSeries, b: &TimeSeries) -> bool {
        a == b
    }

    /// Merge series with disjoint fields into one, event by event
    ///
    /// Events sharing a key are merged; sharing a field at the same key is an
    /// error.
    pub fn timeseries_list_merge(name: &str, series: &[TimeSeries]) -> TimeSeriesResult<Self> {
        let mut order: Vec<String> = Vec::new();
        let mut buckets: HashMap<String, Vec<Event>> = HashMap::new();
        for event in series.iter().flat_map(|s| s.events()) {
            let key = event.key().as_key_string();
            buckets
                .entry(key.clone())
                .or_insert_with(|| {
                    order.push(key);
                    Vec::new()
                })
                .push(event.clone());
        }

        let mut merged = Vec::with_capacity(order.len());
        for key in &order {
            if let Some(events) = buckets.get(key) {
                merged.extend(Event::merge(events)?);
            }
        }
        merged.sort_by_key(Event::begin);
        Self::list_result(name, series, merged)
    }

    /// Reduce matching fields of events sharing a key across series
    pub fn timeseries_list_reduce(
        name: &str,
        series: &[TimeSeries],
        fields: Option<&[FieldPath]>,
        reducer: &Reducer,
    ) -> TimeSeriesResult<Self> {
        let events: Vec<Event> = series.iter().flat_map(|s| s.events().cloned()).collect();
        let mut combined = Event::combine(&events, fields, reducer);
        combined.sort_by_key(Event::begin);
        Self::list_result(name, series, combined)
    }

    pub fn timeseries_list_sum(
        name: &str,
        series: &[TimeSeries],
        fields: Option<&[FieldPath]>,
    ) -> TimeSeriesResult<Self> {
        Self::timeseries_list_reduce(name, series, fields, &Reducer::sum())
    }

    pub fn timeseries_list_avg(
        name: &str,
        series: &[TimeSeries],
        fields: Option<&[FieldPath]>,
    ) -> TimeSeriesResult<Self> {
        Self::timeseries_list_reduce(name, series, fields, &Reducer::avg())
    }

    fn list_result(name: &str, series: &[TimeSeries], events: Vec<Event>) -> TimeSeriesResult<Self> {
        let utc = series.first().map_or(true, TimeSeries::is_utc);
        Self::build(
            name.to_string(),
            None,
            utc,
            Map::new(),
            Collection::from_events(events)?,
        )
    }
}

impl std::fmt::Display for TimeSeries {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

fn point_to_event(
    event_type: EventType,
    fields: &[String],
    point: &[Value],
    utc: bool,
    row: usize,
) -> TimeSeriesResult<Event> {
    let bad = |reason: String| TimeSeriesError::BadPoint { row, reason };

    let (key, values) = point
        .split_first()
        .ok_or_else(|| bad("empty row".to_string()))?;
    if values.len() != fields.len() {
        return Err(bad(format!(
            "expected {} values, got {}",
            fields.len(),
            values.len()
        )));
    }

    let mut data = Data::new();
    for (column, value) in fields.iter().zip(values) {
        nested_set(&mut data, &FieldPath::parse(column), value.clone());
    }

    match event_type {
        EventType::Point => {
            let ms = key
                .as_i64()
                .or_else(|| key.as_f64().map(|f| f as i64))
                .ok_or_else(|| bad(format!("time must be epoch ms, got {}", key)))?;
            Ok(Event::new(ms, Value::Object(data))?)
        }
        EventType::Range => {
            let range = TimeRange::from_json(key)?;
            Ok(Event::with_range(range, data))
        }
        EventType::Indexed => {
            let index = key
                .as_str()
                .ok_or_else(|| bad(format!("index must be a string, got {}", key)))?;
            Ok(Event::with_index(Index::with_utc(index, utc)?, data))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::processor::{AlignMethod, FillMethod};
    use serde_json::json;

    fn traffic() -> TimeSeries {
        TimeSeries::from_json_value(json!({
            "name": "traffic",
            "columns": ["time", "value", "status"],
            "points": [
                [1400425947000i64, 52, "ok"],
                [1400425948000i64, 18, "ok"],
                [1400425949000i64, 26, "fail"],
                [1400425950000i64, 93, "offline"]
            ]
        }))
        .unwrap()
    }

    fn index_series(name: &str, rows: &[(&str, f64)]) -> TimeSeries {
        let points: Vec<Value> = rows.iter().map(|(i, v)| json!([i, v, v])).collect();
        TimeSeries::from_json_value(json!({
            "name": name,
            "utc": true,
            "columns": ["index", "in", "out"],
            "points": points
        }))
        .unwrap()
    }

    fn positions(range: std::ops::RangeInclusive<i64>) -> Vec<String> {
        range.map(|p| format!("5m-{}", p)).collect()
    }

    fn rows(keys: &[String], v: f64) -> Vec<(&str, f64)> {
        keys.iter().map(|k| (k.as_str(), v)).collect()
    }

    #[test]
    fn test_wire_construction() {
        let ts = traffic();
        assert_eq!(ts.name(), "traffic");
        assert_eq!(ts.size(), 4);
        assert!(ts.is_utc());
        assert_eq!(ts.at(2).unwrap().get("status"), Some(&json!("fail")));
        assert_eq!(ts.columns(), vec!["status", "value"]);
        assert_eq!(ts.meta_value("name"), Some(json!("traffic")));
    }

    #[test]
    fn test_range_and_index_series() {
        let outages = TimeSeries::from_json_value(json!({
            "name": "outages",
            "columns": ["timerange", "title", "esnet_ticket"],
            "points": [
                [[1429673400000i64, 1429707600000i64], "BOOM", "ESNET-20080101-001"],
                [[1429673400000i64, 1429707600000i64], "BAM!", "ESNET-20080101-002"]
            ]
        }))
        .unwrap();
        assert_eq!(outages.collection().event_type(), Some(EventType::Range));

        let indexed = TimeSeries::from_json_value(json!({
            "name": "traffic",
            "index": "1d-625",
            "columns": ["time", "value"],
            "points": [[1400425947000i64, 52]]
        }))
        .unwrap();
        assert_eq!(indexed.index_as_string(), Some("1d-625"));
        assert_eq!(
            indexed.index_as_range().map(|r| r.to_json()),
            Some(json!([54000000000i64, 54086400000i64]))
        );

        let availability = TimeSeries::from_json_value(json!({
            "name": "availability",
            "columns": ["index", "uptime"],
            "points": [["2014-07", "100%"], ["2014-08", "88%"]]
        }))
        .unwrap();
        assert_eq!(availability.size(), 2);
    }

    #[test]
    fn test_bad_wire_input() {
        let bogus = TimeSeries::from_json_value(json!({
            "name": "x",
            "columns": ["bogus_type", "value"],
            "points": []
        }));
        assert_eq!(
            bogus.err(),
            Some(TimeSeriesError::BadColumn("bogus_type".to_string()))
        );
        assert!(matches!(
            TimeSeries::from_json_value(json!({})),
            Err(TimeSeriesError::Wire(_))
        ));
        assert!(matches!(
            TimeSeries::from_json_value(json!({
                "columns": ["time", "a", "b"],
                "points": [[1000, 1]]
            })),
            Err(TimeSeriesError::BadPoint { row: 0, .. })
        ));
    }

    #[test]
    fn test_out_of_order_points_rejected() {
        let res = TimeSeries::from_json_value(json!({
            "name": "availability",
            "columns": ["index", "uptime"],
            "points": [["2015-06", "100%"], ["2015-05", "92%"]]
        }));
        assert_eq!(res.err(), Some(TimeSeriesError::NotChronological));
    }

    #[test]
    fn test_round_trip() {
        let ts = traffic().set_meta("site", json!("chicago")).unwrap();
        let again = TimeSeries::from_json_value(ts.to_json()).unwrap();
        assert!(TimeSeries::same(&ts, &again));
        assert!(!TimeSeries::equal(&ts, &again));
        assert!(TimeSeries::equal(&ts, &ts.clone()));
        assert_eq!(again.meta_value("site"), Some(json!("chicago")));
    }

    #[test]
    fn test_reducers() {
        let ts = TimeSeries::from_events(
            "collection",
            vec![
                Event::new(1429673400000i64, json!({"in": 1, "out": 2})).unwrap(),
                Event::new(1429673460000i64, json!({"in": 3, "out": 4})).unwrap(),
                Event::new(1429673520000i64, json!({"in": 5, "out": 6})).unwrap(),
            ],
        )
        .unwrap();
        assert_eq!(ts.count(), 3);
        assert_eq!(ts.sum("in").as_f64(), Some(9.0));
        assert_eq!(ts.avg("out").as_f64(), Some(4.0));
        assert_eq!(ts.min("in").as_f64(), Some(1.0));
        assert_eq!(ts.max("in").as_f64(), Some(5.0));
        assert_eq!(ts.median("out").as_f64(), Some(4.0));
        let stdev = ts.stdev("out").as_f64().unwrap();
        assert!((stdev - 1.632993161855452).abs() < 1e-12);
        assert_eq!(ts.clean("bogus").unwrap().size(), 0);
        assert_eq!(ts.slice(1, 3).unwrap().size(), 2);
    }

    #[test]
    fn test_rename_and_select() {
        let mut renames = HashMap::new();
        renames.insert("value".to_string(), "bytes".to_string());
        let renamed = traffic().rename_columns(&renames).unwrap();
        assert_eq!(renamed.columns(), vec!["bytes", "status"]);
        let selected = renamed.select(["bytes"]).unwrap();
        assert_eq!(selected.columns(), vec!["bytes"]);
    }

    #[test]
    fn test_list_sum_reorders() {
        let ts1 = index_series("base", &rows(&positions(4855968..=4855977), 0.0));
        let ts2 = index_series("all", &rows(&positions(4855968..=4855977), 1.0));
        let ts3 = index_series("first half", &rows(&positions(4855968..=4855972), 1.0));
        let ts4 = index_series("middle", &rows(&positions(4855971..=4855974), 1.0));
        let ts5 = index_series("last half", &rows(&positions(4855973..=4855977), 1.0));

        let fields = field_spec(["in", "out"]);
        let sum = TimeSeries::timeseries_list_sum(
            "summ",
            &[ts4, ts2, ts3, ts1, ts5],
            Some(fields.as_slice()),
        )
        .unwrap();
        assert_eq!(sum.size(), 10);
        let got: Vec<f64> = sum
            .events()
            .filter_map(|e| e.get("in").and_then(Value::as_f64))
            .collect();
        assert_eq!(got, vec![2.0, 2.0, 2.0, 3.0, 3.0, 3.0, 3.0, 2.0, 2.0, 2.0]);
    }

    #[test]
    fn test_list_merge() {
        let a = TimeSeries::from_events("a", vec![Event::new(1000, json!({"in": 1})).unwrap()]).unwrap();
        let b = TimeSeries::from_events("b", vec![Event::new(1000, json!({"out": 2})).unwrap()]).unwrap();
        let merged = TimeSeries::timeseries_list_merge("both", &[a.clone(), b]).unwrap();
        assert_eq!(merged.size(), 1);
        assert_eq!(merged.at(0).unwrap().get("out"), Some(&json!(2)));
        assert!(TimeSeries::timeseries_list_merge("clash", &[a.clone(), a]).is_err());
    }

    #[test]
    fn test_align_and_fill() {
        let ts = TimeSeries::from_json_value(json!({
            "name": "traffic",
            "columns": ["time", "value"],
            "points": [
                [1471824030000i64, 0.75],
                [1471824105000i64, 2],
                [1471824210000i64, 1],
                [1471824390000i64, 1],
                [1471824510000i64, 3],
                [1471824525000i64, 5]
            ]
        }))
        .unwrap();
        let held = ts
            .align(AlignOptions::new().window("1m").method(AlignMethod::Hold))
            .unwrap();
        assert_eq!(held.size(), 8);
        assert_eq!(held.name(), "traffic");

        let gappy = TimeSeries::from_events(
            "gappy",
            vec![
                Event::new(0, json!({"value": 1})).unwrap(),
                Event::new(1000, json!({"value": null})).unwrap(),
                Event::new(2000, json!({"value": 3})).unwrap(),
            ],
        )
        .unwrap();
        let filled = gappy.fill(FillOptions::new().method(FillMethod::Pad)).unwrap();
        assert_eq!(filled.at(1).unwrap().value(), Some(&json!(1)));
        assert!(gappy.rate(RateOptions::new()).unwrap().size() == 2);
    }

    #[test]
    fn test_rollups() {
        let events = (0..6)
            .map(|i| Event::new(i * 1_800_000, json!({"value": i})).unwrap())
            .collect();
        let ts = TimeSeries::from_events("half-hourly", events).unwrap();
        let hourly = ts
            .hourly_rollup([("value", "value", Reducer::sum())], false)
            .unwrap();
        assert_eq!(hourly.size(), 3);
        assert_eq!(hourly.collection().event_type(), Some(EventType::Indexed));
        assert_eq!(hourly.at(2).unwrap().value().and_then(Value::as_f64), Some(9.0));

        let points = ts
            .fixed_window_rollup("1h", [("value", "value", Reducer::avg())], true)
            .unwrap();
        assert_eq!(points.at(0).unwrap().timestamp_ms(), 1_800_000);

        let daily = ts.daily_rollup([("total", "value", Reducer::sum())], false).unwrap();
        assert_eq!(daily.size(), 1);
        assert_eq!(daily.at(0).unwrap().index().map(|i| i.as_string()), Some("1970-01-01"));
    }

    #[test]
    fn test_collect_by_fixed_window() {
        let events = (0..6)
            .map(|i| Event::new(i * 1_800_000, json!({"value": i})).unwrap())
            .collect();
        let ts = TimeSeries::from_events("half-hourly", events).unwrap();
        let windows = ts.collect_by_fixed_window("1h").unwrap();
        assert_eq!(windows.len(), 3);
        assert_eq!(windows[1].0, "1h-1");
        assert_eq!(windows[1].1.size(), 2);
        assert_eq!(windows[1].1.name(), "1h-1");
    }

    #[test]
    fn test_collect_by_fixed_window_keeps_time_order() {
        let events = (0..12)
            .map(|i| Event::new(i * 300_000, json!({"value": i})).unwrap())
            .collect();
        let ts = TimeSeries::from_events("five-minutely", events).unwrap();
        let keys: Vec<String> = ts
            .collect_by_fixed_window("5m")
            .unwrap()
            .into_iter()
            .map(|(key, _)| key)
            .collect();
        let expected: Vec<String> = (0..12).map(|i| format!("5m-{}", i)).collect();
        assert_eq!(keys, expected);
    }
}
