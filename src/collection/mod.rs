//! Collections of events
//!
//! A [`Collection`] is an ordered, immutable list of events of a single
//! variant. Transforms return new collections; the event list itself sits
//! behind an `Arc` so clones are cheap and appends only copy when the list
//! is shared.

pub mod error;

pub use error::{CollectionError, CollectionResult};
pub use crate::reducer::FilterError;

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::event::{Event, EventKey, EventType, FieldPath};
use crate::reducer::{self, Interpolation, Reducer};
use crate::time::TimeRange;

/// Ordered list of same-variant events
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collection {
    events: Arc<Vec<Event>>,
    event_type: Option<EventType>,
}

impl Collection {
    /// Empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a list, all events must be the same variant
    pub fn from_events(events: Vec<Event>) -> CollectionResult<Self> {
        let event_type = events.first().map(Event::event_type);
        if let Some(expected) = event_type {
            if let Some(bad) = events.iter().find(|e| e.event_type() != expected) {
                return Err(CollectionError::MixedEventTypes {
                    expected,
                    found: bad.event_type(),
                });
            }
        }
        Ok(Self {
            events: Arc::new(events),
            event_type,
        })
    }

    fn check(&self, event: &Event) -> CollectionResult<()> {
        match self.event_type {
            Some(expected) if expected != event.event_type() => {
                Err(CollectionError::MixedEventTypes {
                    expected,
                    found: event.event_type(),
                })
            }
            _ => Ok(()),
        }
    }

    /// Variant of the held events, `None` while empty
    pub fn event_type(&self) -> Option<EventType> {
        self.event_type
    }

    pub fn size(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of events with a valid value at `path`
    pub fn size_valid(&self, path: impl Into<FieldPath>) -> usize {
        let path = path.into();
        self.events.iter().filter(|e| e.is_valid_value(&path)).count()
    }

    pub fn at(&self, pos: usize) -> CollectionResult<&Event> {
        self.events.get(pos).ok_or(CollectionError::OutOfRange {
            index: pos,
            size: self.events.len(),
        })
    }

    /// Event at or just before `t`
    pub fn at_time(&self, t: &DateTime<Utc>) -> Option<&Event> {
        self.bisect(t, 0).and_then(|pos| self.events.get(pos))
    }

    /// Every event with the given key
    pub fn at_key(&self, key: &EventKey) -> Vec<&Event> {
        self.events.iter().filter(|e| e.key() == key).collect()
    }

    pub fn first(&self) -> Option<&Event> {
        self.events.first()
    }

    pub fn last(&self) -> Option<&Event> {
        self.events.last()
    }

    /// Position of the last event at or before `t`, searching from `begin`
    ///
    /// If every remaining event is after `t`, `begin` itself is returned.
    pub fn bisect(&self, t: &DateTime<Utc>, begin: usize) -> Option<usize> {
        if self.events.is_empty() || begin >= self.events.len() {
            return None;
        }
        let at_or_before = self.events[begin..].partition_point(|e| e.timestamp() <= *t);
        Some(begin + at_or_before.saturating_sub(1))
    }

    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    pub fn event_list(&self) -> &[Event] {
        &self.events
    }

    /// Extents of every event in the collection
    pub fn range(&self) -> Option<TimeRange> {
        let begin = self.events.iter().map(Event::begin).min()?;
        let end = self.events.iter().map(Event::end).max()?;
        TimeRange::new(begin, end).ok()
    }

    /// New collection with `event` appended
    pub fn add_event(&self, event: Event) -> CollectionResult<Self> {
        let mut next = self.clone();
        next.push(event)?;
        Ok(next)
    }

    /// Append in place; only copies the list if it is shared
    pub(crate) fn push(&mut self, event: Event) -> CollectionResult<()> {
        self.check(&event)?;
        self.event_type.get_or_insert(event.event_type());
        Arc::make_mut(&mut self.events).push(event);
        Ok(())
    }

    fn with_events(&self, events: Vec<Event>) -> Self {
        Self {
            event_type: events.first().map(Event::event_type).or(self.event_type),
            events: Arc::new(events),
        }
    }

    /// Events in `[begin, end)`, clamped to the collection
    pub fn slice(&self, begin: usize, end: usize) -> Self {
        let end = end.min(self.events.len());
        let begin = begin.min(end);
        self.with_events(self.events[begin..end].to_vec())
    }

    pub fn filter<F>(&self, f: F) -> Self
    where
        F: Fn(&Event) -> bool,
    {
        self.with_events(self.events.iter().filter(|e| f(e)).cloned().collect())
    }

    /// Transform every event; the results must still share one variant
    pub fn map<F>(&self, f: F) -> CollectionResult<Self>
    where
        F: Fn(&Event) -> Event,
    {
        Self::from_events(self.events.iter().map(f).collect())
    }

    /// Drop events without a valid value at `path`
    pub fn clean(&self, path: impl Into<FieldPath>) -> Self {
        let path = path.into();
        self.filter(|e| e.is_valid_value(&path))
    }

    /// Reduce several fields of each event into one named field
    pub fn collapse(&self, field_spec: &[FieldPath], name: &str, reducer: &Reducer, append: bool) -> Self {
        self.with_events(
            self.events
                .iter()
                .map(|e| e.collapse(field_spec, name, reducer, append))
                .collect(),
        )
    }

    /// Keep only the listed fields in every event
    pub fn select(&self, field_spec: &[FieldPath]) -> Self {
        self.with_events(
            self.events
                .iter()
                .map(|e| Event::selector(e, field_spec))
                .collect(),
        )
    }

    pub fn sort_by_time(&self) -> Self {
        let mut events = self.events.to_vec();
        events.sort_by_key(Event::timestamp);
        self.with_events(events)
    }

    /// Sort by the value at `path`; every event must have it
    pub fn sort(&self, path: impl Into<FieldPath>) -> CollectionResult<Self> {
        let path = path.into();
        if let Some(missing) = self.events.iter().find(|e| e.get_path(&path).is_none()) {
            return Err(CollectionError::BadPath(format!(
                "{} missing at {}",
                path,
                missing.timestamp_ms()
            )));
        }
        let mut events = self.events.to_vec();
        events.sort_by(|a, b| compare_values(a.get_path(&path), b.get_path(&path)));
        Ok(self.with_events(events))
    }

    /// Both collections hold the very same event list
    pub(crate) fn shares_events(&self, other: &Collection) -> bool {
        Arc::ptr_eq(&self.events, &other.events)
    }

    /// Check that begin times never decrease
    pub fn is_chronological(&self) -> bool {
        self.events
            .windows(2)
            .all(|pair| pair[0].begin() <= pair[1].begin())
    }

    /// Collapse runs of events with the same key, keeping the latest
    pub fn dedup(&self, ignore_values: bool) -> Self {
        let mut out: Vec<Event> = Vec::with_capacity(self.events.len());
        for event in self.events.iter() {
            match out.last_mut() {
                Some(prev) if Event::is_duplicate(prev, event, ignore_values) => {
                    *prev = event.clone();
                }
                _ => out.push(event.clone()),
            }
        }
        self.with_events(out)
    }

    /// Top-level data fields across all events, sorted
    pub fn columns(&self) -> Vec<String> {
        let mut columns = BTreeSet::new();
        for event in self.events.iter() {
            columns.extend(event.data().keys().cloned());
        }
        columns.into_iter().collect()
    }

    /// Every value at `path`, missing values as null
    pub fn values(&self, path: &FieldPath) -> Vec<Value> {
        self.events
            .iter()
            .map(|e| e.get_path(path).cloned().unwrap_or(Value::Null))
            .collect()
    }

    /// Apply `reducer` to the column at `path`
    pub fn aggregate(&self, reducer: &Reducer, path: impl Into<FieldPath>) -> Value {
        reducer.reduce(&self.values(&path.into()))
    }

    pub fn count(&self) -> usize {
        self.size()
    }

    pub fn sum(&self, path: impl Into<FieldPath>) -> Value {
        self.aggregate(&Reducer::sum(), path)
    }

    pub fn avg(&self, path: impl Into<FieldPath>) -> Value {
        self.aggregate(&Reducer::avg(), path)
    }

    pub fn mean(&self, path: impl Into<FieldPath>) -> Value {
        self.avg(path)
    }

    pub fn max(&self, path: impl Into<FieldPath>) -> Value {
        self.aggregate(&Reducer::max(), path)
    }

    pub fn min(&self, path: impl Into<FieldPath>) -> Value {
        self.aggregate(&Reducer::min(), path)
    }

    pub fn median(&self, path: impl Into<FieldPath>) -> Value {
        self.aggregate(&Reducer::median(), path)
    }

    pub fn stdev(&self, path: impl Into<FieldPath>) -> Value {
        self.aggregate(&Reducer::stdev(), path)
    }

    pub fn first_value(&self, path: impl Into<FieldPath>) -> Value {
        self.aggregate(&Reducer::first(), path)
    }

    pub fn last_value(&self, path: impl Into<FieldPath>) -> Value {
        self.aggregate(&Reducer::last(), path)
    }

    pub fn difference(&self, path: impl Into<FieldPath>) -> Value {
        self.aggregate(&Reducer::difference(), path)
    }

    /// `q`-th percentile of the numeric values at `path`
    pub fn percentile(&self, q: f64, path: impl Into<FieldPath>, interp: Interpolation) -> Value {
        let sorted = self.sorted_numbers(&path.into());
        reducer::percentile_of_sorted(&sorted, q, interp).map_or(Value::Null, Value::from)
    }

    /// The `n - 1` cut points dividing the values at `path` into `n` groups
    pub fn quantile(
        &self,
        n: usize,
        path: impl Into<FieldPath>,
        interp: Interpolation,
    ) -> CollectionResult<Vec<Value>> {
        if n == 0 || n > self.size() {
            return Err(CollectionError::QuantileCount {
                requested: n,
                size: self.size(),
            });
        }
        let sorted = self.sorted_numbers(&path.into());
        Ok((1..n)
            .map(|i| {
                let q = i as f64 * 100.0 / n as f64;
                reducer::percentile_of_sorted(&sorted, q, interp).map_or(Value::Null, Value::from)
            })
            .collect())
    }

    fn sorted_numbers(&self, path: &FieldPath) -> Vec<f64> {
        let mut nums: Vec<f64> = self.events.iter().filter_map(|e| e.get_f64(path)).collect();
        nums.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        nums
    }

    /// List of event JSON objects
    pub fn to_json(&self) -> Value {
        Value::Array(self.events.iter().map(Event::to_json).collect())
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Null), Some(Value::Null)) => Ordering::Equal,
        (Some(Value::Null), _) => Ordering::Less,
        (_, Some(Value::Null)) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}
