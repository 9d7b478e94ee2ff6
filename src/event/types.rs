//! Event types
//!
//! An [`Event`] is a time key plus an immutable JSON payload. The key is one
//! of three variants:
//!
//! - `Time`: a single instant (a point event)
//! - `Range`: a [`TimeRange`] (a range event)
//! - `Index`: an [`Index`] bucket (an indexed event)
//!
//! Payloads are shared behind an `Arc`; every "mutation" returns a new event.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::sync::Arc;

use super::error::{EventError, EventResult};
use super::path::{self, Data, FieldPath};
use crate::time::{util, Index, IntoInstant, TimeRange};

/// Temporal key of an event
#[derive(Debug, Clone, PartialEq)]
pub enum EventKey {
    Time(DateTime<Utc>),
    Range(TimeRange),
    Index(Index),
}

impl EventKey {
    /// Key rendered as a string, used for bucketing
    pub fn as_key_string(&self) -> String {
        match self {
            EventKey::Time(t) => t.timestamp_millis().to_string(),
            EventKey::Range(r) => format!("{},{}", r.begin_millis(), r.end_millis()),
            EventKey::Index(i) => i.as_string().to_string(),
        }
    }

    /// JSON form of the key: ms, `[begin, end]` or index string
    pub fn to_json(&self) -> Value {
        match self {
            EventKey::Time(t) => json!(t.timestamp_millis()),
            EventKey::Range(r) => r.to_json(),
            EventKey::Index(i) => i.to_json(),
        }
    }

    pub fn event_type(&self) -> EventType {
        match self {
            EventKey::Time(_) => EventType::Point,
            EventKey::Range(_) => EventType::Range,
            EventKey::Index(_) => EventType::Indexed,
        }
    }
}

/// Variant tag of an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Point,
    Range,
    Indexed,
}

impl EventType {
    /// Wire-format name of the first column for this variant
    pub fn column_name(&self) -> &'static str {
        match self {
            EventType::Point => "time",
            EventType::Range => "timerange",
            EventType::Indexed => "index",
        }
    }

    /// Parse a first-column name
    pub fn from_column(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "time" => Some(EventType::Point),
            "timerange" => Some(EventType::Range),
            "index" => Some(EventType::Indexed),
            _ => None,
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventType::Point => write!(f, "point"),
            EventType::Range => write!(f, "range"),
            EventType::Indexed => write!(f, "indexed"),
        }
    }
}

/// A time-keyed, immutable data record
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    key: EventKey,
    data: Arc<Data>,
}

impl Event {
    /// Point event at an instant (epoch ms or timezone-aware datetime)
    ///
    /// Non-object data is shorthand for `{"value": data}`.
    pub fn new(time: impl IntoInstant, data: impl Into<Value>) -> EventResult<Self> {
        let t = time.into_instant()?;
        Ok(Self::from_parts(EventKey::Time(t), path::to_data(data.into())))
    }

    /// Range event
    pub fn with_range(range: TimeRange, data: impl Into<Value>) -> Self {
        Self::from_parts(EventKey::Range(range), path::to_data(data.into()))
    }

    /// Indexed event
    pub fn with_index(index: Index, data: impl Into<Value>) -> Self {
        Self::from_parts(EventKey::Index(index), path::to_data(data.into()))
    }

    /// Indexed event from an index string
    pub fn indexed(index: &str, utc: bool, data: impl Into<Value>) -> EventResult<Self> {
        Ok(Self::with_index(Index::with_utc(index, utc)?, data))
    }

    pub(crate) fn from_parts(key: EventKey, data: Data) -> Self {
        Self {
            key,
            data: Arc::new(data),
        }
    }

    /// Same payload under a different key, sharing the data
    pub(crate) fn rekey(&self, key: EventKey) -> Self {
        Self {
            key,
            data: Arc::clone(&self.data),
        }
    }

    pub fn key(&self) -> &EventKey {
        &self.key
    }

    pub fn event_type(&self) -> EventType {
        self.key.event_type()
    }

    /// Start of the event in time
    pub fn begin(&self) -> DateTime<Utc> {
        match &self.key {
            EventKey::Time(t) => *t,
            EventKey::Range(r) => r.begin(),
            EventKey::Index(i) => i.begin(),
        }
    }

    /// End of the event in time; equals `begin` for point events
    pub fn end(&self) -> DateTime<Utc> {
        match &self.key {
            EventKey::Time(t) => *t,
            EventKey::Range(r) => r.end(),
            EventKey::Index(i) => i.end(),
        }
    }

    /// The event's timestamp, its begin for range and indexed events
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.begin()
    }

    pub fn timestamp_ms(&self) -> i64 {
        self.begin().timestamp_millis()
    }

    /// Range covered by range and indexed events
    pub fn timerange(&self) -> Option<TimeRange> {
        match &self.key {
            EventKey::Time(_) => None,
            EventKey::Range(r) => Some(*r),
            EventKey::Index(i) => Some(i.as_timerange()),
        }
    }

    pub fn index(&self) -> Option<&Index> {
        match &self.key {
            EventKey::Index(i) => Some(i),
            _ => None,
        }
    }

    pub fn data(&self) -> &Data {
        &self.data
    }

    /// Look up a dotted path such as `"direction.in"`
    pub fn get(&self, path: &str) -> Option<&Value> {
        self.get_path(&FieldPath::parse(path))
    }

    /// Look up a parsed field path
    pub fn get_path(&self, path: &FieldPath) -> Option<&Value> {
        path::nested_get(&self.data, path)
    }

    /// Shorthand for `get("value")`
    pub fn value(&self) -> Option<&Value> {
        self.data.get("value")
    }

    /// Numeric value at a path
    pub fn get_f64(&self, path: &FieldPath) -> Option<f64> {
        self.get_path(path).and_then(Value::as_f64)
    }

    /// New event with the same key and different data
    pub fn set_data(&self, data: impl Into<Value>) -> Event {
        Self::from_parts(self.key.clone(), path::to_data(data.into()))
    }

    /// New event with one path changed, the original is untouched
    pub fn with_value(&self, path: &FieldPath, value: Value) -> Event {
        let mut data = (*self.data).clone();
        path::nested_set(&mut data, path, value);
        Self::from_parts(self.key.clone(), data)
    }

    /// Check whether the value at `path` is present and usable
    pub fn is_valid_value(&self, path: &FieldPath) -> bool {
        path::is_valid(self.get_path(path))
    }

    /// `{"time": ms, "data": {...}}`, or `timerange` / `index` keyed
    pub fn to_json(&self) -> Value {
        let mut out = Data::new();
        out.insert(
            self.event_type().column_name().to_string(),
            self.key.to_json(),
        );
        out.insert("data".to_string(), Value::Object((*self.data).clone()));
        Value::Object(out)
    }

    /// Wire-format row: key first, then the requested columns
    pub fn to_point(&self, columns: &[String]) -> Vec<Value> {
        let mut row = Vec::with_capacity(columns.len() + 1);
        row.push(self.key.to_json());
        for column in columns {
            row.push(
                self.get_path(&FieldPath::parse(column))
                    .cloned()
                    .unwrap_or(Value::Null),
            );
        }
        row
    }

    /// JSON string form
    pub fn stringify(&self) -> String {
        self.to_json().to_string()
    }

    pub fn timestamp_as_utc_string(&self) -> String {
        util::format_utc(&self.timestamp())
    }

    /// Value equality of key and data
    pub fn same(a: &Event, b: &Event) -> bool {
        a == b
    }

    /// Same key, and unless `ignore_values`, the same data too
    pub fn is_duplicate(a: &Event, b: &Event, ignore_values: bool) -> bool {
        a.key == b.key && (ignore_values || a.data == b.data)
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.stringify())
    }
}
