//! Operations over lists of events: merge, combine and map/reduce

use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

use super::error::{EventError, EventResult};
use super::path::{self, Data, FieldPath};
use super::types::{Event, EventKey};
use crate::reducer::Reducer;

impl Event {
    /// Union the fields of events that share one key
    ///
    /// All events must be the same variant with the same timestamp, range
    /// or index string, and no field may appear twice. An empty list
    /// merges to `None`.
    pub fn merge(events: &[Event]) -> EventResult<Option<Event>> {
        let Some(first) = events.first() else {
            return Ok(None);
        };
        let first_key = first.key().as_key_string();

        let mut data = Data::new();
        for event in events {
            if event.event_type() != first.event_type() {
                return Err(EventError::MixedTypes(
                    first.event_type().to_string(),
                    event.event_type().to_string(),
                ));
            }
            let key = event.key().as_key_string();
            if key != first_key {
                return Err(EventError::KeyMismatch(first_key, key));
            }
            for (field, value) in event.data() {
                if data.contains_key(field) {
                    return Err(EventError::DuplicateField(field.clone()));
                }
                data.insert(field.clone(), value.clone());
            }
        }

        Ok(Some(Event::from_parts(first.key().clone(), data)))
    }

    /// Reduce same-keyed events field by field
    ///
    /// Values are bucketed per `(key, field)`; each bucket is reduced and
    /// the results reassembled into one event per key, in first-seen key
    /// order. Without a field spec every top-level field is combined.
    pub fn combine(
        events: &[Event],
        field_spec: Option<&[FieldPath]>,
        reducer: &Reducer,
    ) -> Vec<Event> {
        let mut order: Vec<EventKey> = Vec::new();
        let mut slots: HashMap<String, usize> = HashMap::new();
        let mut buckets: Vec<BTreeMap<FieldPath, Vec<Value>>> = Vec::new();

        for event in events {
            let key = event.key().as_key_string();
            let slot = *slots.entry(key).or_insert_with(|| {
                order.push(event.key().clone());
                buckets.push(BTreeMap::new());
                buckets.len() - 1
            });

            for field in fields_of(event, field_spec) {
                let value = event.get_path(&field).cloned().unwrap_or(Value::Null);
                buckets[slot].entry(field).or_default().push(value);
            }
        }

        order
            .into_iter()
            .zip(buckets)
            .map(|(key, fields)| {
                let mut data = Data::new();
                for (field, values) in fields {
                    path::nested_set(&mut data, &field, reducer.reduce(&values));
                }
                Event::from_parts(key, data)
            })
            .collect()
    }

    /// Combine with a sum reducer
    pub fn sum(events: &[Event], field_spec: Option<&[FieldPath]>) -> Vec<Event> {
        Self::combine(events, field_spec, &Reducer::sum())
    }

    /// Combine with an average reducer
    pub fn avg(events: &[Event], field_spec: Option<&[FieldPath]>) -> Vec<Event> {
        Self::combine(events, field_spec, &Reducer::avg())
    }

    /// Gather every value per field across events, keyed by dotted path
    pub fn map(events: &[Event], field_spec: Option<&[FieldPath]>) -> BTreeMap<String, Vec<Value>> {
        let mut out: BTreeMap<String, Vec<Value>> = BTreeMap::new();
        for event in events {
            for field in fields_of(event, field_spec) {
                let value = event.get_path(&field).cloned().unwrap_or(Value::Null);
                out.entry(field.to_dotted()).or_default().push(value);
            }
        }
        out
    }

    /// Reduce the output of [`Event::map`] into one payload
    pub fn reduce(mapped: &BTreeMap<String, Vec<Value>>, reducer: &Reducer) -> Data {
        let mut data = Data::new();
        for (field, values) in mapped {
            path::nested_set(&mut data, &FieldPath::parse(field), reducer.reduce(values));
        }
        data
    }

    pub fn map_reduce(events: &[Event], field_spec: Option<&[FieldPath]>, reducer: &Reducer) -> Data {
        Self::reduce(&Self::map(events, field_spec), reducer)
    }

    /// New event keeping only the listed fields
    pub fn selector(event: &Event, field_spec: &[FieldPath]) -> Event {
        let mut data = Data::new();
        for field in field_spec {
            if let Some(value) = event.get_path(field) {
                path::nested_set(&mut data, field, value.clone());
            }
        }
        Event::from_parts(event.key().clone(), data)
    }

    /// Reduce several fields into one named field
    ///
    /// With `append` the new field is added to the existing data, otherwise
    /// it replaces it.
    pub fn collapse(
        &self,
        field_spec: &[FieldPath],
        name: &str,
        reducer: &Reducer,
        append: bool,
    ) -> Event {
        let values: Vec<Value> = field_spec
            .iter()
            .map(|f| self.get_path(f).cloned().unwrap_or(Value::Null))
            .collect();

        let mut data = if append { self.data().clone() } else { Data::new() };
        data.insert(name.to_string(), reducer.reduce(&values));
        Event::from_parts(self.key().clone(), data)
    }
}

fn fields_of(event: &Event, field_spec: Option<&[FieldPath]>) -> Vec<FieldPath> {
    match field_spec {
        Some(spec) => spec.to_vec(),
        None => event.data().keys().map(|k| FieldPath::new([k.as_str()])).collect(),
    }
}
