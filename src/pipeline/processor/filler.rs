//! Filler: repair missing values
//!
//! `zero` and `pad` emit exactly one event per input. `linear` holds invalid
//! events back until the next valid one arrives, then releases the whole run
//! with the gaps interpolated:
//!
//! ```text
//! in:    1    -    -    3    -    5
//! out:   1              2  2.5  3         4  5
//!        ^ emitted      ^ released when 3 arrives
//! ```
//!
//! A missing value is `null`, an empty string or an absent path. Arrays are
//! filled element-wise.

use std::collections::HashMap;
use std::str::FromStr;

use serde_json::Value;

use super::{Emitter, Processor};
use crate::error::Warning;
use crate::event::path::{is_valid, leaf_paths, nested_get, nested_set};
use crate::event::{field_spec, Event, FieldPath};
use crate::pipeline::error::{PipelineResult, ProcessorError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillMethod {
    #[default]
    Zero,
    /// Repeat the previous valid value
    Pad,
    /// Interpolate between surrounding valid values
    Linear,
}

impl FromStr for FillMethod {
    type Err = ProcessorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "zero" => Ok(FillMethod::Zero),
            "pad" => Ok(FillMethod::Pad),
            "linear" => Ok(FillMethod::Linear),
            other => Err(ProcessorError::invalid(
                "filler",
                format!("unknown method '{}'", other),
            )),
        }
    }
}

impl std::fmt::Display for FillMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FillMethod::Zero => write!(f, "zero"),
            FillMethod::Pad => write!(f, "pad"),
            FillMethod::Linear => write!(f, "linear"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FillOptions {
    /// Paths to fill; every leaf path of each event when unset
    pub field_spec: Option<Vec<FieldPath>>,
    pub method: FillMethod,
    /// Consecutive fills allowed before values pass through unfilled
    pub fill_limit: Option<usize>,
}

impl FillOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field_spec<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<FieldPath>,
    {
        self.field_spec = Some(field_spec(paths));
        self
    }

    pub fn method(mut self, method: FillMethod) -> Self {
        self.method = method;
        self
    }

    pub fn fill_limit(mut self, limit: usize) -> Self {
        self.fill_limit = Some(limit);
        self
    }
}

#[derive(Debug, Clone)]
pub struct Filler {
    options: FillOptions,
    /// Last emitted event, the source for `pad`
    previous: Option<Event>,
    /// Consecutive fills per dotted path
    counts: HashMap<String, usize>,
    last_good: Option<Event>,
    cache: Vec<Event>,
}

impl Filler {
    pub fn new(mut options: FillOptions) -> PipelineResult<Self> {
        if options.method == FillMethod::Linear {
            let spec = options.field_spec.get_or_insert_with(|| field_spec(["value"]));
            if spec.len() != 1 {
                return Err(ProcessorError::invalid(
                    "filler",
                    "linear fill takes exactly one field path, chain fillers for more",
                )
                .into());
            }
        }
        Ok(Self {
            options,
            previous: None,
            counts: HashMap::new(),
            last_good: None,
            cache: Vec::new(),
        })
    }

    fn missing_path(path: &FieldPath) {
        Warning::MissingPath {
            context: "filler",
            path: path.to_dotted(),
        }
        .emit();
    }

    fn fill_list(&self, items: &mut [Value]) {
        for i in 0..items.len() {
            if self.options.method == FillMethod::Linear
                && is_valid(Some(&items[i]))
                && !items[i].is_number()
            {
                Warning::NonNumericValue {
                    context: "filler",
                    path: format!("[{}]", i),
                }
                .emit();
                return;
            }
            if is_valid(Some(&items[i])) {
                continue;
            }
            match self.options.method {
                FillMethod::Zero => items[i] = Value::from(0),
                FillMethod::Pad => {
                    if i > 0 && is_valid(Some(&items[i - 1])) {
                        items[i] = items[i - 1].clone();
                    }
                }
                FillMethod::Linear => {
                    let previous = if i > 0 { items[i - 1].as_f64() } else { None };
                    let next = items[i + 1..]
                        .iter()
                        .find(|v| is_valid(Some(*v)))
                        .and_then(Value::as_f64);
                    match (previous, next) {
                        (Some(p), Some(n)) => items[i] = Value::from((p + n) / 2.0),
                        (_, None) => return,
                        _ => {}
                    }
                }
            }
        }
    }

    fn pad_or_zero(&mut self, event: &Event) -> Event {
        let paths = match &self.options.field_spec {
            Some(spec) => spec.clone(),
            None => leaf_paths(event.data()),
        };

        let mut data = event.data().clone();
        for path in &paths {
            let Some(value) = nested_get(&data, path).cloned() else {
                Self::missing_path(path);
                continue;
            };

            if let Value::Array(mut items) = value {
                self.fill_list(&mut items);
                nested_set(&mut data, path, Value::Array(items));
                continue;
            }

            let key = path.to_dotted();
            if is_valid(Some(&value)) {
                self.counts.remove(&key);
                continue;
            }

            let count = self.counts.entry(key).or_insert(0);
            if self.options.fill_limit.is_some_and(|limit| *count >= limit) {
                continue;
            }
            *count += 1;

            match self.options.method {
                FillMethod::Zero => nested_set(&mut data, path, Value::from(0)),
                FillMethod::Pad => {
                    let padded = self
                        .previous
                        .as_ref()
                        .and_then(|prev| prev.get_path(path))
                        .filter(|v| is_valid(Some(*v)))
                        .cloned();
                    if let Some(padded) = padded {
                        nested_set(&mut data, path, padded);
                    }
                }
                FillMethod::Linear => {}
            }
        }

        let filled = event.set_data(data);
        self.previous = Some(filled.clone());
        filled
    }

    fn linear_path(&self) -> FieldPath {
        self.options
            .field_spec
            .as_ref()
            .and_then(|spec| spec.first().cloned())
            .unwrap_or_else(FieldPath::value)
    }

    /// Zero, one or many events to release for `event`
    fn linear(&mut self, event: Event) -> Vec<Event> {
        let path = self.linear_path();

        let mut event = event;
        let mut is_list = false;
        if let Some(Value::Array(items)) = event.get_path(&path) {
            let mut items = items.clone();
            self.fill_list(&mut items);
            event = event.with_value(&path, Value::Array(items));
            is_list = true;
        }

        let valid = match event.get_path(&path) {
            None => {
                Self::missing_path(&path);
                true
            }
            Some(value) => is_list || is_valid(Some(value)),
        };

        match (valid, self.cache.is_empty(), self.last_good.is_some()) {
            (true, true, _) => {
                self.last_good = Some(event.clone());
                vec![event]
            }
            (false, _, true) => {
                self.cache.push(event);
                if self.options.fill_limit.is_some_and(|limit| self.cache.len() >= limit) {
                    self.last_good = None;
                    std::mem::take(&mut self.cache)
                } else {
                    Vec::new()
                }
            }
            (false, _, false) => vec![event],
            (true, false, _) => {
                let mut run = Vec::with_capacity(self.cache.len() + 2);
                run.extend(self.last_good.take());
                run.append(&mut self.cache);
                run.push(event.clone());
                self.last_good = Some(event);
                interpolate(run, &path).into_iter().skip(1).collect()
            }
        }
    }
}

/// Fill invalid interior values with the midpoint of the previous (already
/// filled) value and the next valid one
fn interpolate(run: Vec<Event>, path: &FieldPath) -> Vec<Event> {
    let mut filled: Vec<Event> = Vec::with_capacity(run.len());
    let last = run.len().saturating_sub(1);

    for (i, event) in run.iter().enumerate() {
        if i == 0 || i == last {
            filled.push(event.clone());
            continue;
        }

        let current = event.get_path(path);
        if is_valid(current) {
            if current.is_some_and(|v| !v.is_number()) {
                Warning::NonNumericValue {
                    context: "filler",
                    path: path.to_dotted(),
                }
                .emit();
                return run;
            }
            filled.push(event.clone());
            continue;
        }

        let previous = filled[i - 1].get_f64(path);
        let next = run[i + 1..]
            .iter()
            .map(|e| e.get_path(path))
            .find(|v| is_valid(*v))
            .and_then(|v| v.and_then(Value::as_f64));

        match (previous, next) {
            (Some(p), Some(n)) => filled.push(event.with_value(path, Value::from((p + n) / 2.0))),
            _ => filled.push(event.clone()),
        }
    }
    filled
}

impl Processor for Filler {
    fn name(&self) -> &'static str {
        "filler"
    }

    fn fresh(&self) -> Box<dyn Processor> {
        Box::new(Filler {
            options: self.options.clone(),
            previous: None,
            counts: HashMap::new(),
            last_good: None,
            cache: Vec::new(),
        })
    }

    fn add_event(&mut self, event: Event, out: &mut Emitter<'_>) -> PipelineResult<()> {
        if !out.has_observers() {
            return Ok(());
        }
        match self.options.method {
            FillMethod::Zero | FillMethod::Pad => {
                let filled = self.pad_or_zero(&event);
                out.emit(filled)
            }
            FillMethod::Linear => {
                for released in self.linear(event) {
                    out.emit(released)?;
                }
                Ok(())
            }
        }
    }

    fn flush(&mut self, out: &mut Emitter<'_>) -> PipelineResult<()> {
        if !out.has_observers() || self.options.method != FillMethod::Linear {
            return Ok(());
        }
        if !self.cache.is_empty() {
            tracing::debug!(count = self.cache.len(), "releasing unfilled events");
        }
        for event in std::mem::take(&mut self.cache) {
            out.emit(event)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::processor::testing::{run, run_unflushed};
    use serde_json::json;

    fn series(values: &[Value]) -> Vec<Event> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| Event::new(i as i64 * 1000, json!({"value": v})).unwrap())
            .collect()
    }

    fn values(events: &[Event]) -> Vec<Value> {
        events
            .iter()
            .map(|e| e.value().cloned().unwrap_or(Value::Null))
            .collect()
    }

    #[test]
    fn test_zero_fill() {
        let mut filler = Filler::new(FillOptions::new()).unwrap();
        let events = vec![
            Event::new(0, json!({"in": 1, "out": null})).unwrap(),
            Event::new(1000, json!({"in": "", "out": {"a": null, "b": 2}})).unwrap(),
        ];
        let out = run(&mut filler, events).unwrap();
        assert_eq!(out[0].get("out"), Some(&json!(0)));
        assert_eq!(out[1].get("in"), Some(&json!(0)));
        assert_eq!(out[1].get("out.a"), Some(&json!(0)));
        assert_eq!(out[1].get("out.b"), Some(&json!(2)));
    }

    #[test]
    fn test_pad_fill() {
        let mut filler = Filler::new(FillOptions::new().method(FillMethod::Pad)).unwrap();
        let out = run(
            &mut filler,
            series(&[Value::Null, json!(1), Value::Null, Value::Null, json!(3)]),
        )
        .unwrap();
        assert_eq!(
            values(&out),
            vec![Value::Null, json!(1), json!(1), json!(1), json!(3)]
        );
    }

    #[test]
    fn test_fill_limit() {
        let mut filler = Filler::new(
            FillOptions::new()
                .method(FillMethod::Pad)
                .field_spec(["value"])
                .fill_limit(2),
        )
        .unwrap();
        let out = run(
            &mut filler,
            series(&[
                json!(1),
                Value::Null,
                Value::Null,
                Value::Null,
                json!(5),
                Value::Null,
            ]),
        )
        .unwrap();
        assert_eq!(
            values(&out),
            vec![json!(1), json!(1), json!(1), Value::Null, json!(5), json!(5)]
        );
    }

    #[test]
    fn test_list_fill() {
        let mut zero = Filler::new(FillOptions::new()).unwrap();
        let event = Event::new(0, json!({"value": [1, null, 3]})).unwrap();
        let out = run(&mut zero, vec![event.clone()]).unwrap();
        assert_eq!(out[0].value(), Some(&json!([1, 0, 3])));

        let mut pad = Filler::new(FillOptions::new().method(FillMethod::Pad)).unwrap();
        let out = run(&mut pad, vec![event.clone()]).unwrap();
        assert_eq!(out[0].value(), Some(&json!([1, 1, 3])));

        let mut linear = Filler::new(FillOptions::new().method(FillMethod::Linear)).unwrap();
        let out = run(&mut linear, vec![event]).unwrap();
        assert_eq!(out[0].value(), Some(&json!([1, 2.0, 3])));
    }

    #[test]
    fn test_linear_fill() {
        let mut filler = Filler::new(FillOptions::new().method(FillMethod::Linear)).unwrap();
        let out = run(
            &mut filler,
            series(&[
                json!(1),
                Value::Null,
                Value::Null,
                json!(3),
                Value::Null,
                json!(5),
            ]),
        )
        .unwrap();
        assert_eq!(out.len(), 6);
        let got: Vec<f64> = out.iter().filter_map(|e| e.value().and_then(Value::as_f64)).collect();
        assert_eq!(got, vec![1.0, 2.0, 2.5, 3.0, 4.0, 5.0]);
        let times: Vec<i64> = out.iter().map(Event::timestamp_ms).collect();
        assert_eq!(times, vec![0, 1000, 2000, 3000, 4000, 5000]);
    }

    #[test]
    fn test_linear_leading_invalid_passes_through() {
        let mut filler = Filler::new(FillOptions::new().method(FillMethod::Linear)).unwrap();
        let out = run(&mut filler, series(&[Value::Null, json!(2), json!(4)])).unwrap();
        assert_eq!(values(&out), vec![Value::Null, json!(2), json!(4)]);
    }

    #[test]
    fn test_linear_flush_releases_cache() {
        let mut filler = Filler::new(FillOptions::new().method(FillMethod::Linear)).unwrap();
        let events = series(&[json!(1), Value::Null, Value::Null]);
        let unflushed = run_unflushed(&mut filler.clone(), events.clone()).unwrap();
        assert_eq!(unflushed.len(), 1);
        let out = run(&mut filler, events).unwrap();
        assert_eq!(values(&out), vec![json!(1), Value::Null, Value::Null]);
    }

    #[test]
    fn test_linear_limit_releases_unfilled() {
        let mut filler = Filler::new(
            FillOptions::new().method(FillMethod::Linear).fill_limit(2),
        )
        .unwrap();
        let out = run(
            &mut filler,
            series(&[json!(1), Value::Null, Value::Null, json!(4), Value::Null, json!(6)]),
        )
        .unwrap();
        assert_eq!(
            values(&out),
            vec![json!(1), Value::Null, Value::Null, json!(4), json!(5.0), json!(6)]
        );
    }

    #[test]
    fn test_linear_requires_single_field() {
        let options = FillOptions::new()
            .method(FillMethod::Linear)
            .field_spec(["in", "out"]);
        assert!(Filler::new(options).is_err());
        assert!("spline".parse::<FillMethod>().is_err());
    }
}
