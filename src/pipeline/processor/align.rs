//! Align: resample irregular points onto fixed window boundaries
//!
//! ```text
//!   .75        2          1                  1
//!    *         *          *                  *
//! ---|----|----|----|----|----|----|----|----|--- 1m boundaries
//!         ^         ^    ^    ^    ^    ^
//!      emitted at every boundary crossed since the previous point
//! ```
//!
//! Each boundary crossed between two consecutive points gets one point event
//! carrying only the tracked fields, interpolated linearly or held from the
//! earlier point.

use std::str::FromStr;

use serde_json::Value;

use super::{Emitter, Processor};
use crate::error::Warning;
use crate::event::path::nested_set;
use crate::event::{field_spec, Data, Event, EventType, FieldPath};
use crate::pipeline::error::{PipelineResult, ProcessorError};
use crate::time::index::fixed_window_millis;
use crate::time::{Index, TimeRange};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlignMethod {
    #[default]
    Linear,
    Hold,
}

impl FromStr for AlignMethod {
    type Err = ProcessorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "linear" => Ok(AlignMethod::Linear),
            "hold" => Ok(AlignMethod::Hold),
            other => Err(ProcessorError::invalid(
                "align",
                format!("unknown method '{}'", other),
            )),
        }
    }
}

impl std::fmt::Display for AlignMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlignMethod::Linear => write!(f, "linear"),
            AlignMethod::Hold => write!(f, "hold"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AlignOptions {
    pub field_spec: Vec<FieldPath>,
    /// Fixed window such as `5m`
    pub window: String,
    pub method: AlignMethod,
    /// Gaps spanning more boundaries than this are filled with nulls
    pub limit: Option<usize>,
}

impl Default for AlignOptions {
    fn default() -> Self {
        Self {
            field_spec: field_spec(["value"]),
            window: "5m".to_string(),
            method: AlignMethod::default(),
            limit: None,
        }
    }
}

impl AlignOptions {
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

    pub fn window(mut self, window: impl Into<String>) -> Self {
        self.window = window.into();
        self
    }

    pub fn method(mut self, method: AlignMethod) -> Self {
        self.method = method;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[derive(Debug, Clone)]
pub struct Align {
    options: AlignOptions,
    window_ms: i64,
    previous: Option<Event>,
}

impl Align {
    pub fn new(options: AlignOptions) -> PipelineResult<Self> {
        let window_ms = fixed_window_millis(&options.window).map_err(|_| {
            ProcessorError::invalid("align", format!("invalid window '{}'", options.window))
        })?;
        if options.field_spec.is_empty() {
            return Err(ProcessorError::invalid("align", "field spec is empty").into());
        }
        Ok(Self {
            options,
            window_ms,
            previous: None,
        })
    }

    /// Begin of every window entered after `previous`, up to `current`
    fn boundaries(&self, previous: &Event, current: &Event) -> PipelineResult<Vec<i64>> {
        let window = &self.options.window;
        let prev_key = Index::get_index_string(window, &previous.timestamp())?;
        let curr_key = Index::get_index_string(window, &current.timestamp())?;
        if prev_key == curr_key {
            return Ok(Vec::new());
        }

        let range = TimeRange::new(previous.timestamp(), current.timestamp())
            .map_err(ProcessorError::from)?;
        Index::get_index_string_list(window, &range)?
            .iter()
            .skip(1)
            .map(|key| Ok(Index::new(key.as_str())?.begin().timestamp_millis()))
            .collect()
    }

    fn linear(&self, boundary: i64, previous: &Event, current: &Event) -> Data {
        let span = (current.timestamp_ms() - previous.timestamp_ms()) as f64;
        let fraction = (boundary - previous.timestamp_ms()) as f64 / span;

        let mut data = Data::new();
        for field in &self.options.field_spec {
            let value = match (previous.get_path(field), current.get_path(field)) {
                (Some(p), Some(c)) => match (p.as_f64(), c.as_f64()) {
                    (Some(p), Some(c)) => Value::from(p + fraction * (c - p)),
                    _ => Value::Null,
                },
                _ => Value::Null,
            };
            nested_set(&mut data, field, value);
        }
        data
    }

    fn hold(&self, previous: &Event) -> Data {
        let mut data = Data::new();
        for field in &self.options.field_spec {
            let value = previous.get_path(field).cloned().unwrap_or(Value::Null);
            nested_set(&mut data, field, value);
        }
        data
    }

    fn nulls(&self) -> Data {
        let mut data = Data::new();
        for field in &self.options.field_spec {
            nested_set(&mut data, field, Value::Null);
        }
        data
    }

    fn warn_non_numeric(&self, previous: &Event, current: &Event) {
        for field in &self.options.field_spec {
            let bad = [previous, current].iter().any(|e| {
                e.get_path(field)
                    .is_some_and(|v| !v.is_null() && !v.is_number())
            });
            if bad {
                Warning::NonNumericValue {
                    context: "align",
                    path: field.to_dotted(),
                }
                .emit();
            }
        }
    }

    fn point(&self, at_ms: i64, data: Data) -> PipelineResult<Event> {
        Ok(Event::new(at_ms, Value::Object(data))?)
    }
}

impl Processor for Align {
    fn name(&self) -> &'static str {
        "align"
    }

    fn fresh(&self) -> Box<dyn Processor> {
        Box::new(Align {
            options: self.options.clone(),
            window_ms: self.window_ms,
            previous: None,
        })
    }

    fn add_event(&mut self, event: Event, out: &mut Emitter<'_>) -> PipelineResult<()> {
        if !out.has_observers() {
            return Ok(());
        }
        if event.event_type() != EventType::Point {
            return Err(ProcessorError::UnsupportedEvent {
                processor: "align",
                event_type: event.event_type(),
            }
            .into());
        }

        let Some(previous) = self.previous.replace(event.clone()) else {
            if event.timestamp_ms().rem_euclid(self.window_ms) == 0 {
                out.emit(event)?;
            }
            return Ok(());
        };

        let boundaries = self.boundaries(&previous, &event)?;
        if boundaries.is_empty() {
            return Ok(());
        }

        let over_limit = self.options.limit.is_some_and(|limit| boundaries.len() > limit);
        if !over_limit && self.options.method == AlignMethod::Linear {
            self.warn_non_numeric(&previous, &event);
        }

        for boundary in boundaries {
            let data = if over_limit {
                self.nulls()
            } else {
                match self.options.method {
                    AlignMethod::Linear => self.linear(boundary, &previous, &event),
                    AlignMethod::Hold => self.hold(&previous),
                }
            };
            out.emit(self.point(boundary, data)?)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::processor::testing::run;
    use serde_json::json;

    fn simple_gap_data() -> Vec<Event> {
        [
            (1_471_824_030_000i64, json!(0.75)),
            (1_471_824_105_000, json!(2)),
            (1_471_824_210_000, json!(1)),
            (1_471_824_390_000, json!(1)),
            (1_471_824_510_000, json!(3)),
            (1_471_824_525_000, json!(5)),
        ]
        .into_iter()
        .map(|(ms, v)| Event::new(ms, json!({"value": v})).unwrap())
        .collect()
    }

    fn values(events: &[Event]) -> Vec<Option<f64>> {
        events
            .iter()
            .map(|e| e.value().and_then(Value::as_f64))
            .collect()
    }

    #[test]
    fn test_linear_align() {
        let mut align = Align::new(AlignOptions::new().window("1m")).unwrap();
        let out = run(&mut align, simple_gap_data()).unwrap();
        assert_eq!(out.len(), 8);
        assert_eq!(
            values(&out),
            vec![
                Some(1.25),
                Some(1.8571428571428572),
                Some(1.2857142857142856),
                Some(1.0),
                Some(1.0),
                Some(1.0),
                Some(1.5),
                Some(2.5),
            ]
        );
        assert!(out.iter().all(|e| e.timestamp_ms() % 60_000 == 0));
    }

    #[test]
    fn test_hold_align() {
        let mut align =
            Align::new(AlignOptions::new().window("1m").method(AlignMethod::Hold)).unwrap();
        let out = run(&mut align, simple_gap_data()).unwrap();
        assert_eq!(
            values(&out),
            vec![
                Some(0.75),
                Some(2.0),
                Some(2.0),
                Some(1.0),
                Some(1.0),
                Some(1.0),
                Some(1.0),
                Some(1.0),
            ]
        );
    }

    #[test]
    fn test_limit_fills_with_nulls() {
        let mut align = Align::new(
            AlignOptions::new()
                .window("1m")
                .method(AlignMethod::Hold)
                .limit(2),
        )
        .unwrap();
        let out = run(&mut align, simple_gap_data()).unwrap();
        assert_eq!(
            values(&out),
            vec![Some(0.75), Some(2.0), Some(2.0), None, None, None, Some(1.0), Some(1.0)]
        );
        assert_eq!(out[3].value(), Some(&Value::Null));
    }

    #[test]
    fn test_non_numeric_becomes_null() {
        let mut events = simple_gap_data();
        events[4] = Event::new(1_471_824_510_000i64, json!({"value": "non_numeric_value"})).unwrap();
        let mut align = Align::new(AlignOptions::new().window("1m")).unwrap();
        let out = run(&mut align, events).unwrap();
        assert_eq!(out.len(), 8);
        assert_eq!(out[5].value().and_then(Value::as_f64), Some(1.0));
        assert_eq!(out[6].value(), Some(&Value::Null));
        assert_eq!(out[7].value(), Some(&Value::Null));
    }

    #[test]
    fn test_first_event_on_boundary_is_emitted() {
        let mut align = Align::new(AlignOptions::new().window("30s")).unwrap();
        let first = Event::new(60_000, json!({"value": 1, "other": 4})).unwrap();
        let events = vec![first.clone(), Event::new(75_000, json!({"value": 2})).unwrap()];
        let out = run(&mut align, events).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0], first);
        assert_eq!(out[0].get("other"), Some(&json!(4)));
    }

    #[test]
    fn test_invalid_options() {
        assert!(Align::new(AlignOptions::new().window("1m-2")).is_err());
        assert!(Align::new(AlignOptions::new().window("weekly")).is_err());
        assert!("cubic".parse::<AlignMethod>().is_err());
    }

    #[test]
    fn test_rejects_indexed_events() {
        let mut align = Align::new(AlignOptions::new()).unwrap();
        let event = Event::indexed("1h-5", true, json!(1)).unwrap();
        assert!(run(&mut align, vec![event]).is_err());
    }
}
