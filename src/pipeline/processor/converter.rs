//! Converter: change an event's variant
//!
//! ```text
//! point ──(duration, front|center|behind)──▶ range
//! point ──(duration)───────────────────────▶ indexed
//! range | indexed ──(lag|center|lead)──────▶ point
//! indexed ─────────────────────────────────▶ range
//! ```
//!
//! Range to indexed is not possible: a range does not name a bucket.

use std::str::FromStr;

use chrono::Duration;

use super::{Emitter, Processor};
use crate::event::{Event, EventKey, EventType};
use crate::pipeline::error::{PipelineResult, ProcessorError, ProcessorResult};
use crate::time::{Index, TimeRange};

/// Where the source instant sits in the converted event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    /// The point starts the range
    Front,
    /// The point, or result, sits mid-range
    #[default]
    Center,
    /// The point ends the range
    Behind,
    /// Result point at the begin of the range
    Lag,
    /// Result point at the end of the range
    Lead,
}

impl FromStr for Alignment {
    type Err = ProcessorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "front" => Ok(Alignment::Front),
            "center" => Ok(Alignment::Center),
            "behind" => Ok(Alignment::Behind),
            "lag" => Ok(Alignment::Lag),
            "lead" => Ok(Alignment::Lead),
            other => Err(ProcessorError::invalid(
                "converter",
                format!("unknown alignment '{}'", other),
            )),
        }
    }
}

impl std::fmt::Display for Alignment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Alignment::Front => "front",
            Alignment::Center => "center",
            Alignment::Behind => "behind",
            Alignment::Lag => "lag",
            Alignment::Lead => "lead",
        };
        write!(f, "{}", s)
    }
}

/// Options shared by `as_events`, `as_time_range_events` and
/// `as_indexed_events`
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    pub alignment: Alignment,
    /// Fixed window such as `1h`; needed when converting from points
    pub duration: Option<String>,
}

impl ConvertOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn duration(mut self, duration: impl Into<String>) -> Self {
        self.duration = Some(duration.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct Converter {
    target: EventType,
    alignment: Alignment,
    duration: Option<(String, i64)>,
}

impl Converter {
    pub fn new(target: EventType, options: ConvertOptions) -> ProcessorResult<Self> {
        let duration = match options.duration {
            Some(d) => {
                let ms = Index::window_duration(&d)
                    .filter(|_| !d.contains('-'))
                    .ok_or_else(|| {
                        ProcessorError::invalid("converter", format!("invalid duration '{}'", d))
                    })?;
                Some((d, ms))
            }
            None => None,
        };
        Ok(Self {
            target,
            alignment: options.alignment,
            duration,
        })
    }

    fn conversion_error(&self, from: EventType, reason: impl Into<String>) -> ProcessorError {
        ProcessorError::Conversion {
            from,
            to: self.target,
            reason: reason.into(),
        }
    }

    fn require_duration(&self, from: EventType) -> ProcessorResult<&(String, i64)> {
        self.duration
            .as_ref()
            .ok_or_else(|| self.conversion_error(from, "a duration is required"))
    }

    fn convert(&self, event: &Event) -> ProcessorResult<Event> {
        let from = event.event_type();
        if from == self.target {
            return Ok(event.clone());
        }

        match (from, self.target) {
            (EventType::Point, EventType::Range) => {
                let (_, ms) = self.require_duration(from)?;
                let ts = event.timestamp();
                let d = Duration::milliseconds(*ms);
                let range = match self.alignment {
                    Alignment::Front => TimeRange::new(ts, ts + d)?,
                    Alignment::Center => {
                        let half = Duration::milliseconds(ms / 2);
                        TimeRange::new(ts - half, ts + half)?
                    }
                    Alignment::Behind => TimeRange::new(ts - d, ts)?,
                    other => {
                        return Err(self.conversion_error(
                            from,
                            format!("alignment '{}' applies to point results", other),
                        ))
                    }
                };
                Ok(event.rekey(EventKey::Range(range)))
            }
            (EventType::Point, EventType::Indexed) => {
                let (window, _) = self.require_duration(from)?;
                let key = Index::get_index_string(window, &event.timestamp())?;
                Ok(event.rekey(EventKey::Index(Index::new(key)?)))
            }
            (EventType::Range, EventType::Point) | (EventType::Indexed, EventType::Point) => {
                let range = event
                    .timerange()
                    .ok_or_else(|| self.conversion_error(from, "event has no range"))?;
                let t = match self.alignment {
                    Alignment::Lag => range.begin(),
                    Alignment::Center => {
                        range.begin() + Duration::milliseconds(range.duration() / 2)
                    }
                    Alignment::Lead => range.end(),
                    other => {
                        return Err(self.conversion_error(
                            from,
                            format!("alignment '{}' applies to range results", other),
                        ))
                    }
                };
                Ok(event.rekey(EventKey::Time(t)))
            }
            (EventType::Indexed, EventType::Range) => {
                let range = event
                    .timerange()
                    .ok_or_else(|| self.conversion_error(from, "event has no range"))?;
                Ok(event.rekey(EventKey::Range(range)))
            }
            (from, _) => Err(self.conversion_error(from, "no bucket can be derived")),
        }
    }
}

impl Processor for Converter {
    fn name(&self) -> &'static str {
        "converter"
    }

    fn fresh(&self) -> Box<dyn Processor> {
        Box::new(self.clone())
    }

    fn add_event(&mut self, event: Event, out: &mut Emitter<'_>) -> PipelineResult<()> {
        if !out.has_observers() {
            return Ok(());
        }
        let converted = self.convert(&event)?;
        out.emit(converted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::processor::testing::run;
    use serde_json::json;

    const HOUR: i64 = 3_600_000;
    const T: i64 = 1_426_316_400_000;

    fn point() -> Event {
        Event::new(T, json!({"value": 3})).unwrap()
    }

    fn convert(target: EventType, options: ConvertOptions, event: Event) -> PipelineResult<Event> {
        let mut converter = Converter::new(target, options)?;
        let mut out = run(&mut converter, vec![event])?;
        Ok(out.remove(0))
    }

    #[test]
    fn test_point_to_range_alignments() {
        let front = convert(
            EventType::Range,
            ConvertOptions::new().duration("1h").alignment(Alignment::Front),
            point(),
        )
        .unwrap();
        assert_eq!(front.timerange(), Some(TimeRange::from_millis(T, T + HOUR).unwrap()));

        let center = convert(EventType::Range, ConvertOptions::new().duration("1h"), point()).unwrap();
        assert_eq!(
            center.timerange(),
            Some(TimeRange::from_millis(T - HOUR / 2, T + HOUR / 2).unwrap())
        );

        let behind = convert(
            EventType::Range,
            ConvertOptions::new().duration("1h").alignment(Alignment::Behind),
            point(),
        )
        .unwrap();
        assert_eq!(behind.timerange(), Some(TimeRange::from_millis(T - HOUR, T).unwrap()));
        assert_eq!(behind.value(), Some(&json!(3)));
    }

    #[test]
    fn test_point_to_indexed() {
        let out = convert(EventType::Indexed, ConvertOptions::new().duration("1h"), point()).unwrap();
        let expected = Index::get_index_string("1h", &point().timestamp()).unwrap();
        assert_eq!(out.index().map(|i| i.as_string().to_string()), Some(expected));
    }

    #[test]
    fn test_point_conversion_needs_duration() {
        let err = convert(EventType::Range, ConvertOptions::new(), point()).unwrap_err();
        assert!(matches!(
            err,
            crate::pipeline::PipelineError::Processor(ProcessorError::Conversion { .. })
        ));
    }

    #[test]
    fn test_range_to_point() {
        let range = Event::with_range(TimeRange::from_millis(T, T + HOUR).unwrap(), json!(1));
        let lag = convert(
            EventType::Point,
            ConvertOptions::new().alignment(Alignment::Lag),
            range.clone(),
        )
        .unwrap();
        assert_eq!(lag.timestamp_ms(), T);
        let center = convert(EventType::Point, ConvertOptions::new(), range.clone()).unwrap();
        assert_eq!(center.timestamp_ms(), T + HOUR / 2);
        let lead = convert(
            EventType::Point,
            ConvertOptions::new().alignment(Alignment::Lead),
            range,
        )
        .unwrap();
        assert_eq!(lead.timestamp_ms(), T + HOUR);
    }

    #[test]
    fn test_indexed_to_range_and_point() {
        let indexed = Event::indexed("1d-12355", true, json!(1)).unwrap();
        let range = convert(EventType::Range, ConvertOptions::new(), indexed.clone()).unwrap();
        assert_eq!(range.event_type(), EventType::Range);
        assert_eq!(range.begin(), indexed.begin());
        let point = convert(
            EventType::Point,
            ConvertOptions::new().alignment(Alignment::Lag),
            indexed.clone(),
        )
        .unwrap();
        assert_eq!(point.timestamp(), indexed.begin());
    }

    #[test]
    fn test_range_to_indexed_fails() {
        let range = Event::with_range(TimeRange::from_millis(T, T + HOUR).unwrap(), json!(1));
        assert!(convert(EventType::Indexed, ConvertOptions::new().duration("1h"), range).is_err());
    }

    #[test]
    fn test_same_type_passes_through() {
        let out = convert(EventType::Point, ConvertOptions::new(), point()).unwrap();
        assert_eq!(out, point());
    }

    #[test]
    fn test_bad_options() {
        assert!("sideways".parse::<Alignment>().is_err());
        assert!(Converter::new(EventType::Range, ConvertOptions::new().duration("soon")).is_err());
        assert!(Converter::new(EventType::Range, ConvertOptions::new().duration("1h-3")).is_err());
    }
}
