//! TimeRange: an ordered pair of instants
//!
//! Unlike a query window, a pond range is closed on both ends: an instant
//! equal to `end` is contained. `begin <= end` is enforced at construction and
//! every mutator returns a new value.

use super::error::{TimeRangeError, TimeRangeResult};
use super::util::{self, IntoInstant};
use chrono::{DateTime, Duration, Utc};
use serde::{Serialize, Serializer};

/// A closed time interval `[begin, end]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeRange {
    begin: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeRange {
    /// Create a range from two instants
    pub fn new(begin: impl IntoInstant, end: impl IntoInstant) -> TimeRangeResult<Self> {
        let begin = begin.into_instant()?;
        let end = end.into_instant()?;
        Self::validate(begin, end)
    }

    /// Create a range from epoch milliseconds
    pub fn from_millis(begin: i64, end: i64) -> TimeRangeResult<Self> {
        Self::new(begin, end)
    }

    /// Create a range from a `[begin_ms, end_ms]` JSON pair
    pub fn from_json(value: &serde_json::Value) -> TimeRangeResult<Self> {
        let pair = value
            .as_array()
            .filter(|a| a.len() == 2)
            .ok_or_else(|| TimeRangeError::Malformed(format!("expected [begin, end], got {}", value)))?;
        let begin = pair[0]
            .as_i64()
            .ok_or_else(|| TimeRangeError::Malformed(format!("bad begin: {}", pair[0])))?;
        let end = pair[1]
            .as_i64()
            .ok_or_else(|| TimeRangeError::Malformed(format!("bad end: {}", pair[1])))?;
        Self::from_millis(begin, end)
    }

    fn validate(begin: DateTime<Utc>, end: DateTime<Utc>) -> TimeRangeResult<Self> {
        if begin > end {
            return Err(TimeRangeError::Inverted {
                begin: begin.timestamp_millis(),
                end: end.timestamp_millis(),
            });
        }
        Ok(Self { begin, end })
    }

    /// The last 24 hours
    pub fn last_day() -> Self {
        Self::last(Duration::days(1))
    }

    /// The last 7 days
    pub fn last_seven_days() -> Self {
        Self::last(Duration::days(7))
    }

    /// The last 30 days
    pub fn last_thirty_days() -> Self {
        Self::last(Duration::days(30))
    }

    /// The last 90 days
    pub fn last_ninety_days() -> Self {
        Self::last(Duration::days(90))
    }

    fn last(span: Duration) -> Self {
        let end = Utc::now();
        Self {
            begin: end - span,
            end,
        }
    }

    pub fn begin(&self) -> DateTime<Utc> {
        self.begin
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn begin_millis(&self) -> i64 {
        self.begin.timestamp_millis()
    }

    pub fn end_millis(&self) -> i64 {
        self.end.timestamp_millis()
    }

    /// New range with a different begin
    pub fn set_begin(&self, begin: impl IntoInstant) -> TimeRangeResult<Self> {
        Self::validate(begin.into_instant()?, self.end)
    }

    /// New range with a different end
    pub fn set_end(&self, end: impl IntoInstant) -> TimeRangeResult<Self> {
        Self::validate(self.begin, end.into_instant()?)
    }

    /// Same begin and end
    pub fn equals(&self, other: &TimeRange) -> bool {
        self == other
    }

    /// Check if `other` lies entirely inside this range
    pub fn contains(&self, other: &TimeRange) -> bool {
        self.begin <= other.begin && self.end >= other.end
    }

    /// Check if an instant falls within this range (inclusive on both ends)
    pub fn contains_time(&self, t: &DateTime<Utc>) -> bool {
        self.begin <= *t && *t <= self.end
    }

    /// Check if this range lies entirely inside `other`
    pub fn within(&self, other: &TimeRange) -> bool {
        other.contains(self)
    }

    /// Check if exactly one end of `other` falls inside this range
    ///
    /// A range fully containing the other is not an overlap in this sense.
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        let has_begin = self.contains_time(&other.begin);
        let has_end = self.contains_time(&other.end);
        (has_begin && !has_end) || (has_end && !has_begin)
    }

    /// Check if the ranges share no instant
    pub fn disjoint(&self, other: &TimeRange) -> bool {
        self.end < other.begin || self.begin > other.end
    }

    /// Smallest range covering both
    pub fn extents(&self, other: &TimeRange) -> TimeRange {
        Self {
            begin: self.begin.min(other.begin),
            end: self.end.max(other.end),
        }
    }

    /// Shared portion of both ranges, if any
    pub fn intersection(&self, other: &TimeRange) -> Option<TimeRange> {
        if self.disjoint(other) {
            return None;
        }
        Some(Self {
            begin: self.begin.max(other.begin),
            end: self.end.min(other.end),
        })
    }

    /// Duration in milliseconds
    pub fn duration(&self) -> i64 {
        self.end_millis() - self.begin_millis()
    }

    /// Duration as rough human text, e.g. "5 minutes"
    pub fn humanize_duration(&self) -> String {
        util::humanize_millis(self.duration())
    }

    /// `[begin_ms, end_ms]`
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!([self.begin_millis(), self.end_millis()])
    }

    /// `[Thu, 30 Oct 2003 00:00:00 UTC, Fri, 31 Oct 2003 00:00:00 UTC]`
    pub fn to_utc_string(&self) -> String {
        format!(
            "[{}, {}]",
            util::format_utc(&self.begin),
            util::format_utc(&self.end)
        )
    }
}

impl std::fmt::Display for TimeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.begin_millis(), self.end_millis())
    }
}

impl Serialize for TimeRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        [self.begin_millis(), self.end_millis()].serialize(serializer)
    }
}
