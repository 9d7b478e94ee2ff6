//! Index: string keys for time buckets
//!
//! An index string names either a calendar bucket or a fixed-size bucket:
//!
//! ```text
//! "2014"         -> [2014-01-01 00:00:00, 2014-12-31 23:59:59]
//! "2014-09"      -> [2014-09-01 00:00:00, 2014-09-30 23:59:59]
//! "2014-09-17"   -> [2014-09-17 00:00:00, 2014-09-17 23:59:59]
//! "5m-4754394"   -> [4754394 * 300000 ms, 4754395 * 300000 ms]
//! ```
//!
//! Calendar buckets always resolve in UTC. Asking for a local-time index is
//! allowed but produces a warning and the bucket is still resolved in UTC.

use super::error::{IndexError, IndexResult};
use super::range::TimeRange;
use super::util;
use crate::error::Warning;
use chrono::{DateTime, Local, NaiveDate, Utc};
use regex::Regex;
use std::sync::OnceLock;

fn fixed_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(\d+)([smhd])(?:-(-?\d+))?$").expect("fixed window pattern compiles")
    })
}

/// What kind of bucket an index string names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum BucketKind {
    Fixed,
    Year,
    Month,
    Day,
}

/// A parsed index string with its resolved time range
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Index {
    key: String,
    utc: bool,
    kind: BucketKind,
    range: TimeRange,
}

impl Index {
    /// Parse a UTC index string
    pub fn new(s: impl Into<String>) -> IndexResult<Self> {
        Self::with_utc(s, true)
    }

    /// Parse an index string, recording whether local time was requested
    pub fn with_utc(s: impl Into<String>, utc: bool) -> IndexResult<Self> {
        let key = s.into();
        let (kind, range) = resolve(&key)?;

        if !utc && kind != BucketKind::Fixed {
            Warning::LocalTimeCoerced { index: key.clone() }.emit();
        }

        Ok(Self {
            key,
            utc,
            kind,
            range,
        })
    }

    /// The index string
    pub fn as_string(&self) -> &str {
        &self.key
    }

    pub fn utc(&self) -> bool {
        self.utc
    }

    pub fn as_timerange(&self) -> TimeRange {
        self.range
    }

    pub fn begin(&self) -> DateTime<Utc> {
        self.range.begin()
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.range.end()
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::String(self.key.clone())
    }

    /// Human rendering of calendar indexes, `fmt` is a chrono format string
    ///
    /// Defaults: `2014`, `September`, `September 17 2014`. Fixed indexes are
    /// returned unchanged.
    pub fn to_nice_string(&self, fmt: Option<&str>) -> String {
        let begin = self.range.begin();
        match (self.kind, fmt) {
            (BucketKind::Fixed, _) => self.key.clone(),
            (_, Some(fmt)) => begin.format(fmt).to_string(),
            (BucketKind::Year, None) => begin.format("%Y").to_string(),
            (BucketKind::Month, None) => begin.format("%B").to_string(),
            (BucketKind::Day, None) => begin.format("%B %-d %Y").to_string(),
        }
    }

    /// Index string of the fixed bucket containing `t`, e.g. `5m-4754394`
    pub fn get_index_string(win: &str, t: &DateTime<Utc>) -> IndexResult<String> {
        let pos = Self::window_position_from_date(win, t)?;
        Ok(format!("{}-{}", win, pos))
    }

    /// Every fixed bucket index touched by `range`, inclusive at both ends
    pub fn get_index_string_list(win: &str, range: &TimeRange) -> IndexResult<Vec<String>> {
        let first = Self::window_position_from_date(win, &range.begin())?;
        let last = Self::window_position_from_date(win, &range.end())?;
        Ok((first..=last).map(|pos| format!("{}-{}", win, pos)).collect())
    }

    /// Bucket position of `t` for a fixed window
    pub fn window_position_from_date(win: &str, t: &DateTime<Utc>) -> IndexResult<i64> {
        let duration = fixed_window_millis(win)?;
        Ok(util::ms_from_dt(t).div_euclid(duration))
    }

    /// `YYYY-MM-DD` of `t`, in UTC or the local zone
    pub fn get_daily_index_string(t: &DateTime<Utc>, utc: bool) -> String {
        calendar_string(t, utc, "%Y-%m-%d")
    }

    /// `YYYY-MM` of `t`, in UTC or the local zone
    pub fn get_monthly_index_string(t: &DateTime<Utc>, utc: bool) -> String {
        calendar_string(t, utc, "%Y-%m")
    }

    /// `YYYY` of `t`, in UTC or the local zone
    pub fn get_yearly_index_string(t: &DateTime<Utc>, utc: bool) -> String {
        calendar_string(t, utc, "%Y")
    }

    /// Bucket length in ms of a fixed window (`5m`) or fixed index
    /// (`5m-4754394`); `None` for calendar strings
    pub fn window_duration(s: &str) -> Option<i64> {
        let caps = fixed_pattern().captures(s)?;
        unit_millis(&caps[1], &caps[2])
    }
}

impl std::fmt::Display for Index {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key)
    }
}

fn calendar_string(t: &DateTime<Utc>, utc: bool, fmt: &str) -> String {
    if utc {
        t.format(fmt).to_string()
    } else {
        t.with_timezone(&Local).format(fmt).to_string()
    }
}

fn unit_millis(count: &str, unit: &str) -> Option<i64> {
    let count: i64 = count.parse().ok()?;
    let unit = match unit {
        "s" => 1000,
        "m" => 60 * 1000,
        "h" => 60 * 60 * 1000,
        "d" => 24 * 60 * 60 * 1000,
        _ => return None,
    };
    count.checked_mul(unit).filter(|ms| *ms > 0)
}

/// Bucket length of a bare fixed window like `30s`
pub(crate) fn fixed_window_millis(win: &str) -> IndexResult<i64> {
    let caps = fixed_pattern()
        .captures(win)
        .filter(|c| c.get(3).is_none())
        .ok_or_else(|| IndexError::Window(win.to_string()))?;
    unit_millis(&caps[1], &caps[2]).ok_or_else(|| IndexError::Window(win.to_string()))
}

fn resolve(key: &str) -> IndexResult<(BucketKind, TimeRange)> {
    if let Some(caps) = fixed_pattern().captures(key) {
        let pos = caps.get(3).ok_or_else(|| IndexError::Parse(key.to_string()))?;
        let duration =
            unit_millis(&caps[1], &caps[2]).ok_or_else(|| IndexError::Parse(key.to_string()))?;
        let pos: i64 = pos
            .as_str()
            .parse()
            .map_err(|_| IndexError::Parse(key.to_string()))?;
        let begin = pos
            .checked_mul(duration)
            .ok_or_else(|| IndexError::Parse(key.to_string()))?;
        let end = begin
            .checked_add(duration)
            .ok_or_else(|| IndexError::Parse(key.to_string()))?;
        let range = TimeRange::from_millis(begin, end)?;
        return Ok((BucketKind::Fixed, range));
    }

    let parse_err = || IndexError::Parse(key.to_string());
    let parts: Vec<&str> = key.split('-').collect();
    let number = |s: &str| -> IndexResult<u32> {
        if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit()) {
            return Err(parse_err());
        }
        s.parse().map_err(|_| parse_err())
    };

    match parts.as_slice() {
        [year] => {
            let year = number(year)? as i32;
            let begin = util::utc_midnight(year, 1, 1).ok_or_else(parse_err)?;
            let end = util::utc_end_of_day(year, 12, 31).ok_or_else(parse_err)?;
            Ok((BucketKind::Year, TimeRange::new(begin, end)?))
        }
        [year, month] => {
            let year = number(year)? as i32;
            let month = number(month)?;
            let begin = util::utc_midnight(year, month, 1).ok_or_else(parse_err)?;
            let end = util::month_end(&begin).ok_or_else(parse_err)?;
            Ok((BucketKind::Month, TimeRange::new(begin, end)?))
        }
        [year, month, day] => {
            let year = number(year)? as i32;
            let month = number(month)?;
            let day = number(day)?;
            NaiveDate::from_ymd_opt(year, month, day).ok_or_else(parse_err)?;
            let begin = util::utc_midnight(year, month, day).ok_or_else(parse_err)?;
            let end = util::utc_end_of_day(year, month, day).ok_or_else(parse_err)?;
            Ok((BucketKind::Day, TimeRange::new(begin, end)?))
        }
        _ => Err(parse_err()),
    }
}
