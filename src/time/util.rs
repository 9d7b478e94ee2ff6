//! Instant conversion and calendar helpers
//!
//! All instants inside pond are `DateTime<Utc>`. Values coming in from the
//! outside pass through [`IntoInstant`], which accepts epoch milliseconds and
//! timezone-aware datetimes but rejects naive ones: the library never guesses
//! a timezone for an instant.

use super::error::{UtilityError, UtilityResult};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Conversion into a UTC instant
pub trait IntoInstant {
    fn into_instant(self) -> UtilityResult<DateTime<Utc>>;
}

impl IntoInstant for i64 {
    fn into_instant(self) -> UtilityResult<DateTime<Utc>> {
        dt_from_ms(self)
    }
}

impl<Tz: TimeZone> IntoInstant for DateTime<Tz> {
    fn into_instant(self) -> UtilityResult<DateTime<Utc>> {
        Ok(self.with_timezone(&Utc))
    }
}

impl<Tz: TimeZone> IntoInstant for &DateTime<Tz> {
    fn into_instant(self) -> UtilityResult<DateTime<Utc>> {
        Ok(self.with_timezone(&Utc))
    }
}

impl IntoInstant for NaiveDateTime {
    fn into_instant(self) -> UtilityResult<DateTime<Utc>> {
        Err(UtilityError::NaiveDatetime(self.to_string()))
    }
}

/// Convert epoch milliseconds into a UTC instant
pub fn dt_from_ms(ms: i64) -> UtilityResult<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or(UtilityError::OutOfRange(ms))
}

/// Epoch milliseconds of an instant
pub fn ms_from_dt(dt: &DateTime<Utc>) -> i64 {
    dt.timestamp_millis()
}

/// Number of days in a month, accounting for leap years
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some(next.signed_duration_since(first).num_days() as u32)
}

/// Midnight UTC at the start of the given day
pub fn utc_midnight(year: i32, month: u32, day: u32) -> Option<DateTime<Utc>> {
    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?))
}

/// Last whole second of the given day, UTC
pub fn utc_end_of_day(year: i32, month: u32, day: u32) -> Option<DateTime<Utc>> {
    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    Some(Utc.from_utc_datetime(&date.and_hms_opt(23, 59, 59)?))
}

/// Last day of the month containing `dt`
pub fn month_end(dt: &DateTime<Utc>) -> Option<DateTime<Utc>> {
    let last = days_in_month(dt.year(), dt.month())?;
    utc_end_of_day(dt.year(), dt.month(), last)
}

/// RFC 2822 style UTC rendering, e.g. `Thu, 30 Oct 2003 00:00:00 UTC`
pub fn format_utc(dt: &DateTime<Utc>) -> String {
    dt.format("%a, %d %b %Y %H:%M:%S UTC").to_string()
}

/// Rough human description of a duration
pub fn humanize_millis(ms: i64) -> String {
    let secs = ms.abs() / 1000;
    let minutes = (secs as f64 / 60.0).round() as i64;
    let hours = (secs as f64 / 3600.0).round() as i64;
    let days = (secs as f64 / 86400.0).round() as i64;

    match secs {
        0..=44 => "a few seconds".to_string(),
        45..=89 => "a minute".to_string(),
        90..=2699 => format!("{} minutes", minutes),
        2700..=5399 => "an hour".to_string(),
        5400..=79199 => format!("{} hours", hours),
        79200..=129_599 => "a day".to_string(),
        129_600..=2_246_399 => format!("{} days", days),
        2_246_400..=3_887_999 => "a month".to_string(),
        3_888_000..=27_647_999 => format!("{} months", (days as f64 / 30.0).round() as i64),
        27_648_000..=47_347_199 => "a year".to_string(),
        _ => format!("{} years", (days as f64 / 365.0).round() as i64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn test_ms_round_trip() {
        let dt = dt_from_ms(1_429_673_400_000).unwrap();
        assert_eq!(ms_from_dt(&dt), 1_429_673_400_000);
        assert_eq!(dt.to_rfc3339(), "2015-04-22T03:30:00+00:00");
    }

    #[test]
    fn test_aware_datetime_is_converted() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let local = offset.with_ymd_and_hms(2015, 4, 22, 5, 30, 0).unwrap();
        let utc = local.into_instant().unwrap();
        assert_eq!(utc, Utc.with_ymd_and_hms(2015, 4, 22, 3, 30, 0).unwrap());
    }

    #[test]
    fn test_naive_datetime_rejected() {
        let naive = NaiveDate::from_ymd_opt(2015, 4, 22)
            .unwrap()
            .and_hms_opt(3, 30, 0)
            .unwrap();
        assert!(matches!(
            naive.into_instant(),
            Err(UtilityError::NaiveDatetime(_))
        ));
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2016, 2), Some(29));
        assert_eq!(days_in_month(2015, 2), Some(28));
        assert_eq!(days_in_month(2015, 12), Some(31));
        assert_eq!(days_in_month(2015, 13), None);
    }

    #[test]
    fn test_month_end() {
        let dt = Utc.with_ymd_and_hms(2014, 9, 17, 12, 0, 0).unwrap();
        let end = month_end(&dt).unwrap();
        assert_eq!(end, Utc.with_ymd_and_hms(2014, 9, 30, 23, 59, 59).unwrap());
    }

    #[test]
    fn test_humanize() {
        assert_eq!(humanize_millis(10_000), "a few seconds");
        assert_eq!(humanize_millis(5 * 60_000), "5 minutes");
        assert_eq!(humanize_millis(2 * 3_600_000), "2 hours");
        assert_eq!(humanize_millis(86_400_000), "a day");
        assert_eq!(humanize_millis(7 * 86_400_000), "7 days");
    }
}
