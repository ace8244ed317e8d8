//! Bucket widths and boundary arithmetic.
//!
//! All truncation happens in one fixed offset per call. Mixing offsets
//! would misalign day, week and month boundaries.

use std::fmt;
use std::str::FromStr;

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, Months, NaiveDateTime, NaiveTime, Timelike,
};
use serde::{Deserialize, Serialize};

use crate::error::AggregateError;

/// Width of an aggregation bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Hourly,
    Daily,
    /// ISO weeks, starting Monday 00:00.
    Weekly,
    Monthly,
}

impl Granularity {
    pub fn as_str(self) -> &'static str {
        match self {
            Granularity::Hourly => "hourly",
            Granularity::Daily => "daily",
            Granularity::Weekly => "weekly",
            Granularity::Monthly => "monthly",
        }
    }

    /// Start of the bucket containing `t`, in `t`'s offset.
    pub fn truncate(self, t: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
        let local = t.naive_local();
        let midnight = local.date().and_time(NaiveTime::MIN);

        let start = match self {
            Granularity::Hourly => midnight + Duration::hours(i64::from(local.hour())),
            Granularity::Daily => midnight,
            Granularity::Weekly => {
                midnight - Duration::days(i64::from(local.weekday().num_days_from_monday()))
            }
            Granularity::Monthly => midnight - Duration::days(i64::from(local.day0())),
        };

        from_local(start, *t.offset())
    }

    /// Start of the bucket following the one that starts at `bucket_start`.
    /// `None` only when the calendar overflows.
    pub fn next(self, bucket_start: DateTime<FixedOffset>) -> Option<DateTime<FixedOffset>> {
        let local = bucket_start.naive_local();
        let next = match self {
            Granularity::Hourly => local.checked_add_signed(Duration::hours(1))?,
            Granularity::Daily => local.checked_add_signed(Duration::days(1))?,
            Granularity::Weekly => local.checked_add_signed(Duration::weeks(1))?,
            Granularity::Monthly => local.checked_add_months(Months::new(1))?,
        };
        Some(from_local(next, *bucket_start.offset()))
    }
}

fn from_local(local: NaiveDateTime, offset: FixedOffset) -> DateTime<FixedOffset> {
    let utc = local - Duration::seconds(i64::from(offset.local_minus_utc()));
    DateTime::from_naive_utc_and_offset(utc, offset)
}

impl FromStr for Granularity {
    type Err = AggregateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hourly" | "hour" => Ok(Granularity::Hourly),
            "daily" | "day" => Ok(Granularity::Daily),
            "weekly" | "week" => Ok(Granularity::Weekly),
            "monthly" | "month" => Ok(Granularity::Monthly),
            _ => Err(AggregateError::InvalidGranularity(s.to_string())),
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn at(tz: FixedOffset, y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<FixedOffset> {
        tz.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_parse_granularity() {
        assert_eq!("hourly".parse::<Granularity>().unwrap(), Granularity::Hourly);
        assert_eq!("Daily".parse::<Granularity>().unwrap(), Granularity::Daily);
        assert_eq!(" weekly ".parse::<Granularity>().unwrap(), Granularity::Weekly);
        assert_eq!("month".parse::<Granularity>().unwrap(), Granularity::Monthly);
    }

    #[test]
    fn test_parse_invalid_granularity() {
        let err = "yearly".parse::<Granularity>().unwrap_err();
        assert_eq!(err, AggregateError::InvalidGranularity("yearly".to_string()));
        assert!(err.to_string().contains("yearly"));
    }

    #[test]
    fn test_truncate_hourly_and_daily() {
        let t = at(utc(), 2024, 3, 15, 13, 47);
        assert_eq!(Granularity::Hourly.truncate(t), at(utc(), 2024, 3, 15, 13, 0));
        assert_eq!(Granularity::Daily.truncate(t), at(utc(), 2024, 3, 15, 0, 0));
    }

    #[test]
    fn test_truncate_weekly_is_monday() {
        // 2024-03-17 is a Sunday
        let t = at(utc(), 2024, 3, 17, 23, 59);
        assert_eq!(Granularity::Weekly.truncate(t), at(utc(), 2024, 3, 11, 0, 0));
        // Monday stays put
        let monday = at(utc(), 2024, 3, 11, 0, 0);
        assert_eq!(Granularity::Weekly.truncate(monday), monday);
    }

    #[test]
    fn test_truncate_monthly() {
        let t = at(utc(), 2024, 2, 29, 8, 0);
        assert_eq!(Granularity::Monthly.truncate(t), at(utc(), 2024, 2, 1, 0, 0));
    }

    #[test]
    fn test_truncate_uses_local_offset() {
        // 2024-03-01 03:00 UTC is still Feb 29 in UTC-8
        let pst = FixedOffset::west_opt(8 * 3600).unwrap();
        let t = utc_in(pst, 2024, 3, 1, 3);
        assert_eq!(Granularity::Daily.truncate(t), at(pst, 2024, 2, 29, 0, 0));
        assert_eq!(Granularity::Monthly.truncate(t), at(pst, 2024, 2, 1, 0, 0));
    }

    fn utc_in(tz: FixedOffset, y: i32, m: u32, d: u32, h: u32) -> DateTime<FixedOffset> {
        chrono::Utc
            .with_ymd_and_hms(y, m, d, h, 0, 0)
            .unwrap()
            .with_timezone(&tz)
    }

    #[test]
    fn test_next_boundaries() {
        let jan31 = at(utc(), 2024, 1, 31, 0, 0);
        assert_eq!(Granularity::Daily.next(jan31), Some(at(utc(), 2024, 2, 1, 0, 0)));

        let jan = at(utc(), 2024, 1, 1, 0, 0);
        assert_eq!(Granularity::Monthly.next(jan), Some(at(utc(), 2024, 2, 1, 0, 0)));

        let dec = at(utc(), 2024, 12, 1, 0, 0);
        assert_eq!(Granularity::Monthly.next(dec), Some(at(utc(), 2025, 1, 1, 0, 0)));

        let week = at(utc(), 2024, 3, 11, 0, 0);
        assert_eq!(Granularity::Weekly.next(week), Some(at(utc(), 2024, 3, 18, 0, 0)));

        let hour = at(utc(), 2024, 3, 11, 23, 0);
        assert_eq!(Granularity::Hourly.next(hour), Some(at(utc(), 2024, 3, 12, 0, 0)));
    }

    #[test]
    fn test_display_round_trips_parse() {
        for g in [
            Granularity::Hourly,
            Granularity::Daily,
            Granularity::Weekly,
            Granularity::Monthly,
        ] {
            assert_eq!(g.to_string().parse::<Granularity>().unwrap(), g);
        }
    }
}
