use chrono::{DateTime, Days, LocalResult, NaiveDate, NaiveTime, Offset, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::{AppError, AppResult};

/// Half-open `[start, end)` range of UTC instants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    #[cfg(test)]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at < self.end
    }
}

/// What the user asked to see
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowSelector {
    Today,
    /// The rolling week: today and the six days before it
    Older,
    /// Inclusive calendar dates as submitted (`YYYY-MM-DD`)
    Range {
        start: Option<String>,
        end: Option<String>,
    },
}

/// The calendar date `now` falls on in `tz`
pub fn local_today(tz: Tz, now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(&tz).date_naive()
}

/// Local midnight of `day` as a UTC instant.
///
/// An ambiguous midnight resolves to its earlier instant. A midnight skipped
/// by a DST jump resolves to the instant the jump happens, i.e. the first
/// local instant of that day which exists.
pub fn local_midnight_utc(tz: Tz, day: NaiveDate) -> AppResult<DateTime<Utc>> {
    let midnight = day.and_time(NaiveTime::MIN);

    match tz.from_local_datetime(&midnight) {
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest.with_timezone(&Utc)),
        LocalResult::None => {
            let out_of_range = || AppError::Validation(format!("{} is out of range", day));

            let day_before = midnight
                .checked_sub_signed(TimeDelta::days(1))
                .ok_or_else(out_of_range)?;
            let before_gap = tz.offset_from_utc_datetime(&day_before).fix().local_minus_utc();
            let instant = midnight
                .checked_sub_signed(TimeDelta::seconds(i64::from(before_gap)))
                .ok_or_else(out_of_range)?;

            Ok(Utc.from_utc_datetime(&instant))
        }
    }
}

pub fn start_of_day(tz: Tz, now: DateTime<Utc>) -> AppResult<DateTime<Utc>> {
    local_midnight_utc(tz, local_today(tz, now))
}

/// The rolling week starts six calendar days before today, not at the start
/// of the calendar week.
fn week_start_date(today: NaiveDate) -> AppResult<NaiveDate> {
    today
        .checked_sub_days(Days::new(6))
        .ok_or_else(|| AppError::Validation("date out of range".to_string()))
}

/// Window covering the whole local days `first..=last`
fn day_range(tz: Tz, first: NaiveDate, last: NaiveDate) -> AppResult<TimeWindow> {
    let after_last = last
        .succ_opt()
        .ok_or_else(|| AppError::Validation("end date out of range".to_string()))?;

    Ok(TimeWindow {
        start: local_midnight_utc(tz, first)?,
        end: local_midnight_utc(tz, after_last)?,
    })
}

fn parse_date(field: &str, value: Option<&str>) -> AppResult<NaiveDate> {
    let value = value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Validation(format!("{} date is required", field)))?;

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| AppError::Validation(format!("Invalid {} date: {}", field, e)))
}

/// Resolves a selector to concrete instants. Explicit ranges that are
/// missing, malformed or reversed fail with `Validation`.
pub fn resolve_window(
    tz: Tz,
    now: DateTime<Utc>,
    selector: &WindowSelector,
) -> AppResult<TimeWindow> {
    let today = local_today(tz, now);

    match selector {
        WindowSelector::Today => day_range(tz, today, today),
        WindowSelector::Older => day_range(tz, week_start_date(today)?, today),
        WindowSelector::Range { start, end } => {
            let start = parse_date("start", start.as_deref())?;
            let end = parse_date("end", end.as_deref())?;
            if start > end {
                return Err(AppError::Validation(
                    "start date must not be after end date".to_string(),
                ));
            }
            day_range(tz, start, end)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::{America, Asia, Australia, Europe, Pacific};

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn range(start: &str, end: &str) -> WindowSelector {
        WindowSelector::Range {
            start: Some(start.to_string()),
            end: Some(end.to_string()),
        }
    }

    #[test]
    fn test_today_in_utc() {
        let window = resolve_window(Tz::UTC, utc(2024, 1, 1, 15, 30), &WindowSelector::Today).unwrap();
        assert_eq!(window.start, utc(2024, 1, 1, 0, 0));
        assert_eq!(window.end, utc(2024, 1, 2, 0, 0));
    }

    #[test]
    fn test_today_uses_local_date_not_utc_date() {
        // 02:00 UTC on the 2nd is still the 1st in New York
        let window = resolve_window(America::New_York, utc(2024, 1, 2, 2, 0), &WindowSelector::Today).unwrap();
        assert_eq!(window.start, utc(2024, 1, 1, 5, 0));
        assert_eq!(window.end, utc(2024, 1, 2, 5, 0));
    }

    #[test]
    fn test_rolling_week_across_spring_forward() {
        // DST started in New York on 2024-03-10
        let now = utc(2024, 3, 12, 15, 0);
        let window = resolve_window(America::New_York, now, &WindowSelector::Older).unwrap();

        assert_eq!(window.start, utc(2024, 3, 6, 5, 0));
        assert_eq!(window.end, utc(2024, 3, 13, 4, 0));
        assert_eq!(start_of_day(America::New_York, now).unwrap(), utc(2024, 3, 12, 4, 0));
    }

    #[test]
    fn test_rolling_week_starts_six_local_days_back_everywhere() {
        let zones = [
            Tz::UTC,
            America::New_York,
            America::Sao_Paulo,
            Europe::Paris,
            Asia::Kolkata,
            Australia::Sydney,
            Australia::Lord_Howe,
        ];

        for tz in zones {
            let mut now = utc(2024, 1, 1, 12, 0);
            while now < utc(2025, 1, 1, 0, 0) {
                let today = local_today(tz, now);
                let window = resolve_window(tz, now, &WindowSelector::Older).unwrap();
                let local_start = window.start.with_timezone(&tz);

                assert_eq!(local_start.date_naive(), today - Days::new(6), "{} at {}", tz, now);
                assert_eq!(local_start.time(), NaiveTime::MIN, "{} at {}", tz, now);
                assert!(window.contains(now));
                assert!(window.start <= start_of_day(tz, now).unwrap());

                now += TimeDelta::hours(13);
            }
        }
    }

    #[test]
    fn test_single_day_range_covers_whole_day() {
        let window = resolve_window(Tz::UTC, utc(2024, 6, 1, 0, 0), &range("2024-01-01", "2024-01-01")).unwrap();
        assert_eq!(window.start, utc(2024, 1, 1, 0, 0));
        assert_eq!(window.end, utc(2024, 1, 2, 0, 0));
        assert!(window.contains(utc(2024, 1, 1, 23, 59)));
        assert!(!window.contains(utc(2024, 1, 2, 0, 0)));
    }

    #[test]
    fn test_explicit_range_in_local_time() {
        let window = resolve_window(Europe::Paris, utc(2024, 6, 1, 0, 0), &range("2024-03-30", "2024-03-31")).unwrap();
        // CET until the 31st, CEST from 02:00 that morning
        assert_eq!(window.start, utc(2024, 3, 29, 23, 0));
        assert_eq!(window.end, utc(2024, 3, 31, 22, 0));
    }

    #[test]
    fn test_invalid_ranges_fail_validation() {
        let now = utc(2024, 6, 1, 0, 0);
        let cases = [
            range("2024-13-01", "2024-12-01"),
            range("yesterday", "2024-12-01"),
            range("2024-01-02", "2024-01-01"),
            range("", "2024-01-01"),
            WindowSelector::Range { start: Some("2024-01-01".to_string()), end: None },
            WindowSelector::Range { start: None, end: None },
        ];

        for selector in cases {
            assert!(
                matches!(resolve_window(Tz::UTC, now, &selector), Err(AppError::Validation(_))),
                "{:?}",
                selector
            );
        }

        // Parses, but local midnight falls before the earliest representable instant
        let earliest = range("-262143-01-01", "-262143-01-01");
        for tz in [Asia::Kolkata, Pacific::Pago_Pago] {
            assert!(
                matches!(resolve_window(tz, now, &earliest), Err(AppError::Validation(_))),
                "{}",
                tz
            );
        }
    }

    #[test]
    fn test_skipped_midnight_resolves_to_transition() {
        // Samoa skipped 2011-12-30 entirely, jumping from UTC-10 to UTC+14
        assert_eq!(local_midnight_utc(Pacific::Apia, date(2011, 12, 30)).unwrap(), utc(2011, 12, 30, 10, 0));
        assert_eq!(local_midnight_utc(Pacific::Apia, date(2011, 12, 31)).unwrap(), utc(2011, 12, 30, 10, 0));
    }
}
