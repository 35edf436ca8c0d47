//! Date-key arithmetic.
//!
//! Every entity in the planner is joined on a plain calendar date
//! (`YYYY-MM-DD`, no time, no timezone). Dates are carried as
//! [`NaiveDate`], so adding days never drifts across DST changes.

use chrono::{Datelike, Days, NaiveDate};

use crate::error::ValidationError;

/// Format used for date keys.
pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

/// Truncate an ISO datetime-like string to its date part.
///
/// No validation is performed: malformed input yields whatever the first
/// ten characters happen to be. Use [`parse_date_key`] when the value must
/// be a real date.
pub fn to_date_only(s: &str) -> &str {
    match s.char_indices().nth(10) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Parse a date key (or the date part of an ISO datetime) strictly.
pub fn parse_date_key(s: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(to_date_only(s.trim()), DATE_KEY_FORMAT).map_err(|_| {
        ValidationError::InvalidDate {
            value: s.to_string(),
        }
    })
}

/// Render a date as its canonical key.
pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_KEY_FORMAT).to_string()
}

/// The date `n` days after `date`; `n` may be negative.
///
/// Saturates at [`NaiveDate::MIN`] / [`NaiveDate::MAX`].
pub fn add_days(date: NaiveDate, n: i64) -> NaiveDate {
    let days = Days::new(n.unsigned_abs());
    if n >= 0 {
        date.checked_add_days(days).unwrap_or(NaiveDate::MAX)
    } else {
        date.checked_sub_days(days).unwrap_or(NaiveDate::MIN)
    }
}

/// Signed number of whole days from `a` to `b`.
pub fn days_between(a: NaiveDate, b: NaiveDate) -> i64 {
    (b - a).num_days()
}

/// Weekday index with 0 = Sunday ... 6 = Saturday.
pub fn weekday_index(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

/// `n` consecutive dates starting at `today`, cut short at [`NaiveDate::MAX`].
pub fn horizon(today: NaiveDate, n: u32) -> Vec<NaiveDate> {
    today.iter_days().take(n as usize).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        parse_date_key(s).unwrap()
    }

    #[test]
    fn to_date_only_truncates_datetimes() {
        assert_eq!(to_date_only("2026-03-14T09:30:00+09:00"), "2026-03-14");
        assert_eq!(to_date_only("2026-03-14"), "2026-03-14");
        assert_eq!(to_date_only("short"), "short");
        // garbage in, garbage out
        assert_eq!(to_date_only("not-a-date-at-all"), "not-a-date");
    }

    #[test]
    fn parse_rejects_malformed_keys() {
        assert!(parse_date_key("2026-02-30").is_err());
        assert!(parse_date_key("tomorrow").is_err());
        assert_eq!(d("2026-03-14T23:59:59Z"), d("2026-03-14"));
    }

    #[test]
    fn add_days_crosses_month_and_year() {
        assert_eq!(add_days(d("2026-12-30"), 3), d("2027-01-02"));
        assert_eq!(add_days(d("2026-03-01"), -1), d("2026-02-28"));
        // spring-forward weekend in Europe/US is irrelevant for plain dates
        assert_eq!(add_days(d("2026-03-28"), 2), d("2026-03-30"));
    }

    #[test]
    fn add_days_saturates_at_the_calendar_edges() {
        assert_eq!(add_days(NaiveDate::MAX, 1), NaiveDate::MAX);
        assert_eq!(add_days(NaiveDate::MIN, -1), NaiveDate::MIN);
        assert_eq!(add_days(d("2026-10-19"), i64::MAX), NaiveDate::MAX);
        assert_eq!(add_days(d("2026-10-19"), i64::MIN), NaiveDate::MIN);
    }

    #[test]
    fn horizon_stops_at_the_last_date() {
        let days = horizon(add_days(NaiveDate::MAX, -1), 5);
        assert_eq!(days, vec![add_days(NaiveDate::MAX, -1), NaiveDate::MAX]);
    }

    #[test]
    fn days_between_is_signed() {
        assert_eq!(days_between(d("2026-01-01"), d("2026-01-11")), 10);
        assert_eq!(days_between(d("2026-01-11"), d("2026-01-01")), -10);
        assert_eq!(days_between(d("2026-01-01"), d("2026-01-01")), 0);
    }

    #[test]
    fn weekday_index_starts_on_sunday() {
        // 2026-10-18 is a Sunday
        assert_eq!(weekday_index(d("2026-10-18")), 0);
        assert_eq!(weekday_index(d("2026-10-24")), 6);
    }

    #[test]
    fn horizon_is_contiguous() {
        let days = horizon(d("2026-10-19"), 3);
        assert_eq!(days, vec![d("2026-10-19"), d("2026-10-20"), d("2026-10-21")]);
        assert!(horizon(d("2026-10-19"), 0).is_empty());
        assert_eq!(date_key(days[2]), "2026-10-21");
    }
}
