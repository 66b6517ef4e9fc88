//! Calendar helpers for the alert rules.
//!
//! All functions are pure. `now` is a UTC timestamp without zone; dates are
//! compared against it at midnight.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use finwatch_types::DATE_FORMAT;

use crate::error::{RuleError, RuleResult};

/// Checked calendar date construction
pub fn ymd(year: i32, month: u32, day: u32) -> RuleResult<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or(RuleError::InvalidDate { year, month, day })
}

/// First day of `today`'s month
pub fn start_of_month(today: NaiveDate) -> RuleResult<NaiveDate> {
    ymd(today.year(), today.month(), 1)
}

/// First and last day of the month before `today`'s month
pub fn previous_month_bounds(today: NaiveDate) -> RuleResult<(NaiveDate, NaiveDate)> {
    let first = start_of_month(today)?;
    let end = first.pred_opt().ok_or(RuleError::NoPreviousDay(first))?;
    Ok((start_of_month(end)?, end))
}

/// First day of the month after `today`'s month
pub fn next_month_first(today: NaiveDate) -> RuleResult<NaiveDate> {
    if today.month() == 12 {
        ymd(today.year() + 1, 1, 1)
    } else {
        ymd(today.year(), today.month() + 1, 1)
    }
}

pub fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// Whole days from `now` to midnight of `target`, truncated toward zero
pub fn whole_days_until(target: NaiveDate, now: NaiveDateTime) -> i64 {
    (midnight(target) - now).num_days()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_start_of_month() {
        assert_eq!(start_of_month(date(2024, 5, 27)).unwrap(), date(2024, 5, 1));
        assert_eq!(start_of_month(date(2024, 5, 1)).unwrap(), date(2024, 5, 1));
    }

    #[test]
    fn test_previous_month_bounds_rolls_year() {
        assert_eq!(
            previous_month_bounds(date(2024, 1, 15)).unwrap(),
            (date(2023, 12, 1), date(2023, 12, 31))
        );
    }

    #[test]
    fn test_previous_month_bounds_leap_february() {
        assert_eq!(
            previous_month_bounds(date(2024, 3, 31)).unwrap(),
            (date(2024, 2, 1), date(2024, 2, 29))
        );
        assert_eq!(
            previous_month_bounds(date(2023, 3, 1)).unwrap(),
            (date(2023, 2, 1), date(2023, 2, 28))
        );
    }

    #[test]
    fn test_next_month_first() {
        assert_eq!(next_month_first(date(2024, 5, 27)).unwrap(), date(2024, 6, 1));
        assert_eq!(next_month_first(date(2024, 12, 31)).unwrap(), date(2025, 1, 1));
    }

    #[test]
    fn test_next_month_first_past_calendar_end() {
        assert!(matches!(
            next_month_first(NaiveDate::MAX),
            Err(RuleError::InvalidDate { month: 1, day: 1, .. })
        ));
    }

    #[test]
    fn test_whole_days_truncate() {
        let target = date(2024, 6, 1);
        assert_eq!(whole_days_until(target, midnight(date(2024, 5, 27))), 5);

        let late = date(2024, 5, 27).and_hms_opt(10, 30, 0).unwrap();
        assert_eq!(whole_days_until(target, late), 4);

        let same_day = date(2024, 6, 1).and_hms_opt(8, 0, 0).unwrap();
        assert_eq!(whole_days_until(target, same_day), 0);
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(date(2024, 6, 1)), "2024-06-01");
    }
}
