//! Date arithmetic used to lay out a ride over its active dates.

use std::fmt;

use chrono::{Days, NaiveDate, Weekday};

use crate::{EngineError, ResultEngine};

/// Calendar operations the engine relies on.
///
/// The engine never reads the wall clock: every date it works with comes
/// from the caller, and every step between dates goes through this trait.
pub trait Calendar: fmt::Debug + Send + Sync {
    fn weekday_of(&self, date: NaiveDate) -> Weekday;

    /// Returns `None` when the result falls outside the representable range.
    fn add_days(&self, date: NaiveDate, days: u64) -> Option<NaiveDate>;

    fn is_after(&self, a: NaiveDate, b: NaiveDate) -> bool;

    fn is_weekend(&self, date: NaiveDate) -> bool {
        matches!(self.weekday_of(date), Weekday::Sat | Weekday::Sun)
    }
}

/// Proleptic Gregorian calendar backed by `chrono`.
#[derive(Clone, Copy, Debug, Default)]
pub struct ChronoCalendar;

impl Calendar for ChronoCalendar {
    fn weekday_of(&self, date: NaiveDate) -> Weekday {
        chrono::Datelike::weekday(&date)
    }

    fn add_days(&self, date: NaiveDate, days: u64) -> Option<NaiveDate> {
        date.checked_add_days(Days::new(days))
    }

    fn is_after(&self, a: NaiveDate, b: NaiveDate) -> bool {
        a > b
    }
}

/// Every date in `[start, end]` counted toward cost distribution.
///
/// A date is active when `include_weekends` is set or the date is neither a
/// Saturday nor a Sunday. The sequence is ascending and depends only on the
/// three inputs.
pub fn active_dates(
    calendar: &dyn Calendar,
    start: NaiveDate,
    end: NaiveDate,
    include_weekends: bool,
) -> ResultEngine<Vec<NaiveDate>> {
    if calendar.is_after(start, end) {
        return Err(EngineError::Validation(format!(
            "end date {end} is before start date {start}"
        )));
    }

    let mut dates = Vec::new();
    let mut current = start;
    loop {
        if include_weekends || !calendar.is_weekend(current) {
            dates.push(current);
        }
        if !calendar.is_after(end, current) {
            break;
        }
        current = calendar
            .add_days(current, 1)
            .ok_or_else(|| EngineError::Validation("date range overflows".to_string()))?;
    }
    Ok(dates)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn workweek_skips_weekend() {
        // 2024-01-01 is a Monday.
        let dates = active_dates(&ChronoCalendar, date(2024, 1, 1), date(2024, 1, 14), false)
            .unwrap();
        assert_eq!(dates.len(), 10);
        assert!(dates.iter().all(|d| !ChronoCalendar.is_weekend(*d)));
        assert_eq!(dates.first(), Some(&date(2024, 1, 1)));
        assert_eq!(dates.last(), Some(&date(2024, 1, 12)));
    }

    #[test]
    fn weekends_included_on_request() {
        let dates = active_dates(&ChronoCalendar, date(2024, 1, 6), date(2024, 1, 7), true)
            .unwrap();
        assert_eq!(dates, vec![date(2024, 1, 6), date(2024, 1, 7)]);
    }

    #[test]
    fn weekend_only_range_is_empty() {
        let dates = active_dates(&ChronoCalendar, date(2024, 1, 6), date(2024, 1, 7), false)
            .unwrap();
        assert!(dates.is_empty());
    }

    #[test]
    fn single_day_range() {
        let dates = active_dates(&ChronoCalendar, date(2024, 1, 1), date(2024, 1, 1), false)
            .unwrap();
        assert_eq!(dates, vec![date(2024, 1, 1)]);
    }

    #[test]
    fn regeneration_is_deterministic() {
        let first = active_dates(&ChronoCalendar, date(2024, 2, 20), date(2024, 3, 10), false);
        let second = active_dates(&ChronoCalendar, date(2024, 2, 20), date(2024, 3, 10), false);
        assert_eq!(first.unwrap(), second.unwrap());
    }

    #[test]
    fn inverted_range_is_rejected() {
        let err = active_dates(&ChronoCalendar, date(2024, 1, 2), date(2024, 1, 1), true)
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }
}
