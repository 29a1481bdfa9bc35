//! Reporting windows.
//!
//! Every report is pulled one calendar month at a time. [`monthly_periods`]
//! splits an inclusive date range into month-sized [`Period`]s clipped to the
//! requested bounds, so a range starting mid-month still begins on its own
//! start date.

use std::fmt;

use chrono::{Datelike, Months, NaiveDate};
use thiserror::Error;

/// Date format accepted on input and sent to both vendor APIs.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Error)]
pub enum PeriodError {
    #[error("invalid date \"{input}\": expected YYYY-MM-DD ({source})")]
    InvalidDate {
        input: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// An inclusive `(start, end)` reporting window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Period {
    #[must_use]
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// First through last day of the calendar month containing `today`.
    #[must_use]
    pub fn current_month(today: NaiveDate) -> Self {
        let start = first_of_month(today);
        Self {
            start,
            end: last_of_month(start),
        }
    }

    /// `start` rendered as `YYYY-MM-DD`.
    #[must_use]
    pub fn start_param(&self) -> String {
        self.start.format(DATE_FORMAT).to_string()
    }

    /// `end` rendered as `YYYY-MM-DD`.
    #[must_use]
    pub fn end_param(&self) -> String {
        self.end.format(DATE_FORMAT).to_string()
    }

    /// Display label for the month the period starts in, e.g. `"July 2025"`.
    #[must_use]
    pub fn month_label(&self) -> String {
        month_label(self.start)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}..{}",
            self.start.format(DATE_FORMAT),
            self.end.format(DATE_FORMAT)
        )
    }
}

/// Parses a `YYYY-MM-DD` string.
///
/// # Errors
///
/// Returns [`PeriodError::InvalidDate`] if the input is not a valid calendar date.
pub fn parse_date(input: &str) -> Result<NaiveDate, PeriodError> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT).map_err(|source| {
        PeriodError::InvalidDate {
            input: input.to_string(),
            source,
        }
    })
}

/// Renders `date` as `"<Month name> <YYYY>"`.
#[must_use]
pub fn month_label(date: NaiveDate) -> String {
    date.format("%B %Y").to_string()
}

/// Splits the inclusive range `start..=end` into calendar-month periods.
///
/// The first period starts at `start`, the last ends at `end`, and consecutive
/// periods are adjacent days. Returns an empty vector when `start > end`.
#[must_use]
pub fn monthly_periods(start: NaiveDate, end: NaiveDate) -> Vec<Period> {
    let mut periods = Vec::new();
    let mut cursor = start;

    while cursor <= end {
        let month_end = last_of_month(cursor).min(end);
        periods.push(Period::new(cursor, month_end));

        match month_end.succ_opt() {
            Some(next) => cursor = next,
            None => break,
        }
    }

    periods
}

/// String-input variant of [`monthly_periods`].
///
/// # Errors
///
/// Returns [`PeriodError::InvalidDate`] if either bound fails to parse.
pub fn monthly_periods_from_str(start: &str, end: &str) -> Result<Vec<Period>, PeriodError> {
    let start = parse_date(start)?;
    let end = parse_date(end)?;
    Ok(monthly_periods(start, end))
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn last_of_month(date: NaiveDate) -> NaiveDate {
    let first = first_of_month(date);
    first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(NaiveDate::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        parse_date(s).expect("valid test date")
    }

    fn as_strings(periods: &[Period]) -> Vec<(String, String)> {
        periods
            .iter()
            .map(|p| (p.start_param(), p.end_param()))
            .collect()
    }

    #[test]
    fn same_month_range_yields_single_clipped_period() {
        let periods = monthly_periods_from_str("2025-07-05", "2025-07-20").unwrap();
        assert_eq!(
            as_strings(&periods),
            vec![("2025-07-05".to_string(), "2025-07-20".to_string())]
        );
    }

    #[test]
    fn multi_month_range_is_clipped_at_both_ends() {
        let periods = monthly_periods_from_str("2025-06-15", "2025-08-10").unwrap();
        assert_eq!(
            as_strings(&periods),
            vec![
                ("2025-06-15".to_string(), "2025-06-30".to_string()),
                ("2025-07-01".to_string(), "2025-07-31".to_string()),
                ("2025-08-01".to_string(), "2025-08-10".to_string()),
            ]
        );
    }

    #[test]
    fn single_day_range() {
        let periods = monthly_periods(d("2024-02-29"), d("2024-02-29"));
        assert_eq!(periods, vec![Period::new(d("2024-02-29"), d("2024-02-29"))]);
    }

    #[test]
    fn range_crossing_year_and_leap_february() {
        let periods = monthly_periods(d("2023-12-31"), d("2024-03-01"));
        assert_eq!(
            periods,
            vec![
                Period::new(d("2023-12-31"), d("2023-12-31")),
                Period::new(d("2024-01-01"), d("2024-01-31")),
                Period::new(d("2024-02-01"), d("2024-02-29")),
                Period::new(d("2024-03-01"), d("2024-03-01")),
            ]
        );
    }

    #[test]
    fn inverted_range_is_empty() {
        assert!(monthly_periods(d("2025-08-10"), d("2025-06-15")).is_empty());
    }

    #[test]
    fn periods_tile_the_range_without_gaps() {
        let start = d("2022-11-17");
        let end = d("2025-03-04");
        let periods = monthly_periods(start, end);

        assert_eq!(periods.first().map(|p| p.start), Some(start));
        assert_eq!(periods.last().map(|p| p.end), Some(end));
        for p in &periods {
            assert!(p.start <= p.end, "period {p} is inverted");
            assert_eq!(p.start.year(), p.end.year());
            assert_eq!(p.start.month(), p.end.month());
        }
        for pair in periods.windows(2) {
            assert_eq!(pair[0].end.succ_opt(), Some(pair[1].start));
        }
        assert_eq!(periods.len(), 29);
    }

    #[test]
    fn invalid_date_is_a_format_error() {
        let err = monthly_periods_from_str("2025-13-01", "2025-12-31").unwrap_err();
        assert!(
            matches!(err, PeriodError::InvalidDate { ref input, .. } if input == "2025-13-01"),
            "unexpected error: {err:?}"
        );

        let err = monthly_periods_from_str("2025-01-01", "yesterday").unwrap_err();
        assert!(matches!(err, PeriodError::InvalidDate { ref input, .. } if input == "yesterday"));
    }

    #[test]
    fn current_month_covers_whole_month() {
        let period = Period::current_month(d("2025-02-14"));
        assert_eq!(period, Period::new(d("2025-02-01"), d("2025-02-28")));

        let period = Period::current_month(d("2024-12-31"));
        assert_eq!(period, Period::new(d("2024-12-01"), d("2024-12-31")));
    }

    #[test]
    fn month_label_uses_full_month_name() {
        assert_eq!(month_label(d("2025-07-20")), "July 2025");
        assert_eq!(Period::new(d("2025-06-15"), d("2025-06-30")).month_label(), "June 2025");
    }

    #[test]
    fn display_renders_range() {
        let period = Period::new(d("2025-06-15"), d("2025-06-30"));
        assert_eq!(period.to_string(), "2025-06-15..2025-06-30");
    }
}
