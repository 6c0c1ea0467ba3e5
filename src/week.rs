//! ISO-8601 calendar week arithmetic ("Kalenderwoche").
//!
//! Week 1 is the week containing the year's first Thursday and weeks run
//! Monday through Sunday. The free functions are permissive: they never fail
//! and compute a well-defined date even for weeks outside the year's range.
//! Callers that need rejection go through [`is_valid_week`] or
//! [`CalendarWeek::new`] first.

use std::fmt;

use chrono::{Datelike, Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Weekday count of a planning week (Monday..Friday).
pub const PLANNING_DAYS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WeekError {
    #[error("KW {week} does not exist in {year} (valid: 1..={max})")]
    InvalidWeek { year: i32, week: u32, max: u32 },
}

/// An ISO-8601 week identifier. The year is the ISO year, which can differ
/// from the Gregorian year of the first and last days of January/December.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CalendarWeek {
    pub year: i32,
    pub week: u32,
}

impl CalendarWeek {
    /// Validated constructor.
    pub fn new(year: i32, week: u32) -> Result<Self, WeekError> {
        if is_valid_week(year, week) {
            Ok(Self { year, week })
        } else {
            Err(WeekError::InvalidWeek {
                year,
                week,
                max: weeks_in_year(year),
            })
        }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        week_from_date(date)
    }

    pub fn current() -> Self {
        current_week()
    }

    pub fn monday(self) -> NaiveDate {
        date_from_week(self.year, self.week)
    }

    pub fn days(self) -> [NaiveDate; PLANNING_DAYS] {
        week_days(self.year, self.week)
    }

    pub fn next(self) -> Self {
        next_week(self.year, self.week)
    }

    pub fn prev(self) -> Self {
        prev_week(self.year, self.week)
    }

    pub fn is_valid(self) -> bool {
        is_valid_week(self.year, self.week)
    }
}

impl fmt::Display for CalendarWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KW {} {}", self.week, self.year)
    }
}

/// Move `date` by `days`, saturating at the ends of chrono's date range.
fn shift(date: NaiveDate, days: i64) -> NaiveDate {
    date.checked_add_signed(Duration::days(days))
        .unwrap_or(if days < 0 { NaiveDate::MIN } else { NaiveDate::MAX })
}

fn monday_of(date: NaiveDate) -> NaiveDate {
    shift(date, -i64::from(date.weekday().num_days_from_monday()))
}

/// January 4th always lies in ISO week 1 of its year.
fn jan_fourth(year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, 1, 4)
        .unwrap_or(if year < 0 { NaiveDate::MIN } else { NaiveDate::MAX })
}

/// The ISO week of the current local date.
pub fn current_week() -> CalendarWeek {
    week_from_date(Local::now().date_naive())
}

/// The ISO week containing `date`.
pub fn week_from_date(date: NaiveDate) -> CalendarWeek {
    let offset = i64::from(date.weekday().num_days_from_monday());
    // The Thursday of the date's own Monday-based week decides the ISO year.
    let thursday = shift(date, 3 - offset);
    let iso_year = thursday.year();
    let week_one = monday_of(jan_fourth(iso_year));
    let week = thursday.signed_duration_since(week_one).num_days() / 7 + 1;

    CalendarWeek {
        year: iso_year,
        week: week as u32,
    }
}

/// Monday of ISO week `week` in `year`.
///
/// Out-of-range weeks are not rejected: week 0 lands in the previous year,
/// week 54 in the next one.
pub fn date_from_week(year: i32, week: u32) -> NaiveDate {
    let week_one = monday_of(jan_fourth(year));
    shift(week_one, (i64::from(week) - 1) * 7)
}

/// Monday through Friday of the given week, in order.
pub fn week_days(year: i32, week: u32) -> [NaiveDate; PLANNING_DAYS] {
    let monday = date_from_week(year, week);
    std::array::from_fn(|i| shift(monday, i as i64))
}

pub fn next_week(year: i32, week: u32) -> CalendarWeek {
    if week < weeks_in_year(year) {
        CalendarWeek {
            year,
            week: week + 1,
        }
    } else {
        CalendarWeek {
            year: year + 1,
            week: 1,
        }
    }
}

pub fn prev_week(year: i32, week: u32) -> CalendarWeek {
    if week > 1 {
        CalendarWeek {
            year,
            week: week - 1,
        }
    } else {
        let prev_year = year - 1;
        CalendarWeek {
            year: prev_year,
            week: weeks_in_year(prev_year),
        }
    }
}

/// Number of ISO weeks in `year` (52 or 53).
///
/// December 28th always falls in the last ISO week of its year, so its week
/// number is the week count.
pub fn weeks_in_year(year: i32) -> u32 {
    NaiveDate::from_ymd_opt(year, 12, 28)
        .map(|dec28| week_from_date(dec28).week)
        .unwrap_or(52)
}

pub fn is_valid_week(year: i32, week: u32) -> bool {
    week >= 1 && week <= weeks_in_year(year)
}

/// Display label, e.g. "KW 8 2026".
pub fn format_week(year: i32, week: u32) -> String {
    CalendarWeek { year, week }.to_string()
}

/// Short day label, e.g. "20.02.".
pub fn format_date_short(date: NaiveDate) -> String {
    date.format("%d.%m.").to_string()
}
