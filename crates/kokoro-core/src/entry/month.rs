//! Calendar month value type.
//!
//! The journal backend lists entries and mood stats at month granularity
//! (`?month=YYYY-MM`), and both the calendar and the mood chart navigate by
//! month, so the month is a first-class value in this domain.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};

use crate::error::{KokoroError, Result};

/// A calendar month (year + 1-based month number).
///
/// Navigation wraps year boundaries: January's previous month is December of
/// the prior year, December's next month is January of the following year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Month {
    year: i32,
    month: u32,
}

impl Month {
    /// Creates a month, validating the month number and chrono's date range.
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(KokoroError::validation(format!(
                "month must be 1-12, got {}",
                month
            )));
        }
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(KokoroError::validation(format!(
                "year {} is out of range",
                year
            )));
        }
        Ok(Self { year, month })
    }

    /// The month containing the given calendar day.
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// The previous month, wrapping into December of the prior year.
    pub fn prev(self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// The next month, wrapping into January of the following year.
    pub fn next(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// The first calendar day of this month.
    pub fn first_day(&self) -> NaiveDate {
        // Invariant: constructors only admit month numbers and years that
        // chrono accepts, so this cannot fail.
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .expect("Month invariant: valid year/month")
    }

    /// Number of days in this month.
    pub fn day_count(&self) -> u32 {
        let next_first = self.next().first_day();
        (next_first - self.first_day()).num_days() as u32
    }

    /// Iterates every calendar day of this month in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        self.first_day().iter_days().take(self.day_count() as usize)
    }

    /// Whether the given day falls inside this month.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    /// Weekday offset of day 1 (Sunday = 0), i.e. the number of blank
    /// leading cells in a Sunday-first month grid.
    pub fn leading_blanks(&self) -> u32 {
        self.first_day().weekday().num_days_from_sunday()
    }
}

impl fmt::Display for Month {
    /// Formats as the backend's `YYYY-MM` query value.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Month {
    type Err = KokoroError;

    fn from_str(s: &str) -> Result<Self> {
        let (year, month) = s
            .split_once('-')
            .ok_or_else(|| KokoroError::validation(format!("invalid month '{}'", s)))?;
        let year: i32 = year
            .parse()
            .map_err(|_| KokoroError::validation(format!("invalid month '{}'", s)))?;
        let month: u32 = month
            .parse()
            .map_err(|_| KokoroError::validation(format!("invalid month '{}'", s)))?;
        Self::new(year, month)
    }
}
