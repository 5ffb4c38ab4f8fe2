//! Calendar grid and streak computation.
//!
//! The grid is built in two phases so navigation feels immediate: the
//! structural pass needs only the navigation state, while entry markers are
//! applied once the month's data arrives.

use std::collections::HashSet;

use chrono::{Datelike, NaiveDate};

use crate::entry::{JournalEntry, Month, MoodScore};

/// One day cell of the month grid.
#[derive(Debug, Clone, PartialEq)]
pub struct DayCell {
    pub date: NaiveDate,
    /// Day of month, 1-based
    pub day: u32,
    pub is_today: bool,
    pub selected: bool,
    /// Set by the annotation pass once month data loads
    pub has_entry: bool,
    /// The entry's mood score, once annotated
    pub mood_score: Option<MoodScore>,
}

/// A Sunday-first month grid with a single mutually exclusive selection.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthGrid {
    month: Month,
    leading_blanks: u32,
    cells: Vec<DayCell>,
}

impl MonthGrid {
    /// Phase one: builds the structural grid from navigation state alone.
    ///
    /// All cells start unannotated; `today` and the selection are purely
    /// calendar facts and need no data fetch.
    pub fn build(month: Month, today: NaiveDate, selected: Option<NaiveDate>) -> Self {
        let cells = month
            .days()
            .map(|date| DayCell {
                date,
                day: date.day(),
                is_today: date == today,
                selected: selected == Some(date),
                has_entry: false,
                mood_score: None,
            })
            .collect();
        Self {
            month,
            leading_blanks: month.leading_blanks(),
            cells,
        }
    }

    pub fn month(&self) -> Month {
        self.month
    }

    /// Number of blank cells before day 1 in a Sunday-first layout.
    pub fn leading_blanks(&self) -> u32 {
        self.leading_blanks
    }

    pub fn cells(&self) -> &[DayCell] {
        &self.cells
    }

    /// Phase two: marks days that have an entry and records their mood
    /// score.
    ///
    /// Previous marks are cleared first, so re-annotating after a refresh
    /// never leaves a stale marker on a day whose entry was deleted.
    /// Entries outside the displayed month are ignored.
    pub fn annotate(&mut self, entries: &[JournalEntry]) {
        for cell in &mut self.cells {
            cell.has_entry = false;
            cell.mood_score = None;
        }
        for entry in entries {
            if !self.month.contains(entry.date) {
                continue;
            }
            // Day numbers are 1-based; cells are laid out in day order.
            let cell = &mut self.cells[(entry.date.day() - 1) as usize];
            cell.has_entry = true;
            cell.mood_score = Some(entry.mood_score);
        }
    }

    /// Moves the single selection to `date`.
    ///
    /// Returns false (leaving the selection untouched) when the date falls
    /// outside the displayed month.
    pub fn select(&mut self, date: NaiveDate) -> bool {
        if !self.month.contains(date) {
            return false;
        }
        for cell in &mut self.cells {
            cell.selected = cell.date == date;
        }
        true
    }

    /// The currently selected date, if any.
    pub fn selected(&self) -> Option<NaiveDate> {
        self.cells.iter().find(|c| c.selected).map(|c| c.date)
    }
}

/// The three months whose entries a streak count may span: the month
/// containing `today` plus the prior two.
///
/// A streak can cross a month boundary, so fewer fetches would undercount;
/// the backend only lists by month, hence exactly three.
pub fn streak_window(today: NaiveDate) -> [Month; 3] {
    let current = Month::containing(today);
    [current, current.prev(), current.prev().prev()]
}

/// Counts consecutive calendar days with an entry, walking backward from
/// (and including) `today`.
///
/// No entry for today yields 0, regardless of earlier days.
pub fn streak(dates: &HashSet<NaiveDate>, today: NaiveDate) -> u32 {
    let mut day = today;
    let mut count = 0;
    while dates.contains(&day) {
        count += 1;
        match day.pred_opt() {
            Some(prev) => day = prev,
            None => break,
        }
    }
    count
}
