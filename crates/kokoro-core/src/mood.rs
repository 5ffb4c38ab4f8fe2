//! Mood trend view models.
//!
//! The chart is a typed series: one point per calendar day of the month,
//! with missing days as gaps. Bucketing scores into the
//! severity palette is a presentation rule recomputed on every render,
//! never stored.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::entry::{Month, MoodScore};

/// One per-date score from the stats endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoodPoint {
    pub date: NaiveDate,
    pub mood_score: MoodScore,
}

/// The month aggregate the backend returns: per-date scores, a numeric
/// average rounded to one decimal, and the entry count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodStats {
    pub data: Vec<MoodPoint>,
    pub average: f64,
    pub count: u32,
}

/// Severity bucket for a mood score, mapped to the fixed palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoodBucket {
    /// Scores 1-3
    Low,
    /// Scores 4-5
    Mid,
    /// Scores 6-7
    Good,
    /// Scores 8-10
    Great,
}

impl MoodBucket {
    pub fn for_score(score: MoodScore) -> Self {
        match score.value() {
            ..=3 => Self::Low,
            4..=5 => Self::Mid,
            6..=7 => Self::Good,
            _ => Self::Great,
        }
    }

    /// The bucket's palette color.
    pub fn color(&self) -> &'static str {
        match self {
            Self::Low => "#C75050",
            Self::Mid => "#E8C84A",
            Self::Good => "#8EBF8E",
            Self::Great => "#6B9E6B",
        }
    }
}

/// A month of mood scores, one slot per calendar day.
///
/// Absent days are `None`: the series visually skips missing data rather
/// than implying a mood of zero.
#[derive(Debug, Clone, PartialEq)]
pub struct MoodSeries {
    month: Month,
    points: Vec<Option<MoodScore>>,
}

impl MoodSeries {
    /// Lays the per-date points out over the month's days.
    ///
    /// Points outside the month are ignored (a stale fetch must not bleed
    /// into another month's series).
    pub fn build(month: Month, data: &[MoodPoint]) -> Self {
        let mut points = vec![None; month.day_count() as usize];
        for point in data {
            if let Some(day) = month.days().position(|d| d == point.date) {
                points[day] = Some(point.mood_score);
            }
        }
        Self { month, points }
    }

    pub fn month(&self) -> Month {
        self.month
    }

    /// One slot per calendar day, `None` for days without an entry.
    pub fn points(&self) -> &[Option<MoodScore>] {
        &self.points
    }

    /// Number of days that have a score.
    pub fn present_count(&self) -> usize {
        self.points.iter().filter(|p| p.is_some()).count()
    }
}

/// The rendered state of the mood trend view for one month.
#[derive(Debug, Clone, PartialEq)]
pub enum MoodView {
    /// Zero entries: the chart is suppressed in favor of a placeholder and
    /// a numeric average is never shown.
    Empty,
    Chart {
        series: MoodSeries,
        average: f64,
        count: u32,
    },
}

impl MoodView {
    pub fn from_stats(month: Month, stats: &MoodStats) -> Self {
        if stats.count == 0 || stats.data.is_empty() {
            return Self::Empty;
        }
        Self::Chart {
            series: MoodSeries::build(month, &stats.data),
            average: stats.average,
            count: stats.count,
        }
    }

    /// The average line shown under the chart: "no entries yet" for an
    /// empty month, never a numeric 0.
    pub fn average_label(&self) -> String {
        match self {
            Self::Empty => "no entries yet".to_string(),
            Self::Chart { average, count, .. } => {
                format!("monthly average {:.1} ({} entries)", average, count)
            }
        }
    }
}
