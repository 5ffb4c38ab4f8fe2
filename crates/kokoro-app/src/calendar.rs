//! Calendar controller.
//!
//! Owns the displayed month and selection, builds the grid in two phases
//! (structure immediately, annotations once data lands) and computes the
//! posting streak over a three-month window. Month navigation wraps year
//! boundaries and survives refreshes.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use tokio::sync::RwLock;

use kokoro_core::calendar::{MonthGrid, streak, streak_window};
use kokoro_core::entry::{EntryStore, Month};
use kokoro_core::error::Result;

use crate::notice::NoticeBoard;
use crate::refresh::Refresh;

struct CalendarState {
    month: Month,
    selected: Option<NaiveDate>,
    grid: MonthGrid,
    streak: Option<u32>,
}

/// Controller for the month-grid view.
pub struct CalendarController {
    store: Arc<dyn EntryStore>,
    notices: Arc<NoticeBoard>,
    state: RwLock<CalendarState>,
}

impl CalendarController {
    /// Builds the controller showing the month containing `today`, with
    /// today preselected. Only the structural grid exists until
    /// [`load`](Self::load) runs.
    pub fn new(store: Arc<dyn EntryStore>, notices: Arc<NoticeBoard>, today: NaiveDate) -> Self {
        let month = Month::containing(today);
        Self {
            store,
            notices,
            state: RwLock::new(CalendarState {
                month,
                selected: Some(today),
                grid: MonthGrid::build(month, today, Some(today)),
                streak: None,
            }),
        }
    }

    pub async fn month(&self) -> Month {
        self.state.read().await.month
    }

    /// A snapshot of the current grid (structure plus whatever annotations
    /// have landed).
    pub async fn grid(&self) -> MonthGrid {
        self.state.read().await.grid.clone()
    }

    /// The current streak, once computed.
    pub async fn streak(&self) -> Option<u32> {
        self.state.read().await.streak
    }

    /// Navigates to the previous month and reloads its data.
    pub async fn prev_month(&self) {
        self.navigate(|m| m.prev(), Local::now().date_naive()).await;
    }

    /// Navigates to the next month and reloads its data.
    pub async fn next_month(&self) {
        self.navigate(|m| m.next(), Local::now().date_naive()).await;
    }

    async fn navigate(&self, step: impl FnOnce(Month) -> Month, today: NaiveDate) {
        {
            let mut state = self.state.write().await;
            state.month = step(state.month);
            // Phase one rebuild: the empty grid renders before any fetch.
            let selected = state.selected.filter(|d| state.month.contains(*d));
            state.grid = MonthGrid::build(state.month, today, selected);
        }
        self.load_at(today).await;
    }

    /// Moves the selection; returns false when the date is outside the
    /// displayed month. Loading the entry for the date is the surface's
    /// next step through the editor.
    pub async fn select(&self, date: NaiveDate) -> bool {
        let mut state = self.state.write().await;
        if state.grid.select(date) {
            state.selected = Some(date);
            true
        } else {
            false
        }
    }

    /// Fetches the displayed month and annotates the grid, then recomputes
    /// the streak.
    ///
    /// A response that arrives after further navigation is discarded: the
    /// annotation is applied only if the displayed month still matches the
    /// one fetched.
    ///
    /// Today is re-sampled on every load, so a session left open across
    /// midnight counts its streak from the current day.
    pub async fn load(&self) {
        self.load_at(Local::now().date_naive()).await;
    }

    async fn load_at(&self, today: NaiveDate) {
        let month = { self.state.read().await.month };

        match self.store.list_month(month).await {
            Ok(entries) => {
                let mut state = self.state.write().await;
                if state.month != month {
                    tracing::debug!("[Calendar] discarding stale response for {}", month);
                    return;
                }
                state.grid.annotate(&entries);
            }
            Err(e) => {
                tracing::debug!("[Calendar] month fetch failed: {}", e);
                self.notices.error("failed to load the calendar");
                return;
            }
        }

        let streak = match self.compute_streak(today).await {
            Ok(n) => Some(n),
            Err(e) => {
                tracing::debug!("[Calendar] streak fetch failed: {}", e);
                None
            }
        };
        self.state.write().await.streak = streak;
    }

    /// Merges the current and prior two months into one date set, then
    /// walks backward from today. Three fetches, never fewer: a streak may
    /// span a month boundary.
    async fn compute_streak(&self, today: NaiveDate) -> Result<u32> {
        let mut dates: HashSet<NaiveDate> = HashSet::new();
        for month in streak_window(today) {
            let entries = self.store.list_month(month).await?;
            dates.extend(entries.into_iter().map(|e| e.date));
        }
        Ok(streak(&dates, today))
    }
}

#[async_trait]
impl Refresh for CalendarController {
    /// Re-fetches the displayed month without touching the navigation
    /// position.
    async fn refresh(&self) {
        self.load().await;
    }
}
