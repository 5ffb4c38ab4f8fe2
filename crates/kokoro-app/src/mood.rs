//! Mood trend controller.
//!
//! Navigates months independently of the calendar, turns the month's stats
//! into a gap-preserving series, and suppresses the chart for empty months.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use kokoro_core::entry::{EntryStore, Month};
use kokoro_core::mood::MoodView;

use crate::notice::NoticeBoard;
use crate::refresh::Refresh;

struct MoodState {
    month: Month,
    view: MoodView,
}

/// Controller for the monthly mood chart.
pub struct MoodTrendController {
    store: Arc<dyn EntryStore>,
    notices: Arc<NoticeBoard>,
    state: RwLock<MoodState>,
}

impl MoodTrendController {
    /// Builds the controller showing `month`, with an empty view until
    /// [`load`](Self::load) runs.
    pub fn new(store: Arc<dyn EntryStore>, notices: Arc<NoticeBoard>, month: Month) -> Self {
        Self {
            store,
            notices,
            state: RwLock::new(MoodState {
                month,
                view: MoodView::Empty,
            }),
        }
    }

    pub async fn month(&self) -> Month {
        self.state.read().await.month
    }

    /// The rendered view for the displayed month.
    pub async fn view(&self) -> MoodView {
        self.state.read().await.view.clone()
    }

    pub async fn prev_month(&self) {
        self.navigate(|m| m.prev()).await;
    }

    pub async fn next_month(&self) {
        self.navigate(|m| m.next()).await;
    }

    async fn navigate(&self, step: impl FnOnce(Month) -> Month) {
        {
            let mut state = self.state.write().await;
            state.month = step(state.month);
        }
        self.load().await;
    }

    /// Fetches the displayed month's stats and rebuilds the view.
    ///
    /// The bucketing of scores into the palette happens at render time from
    /// the series; nothing classified is stored here. A stats response that
    /// arrives after further navigation is discarded, and a fetch failure
    /// keeps the prior view.
    pub async fn load(&self) {
        let month = { self.state.read().await.month };

        match self.store.mood_stats(month).await {
            Ok(stats) => {
                let mut state = self.state.write().await;
                if state.month != month {
                    tracing::debug!("[MoodTrend] discarding stale stats for {}", month);
                    return;
                }
                state.view = MoodView::from_stats(month, &stats);
            }
            Err(e) => {
                tracing::debug!("[MoodTrend] stats fetch failed: {}", e);
                self.notices.error("failed to load mood data");
            }
        }
    }
}

#[async_trait]
impl Refresh for MoodTrendController {
    /// Re-fetches the displayed month without touching the navigation
    /// position.
    async fn refresh(&self) {
        self.load().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryEntryStore, date, entry_on};
    use std::sync::atomic::Ordering;

    fn june() -> Month {
        Month::new(2025, 6).unwrap()
    }

    async fn controller(store: MemoryEntryStore) -> (Arc<MemoryEntryStore>, MoodTrendController) {
        let store = Arc::new(store);
        let notices = Arc::new(NoticeBoard::new());
        let controller = MoodTrendController::new(store.clone(), notices, june());
        (store, controller)
    }

    #[tokio::test]
    async fn test_series_has_gaps_not_zeros() {
        let store = MemoryEntryStore::with_entries([
            entry_on(date(2025, 6, 1), 7),
            entry_on(date(2025, 6, 5), 3),
        ]);
        let (_, mood) = controller(store).await;

        mood.load().await;

        match mood.view().await {
            MoodView::Chart { series, count, .. } => {
                assert_eq!(count, 2);
                assert_eq!(series.present_count(), 2);
                assert_eq!(series.points().len(), 30);
            }
            MoodView::Empty => panic!("expected a chart"),
        }
    }

    #[tokio::test]
    async fn test_empty_month_shows_placeholder_not_zero_average() {
        let (_, mood) = controller(MemoryEntryStore::new()).await;

        mood.load().await;

        let view = mood.view().await;
        assert_eq!(view, MoodView::Empty);
        assert_eq!(view.average_label(), "no entries yet");
    }

    #[tokio::test]
    async fn test_navigation_is_independent_and_survives_refresh() {
        let (_, mood) = controller(MemoryEntryStore::new()).await;

        mood.prev_month().await;
        assert_eq!(mood.month().await, Month::new(2025, 5).unwrap());

        mood.refresh().await;
        assert_eq!(mood.month().await, Month::new(2025, 5).unwrap());

        // December wraps into January of the next year.
        let (_, mood) = controller(MemoryEntryStore::new()).await;
        for _ in 0..7 {
            mood.next_month().await;
        }
        assert_eq!(mood.month().await, Month::new(2026, 1).unwrap());
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_prior_view() {
        let store = MemoryEntryStore::with_entries([entry_on(date(2025, 6, 1), 7)]);
        let (store, mood) = controller(store).await;
        mood.load().await;

        store.fail_listing.store(true, Ordering::SeqCst);
        mood.refresh().await;

        assert!(matches!(mood.view().await, MoodView::Chart { .. }));
    }

    #[tokio::test]
    async fn test_stale_stats_response_is_discarded() {
        let store = MemoryEntryStore::with_entries([
            entry_on(date(2025, 6, 1), 7),
            entry_on(date(2025, 7, 2), 9),
        ]);
        let (store, mood) = controller(store).await;
        let mood = Arc::new(mood);

        // Hold the June fetch in flight and navigate away before it lands.
        let hold = store.hold_listing(june());
        let stale = tokio::spawn({
            let mood = mood.clone();
            async move { mood.load().await }
        });
        hold.until_entered().await;

        mood.next_month().await;
        hold.release();
        stale.await.unwrap();

        // The chart still shows July; the late June stats never land.
        assert_eq!(mood.month().await, Month::new(2025, 7).unwrap());
        match mood.view().await {
            MoodView::Chart { count, average, .. } => {
                assert_eq!(count, 1);
                assert_eq!(average, 9.0);
            }
            MoodView::Empty => panic!("expected July's chart"),
        }
    }

    #[tokio::test]
    async fn test_refresh_after_new_entry_updates_chart() {
        let (store, mood) = controller(MemoryEntryStore::new()).await;
        mood.load().await;
        assert_eq!(mood.view().await, MoodView::Empty);

        store.insert(entry_on(date(2025, 6, 12), 9));
        mood.refresh().await;

        match mood.view().await {
            MoodView::Chart { count, average, .. } => {
                assert_eq!(count, 1);
                assert_eq!(average, 9.0);
            }
            MoodView::Empty => panic!("expected a chart after refresh"),
        }
    }
}
