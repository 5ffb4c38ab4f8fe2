//! Entry store trait.
//!
//! Defines the interface for journal persistence operations against the
//! remote store.

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use super::image::ImageUpload;
use super::model::{EntryDraft, JournalEntry};
use super::month::Month;
use crate::error::Result;
use crate::mood::MoodStats;

/// An abstract store for journal entries.
///
/// This trait defines the contract the remote journal API fulfils,
/// decoupling the application's controllers from the transport (and letting
/// tests substitute an in-memory store).
///
/// # Implementation Notes
///
/// The backend only exposes month-granularity listing, so single-date lookup
/// is a provided method built on `list_month`. Create and update carry
/// full-replace semantics; the caller decides which applies.
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// Lists all entries for one calendar month.
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<JournalEntry>)`: The month's entries (possibly empty)
    /// - `Err(_)`: Error occurred during retrieval
    async fn list_month(&self, month: Month) -> Result<Vec<JournalEntry>>;

    /// Creates a new entry from the draft.
    ///
    /// The backend enforces one entry per user per date and answers a
    /// conflict when a duplicate date is submitted.
    async fn create(&self, draft: &EntryDraft) -> Result<JournalEntry>;

    /// Fully replaces an existing entry.
    async fn update(&self, id: Uuid, draft: &EntryDraft) -> Result<JournalEntry>;

    /// Deletes an entry. Destructive and irreversible; surfaces must obtain
    /// user confirmation before invoking this.
    async fn delete(&self, id: Uuid) -> Result<()>;

    /// Uploads a validated image, yielding the URL to attach to the next
    /// save.
    async fn upload_image(&self, upload: &ImageUpload) -> Result<String>;

    /// Fetches per-date mood scores, the average and the entry count for
    /// one month.
    async fn mood_stats(&self, month: Month) -> Result<MoodStats>;

    /// Fetches the entry for one exact date, if any.
    ///
    /// Lists the date's month and selects the exact match; repeated calls
    /// are idempotent.
    async fn fetch_by_date(&self, date: NaiveDate) -> Result<Option<JournalEntry>> {
        let entries = self.list_month(Month::containing(date)).await?;
        Ok(entries.into_iter().find(|entry| entry.date == date))
    }
}
