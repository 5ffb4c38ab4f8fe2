//! Journal editor controller.
//!
//! Owns the ephemeral view state for the entry form: the selected date, the
//! entry in focus, the editing flag and the pending image attachment. All
//! writes to that state go through this controller's own operations.
//! Successful mutations replace the current entry, flip editing off and fan
//! out refreshes through the hub; failed mutations preserve the
//! pre-mutation state and fan out nothing.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::NaiveDate;
use tokio::sync::RwLock;

use kokoro_core::entry::{EntryDraft, EntryStore, ImageUpload, JournalEntry, MoodScore};
use kokoro_core::error::{KokoroError, Result};

use crate::notice::NoticeBoard;
use crate::refresh::RefreshHub;

/// Which surface the entry page shows for the selected date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorPane {
    /// The create/edit form
    Compose,
    /// The read-only entry view
    View,
}

/// The editor's ephemeral view state. Reset on navigation; never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorState {
    pub selected_date: NaiveDate,
    /// The entry in focus for the selected date, if one exists
    pub current: Option<JournalEntry>,
    /// Whether the form is replacing the current entry rather than creating
    pub editing: bool,
    /// Uploaded image URL awaiting the next save
    pub pending_image_url: Option<String>,
}

impl EditorState {
    fn for_date(date: NaiveDate) -> Self {
        Self {
            selected_date: date,
            current: None,
            editing: false,
            pending_image_url: None,
        }
    }

    pub fn pane(&self) -> EditorPane {
        if self.current.is_some() && !self.editing {
            EditorPane::View
        } else {
            EditorPane::Compose
        }
    }
}

/// Controller for the entry form.
pub struct JournalEditor {
    store: Arc<dyn EntryStore>,
    hub: Arc<RefreshHub>,
    notices: Arc<NoticeBoard>,
    state: RwLock<EditorState>,
    /// Guards against overlapping submits (the disabled submit control).
    in_flight: AtomicBool,
}

impl JournalEditor {
    pub fn new(
        store: Arc<dyn EntryStore>,
        hub: Arc<RefreshHub>,
        notices: Arc<NoticeBoard>,
        today: NaiveDate,
    ) -> Self {
        Self {
            store,
            hub,
            notices,
            state: RwLock::new(EditorState::for_date(today)),
            in_flight: AtomicBool::new(false),
        }
    }

    /// A snapshot of the current view state.
    pub async fn state(&self) -> EditorState {
        self.state.read().await.clone()
    }

    /// Selects a date and loads its entry, resetting the ephemeral state.
    ///
    /// On a fetch failure the previous state is preserved and the error is
    /// surfaced as a transient notice.
    pub async fn load_date(&self, date: NaiveDate) -> Result<()> {
        match self.store.fetch_by_date(date).await {
            Ok(entry) => {
                let mut state = self.state.write().await;
                *state = EditorState::for_date(date);
                state.current = entry;
                Ok(())
            }
            Err(e) => {
                tracing::debug!("[JournalEditor] failed to load {}: {}", date, e);
                self.notices.error("failed to load the entry");
                Err(e)
            }
        }
    }

    /// Switches to edit mode for the current entry; returns false when
    /// there is nothing to edit.
    pub async fn start_editing(&self) -> bool {
        let mut state = self.state.write().await;
        match &state.current {
            Some(entry) => {
                state.pending_image_url = entry.image_url.clone();
                state.editing = true;
                true
            }
            None => false,
        }
    }

    /// Leaves edit mode without saving, dropping any pending attachment.
    pub async fn cancel_editing(&self) {
        let mut state = self.state.write().await;
        state.editing = false;
        state.pending_image_url = None;
    }

    /// Uploads a validated image; the resulting URL accompanies the next
    /// save.
    ///
    /// An upload failure only clears the attachment - text-only saving
    /// stays available.
    pub async fn attach_image(&self, upload: ImageUpload) -> Result<String> {
        match self.store.upload_image(&upload).await {
            Ok(url) => {
                self.state.write().await.pending_image_url = Some(url.clone());
                self.notices.success("image uploaded");
                Ok(url)
            }
            Err(e) => {
                self.state.write().await.pending_image_url = None;
                self.notices.error("image upload failed; saving without it");
                Err(e)
            }
        }
    }

    /// Drops the pending attachment.
    pub async fn remove_image(&self) {
        self.state.write().await.pending_image_url = None;
    }

    /// Saves the form: create when composing, full replace when editing.
    ///
    /// Strictly sequential within this one action: validate, then save,
    /// then fan out refreshes. Rejects overlapping submits.
    pub async fn submit(&self, content: &str, mood_score: MoodScore) -> Result<JournalEntry> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            return Err(KokoroError::validation("a save is already in progress"));
        }
        let result = self.submit_inner(content, mood_score).await;
        self.in_flight.store(false, Ordering::SeqCst);
        result
    }

    async fn submit_inner(&self, content: &str, mood_score: MoodScore) -> Result<JournalEntry> {
        let (draft, editing, current_id) = {
            let state = self.state.read().await;
            let draft = EntryDraft::new(
                state.selected_date,
                content,
                mood_score,
                state.pending_image_url.clone(),
            );
            (draft, state.editing, state.current.as_ref().map(|e| e.id))
        };

        // Validation failures never issue a request.
        if let Err(e) = draft.validate() {
            self.notices.error(e.to_string());
            return Err(e);
        }

        let result = match (editing, current_id) {
            (true, Some(id)) => self.store.update(id, &draft).await,
            _ => self.store.create(&draft).await,
        };

        match result {
            Ok(entry) => {
                {
                    let mut state = self.state.write().await;
                    state.current = Some(entry.clone());
                    state.editing = false;
                    state.pending_image_url = None;
                }
                self.notices.success(if editing {
                    "entry updated"
                } else {
                    "entry saved"
                });
                self.hub.notify_all().await;
                Ok(entry)
            }
            Err(e) => {
                tracing::debug!("[JournalEditor] save failed: {}", e);
                self.notices.error(e.to_string());
                Err(e)
            }
        }
    }

    /// Deletes the entry in focus. The surface must confirm with the user
    /// before calling this.
    ///
    /// On success the view reverts to the create form for the still-selected
    /// date, with no residual image attachment.
    pub async fn delete_current(&self) -> Result<()> {
        let id = {
            let state = self.state.read().await;
            state
                .current
                .as_ref()
                .map(|e| e.id)
                .ok_or_else(|| KokoroError::validation("no entry to delete"))?
        };

        match self.store.delete(id).await {
            Ok(()) => {
                {
                    let mut state = self.state.write().await;
                    let date = state.selected_date;
                    *state = EditorState::for_date(date);
                }
                self.notices.success("entry deleted");
                self.hub.notify_all().await;
                Ok(())
            }
            Err(e) => {
                tracing::debug!("[JournalEditor] delete failed: {}", e);
                self.notices.error(e.to_string());
                Err(e)
            }
        }
    }
}
