//! Shared test doubles: an in-memory entry store and a scriptable auth
//! provider.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::{Notify, broadcast};
use uuid::Uuid;

use kokoro_core::auth::{
    AuthChange, AuthEvent, AuthProvider, RedirectFragment, Session, SignUpOutcome, UserProfile,
};
use kokoro_core::entry::{EntryDraft, EntryStore, ImageUpload, JournalEntry, Month};
use kokoro_core::error::{KokoroError, Result};
use kokoro_core::mood::{MoodPoint, MoodStats};

pub(crate) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub(crate) fn entry_on(d: NaiveDate, score: u8) -> JournalEntry {
    let now = Utc::now();
    JournalEntry {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        date: d,
        content: format!("entry for {}", d),
        mood_score: score.try_into().unwrap(),
        image_url: None,
        created_at: now,
        updated_at: now,
    }
}

pub(crate) fn sample_session() -> Session {
    Session {
        access_token: "access-token".to_string(),
        refresh_token: Some("refresh-token".to_string()),
        token_type: "bearer".to_string(),
        expires_at: Some(Utc::now() + chrono::Duration::hours(1)),
        user: UserProfile {
            id: Uuid::new_v4(),
            email: Some("user@example.com".to_string()),
            created_at: Some(Utc::now()),
        },
    }
}

/// Holds the next `list_month` call for one month in flight until released,
/// so a test can navigate elsewhere while that fetch is still pending.
pub(crate) struct ListingHold {
    entered: Notify,
    release: Notify,
}

impl ListingHold {
    /// Resolves once the held fetch has started waiting.
    pub async fn until_entered(&self) {
        self.entered.notified().await;
    }

    pub fn release(&self) {
        self.release.notify_one();
    }
}

/// In-memory entry store keyed by date, with switchable failure modes.
#[derive(Default)]
pub(crate) struct MemoryEntryStore {
    entries: Mutex<HashMap<NaiveDate, JournalEntry>>,
    held_listing: Mutex<Option<(Month, Arc<ListingHold>)>>,
    pub fail_listing: AtomicBool,
    pub fail_mutations: AtomicBool,
    pub fail_uploads: AtomicBool,
}

impl MemoryEntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: impl IntoIterator<Item = JournalEntry>) -> Self {
        let store = Self::new();
        for entry in entries {
            store.insert(entry);
        }
        store
    }

    pub fn insert(&self, entry: JournalEntry) {
        self.entries.lock().unwrap().insert(entry.date, entry);
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.entries.lock().unwrap().contains_key(&date)
    }

    /// Arms a one-shot hold: the next `list_month` for `month` blocks until
    /// the returned handle is released. Fetches for other months pass.
    pub fn hold_listing(&self, month: Month) -> Arc<ListingHold> {
        let hold = Arc::new(ListingHold {
            entered: Notify::new(),
            release: Notify::new(),
        });
        *self.held_listing.lock().unwrap() = Some((month, hold.clone()));
        hold
    }

    fn check(&self, flag: &AtomicBool) -> Result<()> {
        if flag.load(Ordering::SeqCst) {
            Err(KokoroError::network("connection refused"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl EntryStore for MemoryEntryStore {
    async fn list_month(&self, month: Month) -> Result<Vec<JournalEntry>> {
        let hold = {
            let mut slot = self.held_listing.lock().unwrap();
            if slot.as_ref().is_some_and(|(held, _)| *held == month) {
                slot.take().map(|(_, hold)| hold)
            } else {
                None
            }
        };
        if let Some(hold) = hold {
            hold.entered.notify_one();
            hold.release.notified().await;
        }
        self.check(&self.fail_listing)?;
        let mut entries: Vec<JournalEntry> = self
            .entries
            .lock()
            .unwrap()
            .values()
            .filter(|e| month.contains(e.date))
            .cloned()
            .collect();
        entries.sort_by_key(|e| e.date);
        Ok(entries)
    }

    async fn create(&self, draft: &EntryDraft) -> Result<JournalEntry> {
        self.check(&self.fail_mutations)?;
        let mut entries = self.entries.lock().unwrap();
        if entries.contains_key(&draft.date) {
            return Err(KokoroError::api(409, "an entry for this date already exists"));
        }
        let now = Utc::now();
        let entry = JournalEntry {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            date: draft.date,
            content: draft.content.clone(),
            mood_score: draft.mood_score,
            image_url: draft.image_url.clone(),
            created_at: now,
            updated_at: now,
        };
        entries.insert(entry.date, entry.clone());
        Ok(entry)
    }

    async fn update(&self, id: Uuid, draft: &EntryDraft) -> Result<JournalEntry> {
        self.check(&self.fail_mutations)?;
        let mut entries = self.entries.lock().unwrap();
        let existing = entries
            .values()
            .find(|e| e.id == id)
            .cloned()
            .ok_or_else(|| KokoroError::not_found("JournalEntry", id.to_string()))?;
        let updated = JournalEntry {
            date: draft.date,
            content: draft.content.clone(),
            mood_score: draft.mood_score,
            image_url: draft.image_url.clone(),
            updated_at: Utc::now(),
            ..existing.clone()
        };
        entries.remove(&existing.date);
        entries.insert(updated.date, updated.clone());
        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.check(&self.fail_mutations)?;
        let mut entries = self.entries.lock().unwrap();
        let date = entries
            .values()
            .find(|e| e.id == id)
            .map(|e| e.date)
            .ok_or_else(|| KokoroError::not_found("JournalEntry", id.to_string()))?;
        entries.remove(&date);
        Ok(())
    }

    async fn upload_image(&self, upload: &ImageUpload) -> Result<String> {
        self.check(&self.fail_uploads)?;
        Ok(format!("https://files.example/{}", upload.file_name()))
    }

    async fn mood_stats(&self, month: Month) -> Result<MoodStats> {
        let entries = self.list_month(month).await?;
        let data: Vec<MoodPoint> = entries
            .iter()
            .map(|e| MoodPoint {
                date: e.date,
                mood_score: e.mood_score,
            })
            .collect();
        let count = data.len() as u32;
        let average = if count == 0 {
            0.0
        } else {
            let sum: u32 = data.iter().map(|p| p.mood_score.value() as u32).sum();
            (sum as f64 / count as f64 * 10.0).round() / 10.0
        };
        Ok(MoodStats {
            data,
            average,
            count,
        })
    }
}

/// Scriptable auth provider: holds an optional session, can fail or delay
/// the explicit fetch, and exposes its event sender for tests.
pub(crate) struct MockAuthProvider {
    session: Mutex<Option<Session>>,
    pub fail_fetch: AtomicBool,
    pub fetch_delay: Mutex<Option<Duration>>,
    events: broadcast::Sender<AuthChange>,
}

impl MockAuthProvider {
    pub fn new(session: Option<Session>) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            session: Mutex::new(session),
            fail_fetch: AtomicBool::new(false),
            fetch_delay: Mutex::new(None),
            events,
        }
    }

    pub fn emit(&self, event: AuthEvent, session: Option<Session>) {
        let _ = self.events.send(AuthChange::new(event, session));
    }
}

#[async_trait]
impl AuthProvider for MockAuthProvider {
    async fn current_session(&self) -> Result<Option<Session>> {
        let delay = *self.fetch_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(KokoroError::auth("token expired"));
        }
        Ok(self.session.lock().unwrap().clone())
    }

    async fn sign_in_with_password(&self, _email: &str, _password: &str) -> Result<Session> {
        let session = sample_session();
        *self.session.lock().unwrap() = Some(session.clone());
        self.emit(AuthEvent::SignedIn, Some(session.clone()));
        Ok(session)
    }

    async fn sign_up(&self, _email: &str, _password: &str) -> Result<SignUpOutcome> {
        Ok(SignUpOutcome::ConfirmationPending)
    }

    async fn send_magic_link(&self, _email: &str) -> Result<()> {
        Ok(())
    }

    fn authorize_url(&self, provider: &str) -> String {
        format!("https://auth.example/authorize?provider={}", provider)
    }

    async fn establish_from_fragment(&self, fragment: &RedirectFragment) -> Result<Session> {
        let delay = *self.fetch_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(KokoroError::auth("token exchange failed"));
        }
        let session = Session {
            access_token: fragment.access_token.clone(),
            ..sample_session()
        };
        *self.session.lock().unwrap() = Some(session.clone());
        self.emit(AuthEvent::SignedIn, Some(session.clone()));
        Ok(session)
    }

    async fn refresh_session(&self, _refresh_token: &str) -> Result<Session> {
        self.session
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| KokoroError::auth("no session to refresh"))
    }

    async fn sign_out(&self) -> Result<()> {
        *self.session.lock().unwrap() = None;
        self.emit(AuthEvent::SignedOut, None);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthChange> {
        self.events.subscribe()
    }
}
