//! File-backed session persistence.
//!
//! The browser SDK keeps its session in localStorage so a fresh page load
//! can resolve it; the terminal analog is a TOML file under the user's
//! config directory. Writes go through a temporary file plus atomic rename
//! so a crash never leaves a half-written session behind.

use std::fs::{self, File};
use std::io::Write as IoWrite;
use std::path::PathBuf;

use kokoro_core::auth::Session;
use kokoro_core::error::{KokoroError, Result};

/// A handle to the persisted session file.
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Opens the store at the default location:
    /// `~/.config/kokoro/session.toml`
    pub fn open_default() -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| KokoroError::config("could not determine home directory"))?;
        Ok(Self::new(
            home.join(".config").join("kokoro").join("session.toml"),
        ))
    }

    /// Loads the persisted session.
    ///
    /// A missing or empty file is `Ok(None)`; a corrupt file is an error so
    /// the caller can decide to clear it.
    pub fn load(&self) -> Result<Option<Session>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(None);
        }
        let session: Session = toml::from_str(&content)?;
        Ok(Some(session))
    }

    /// Saves the session atomically (tmp file + rename).
    pub fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.exists()
        {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(session)?;

        // Write to a sibling tmp file so the rename stays on one filesystem.
        let tmp_path = self.path.with_extension("toml.tmp");
        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(content.as_bytes())?;
        tmp_file.sync_all()?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    /// Removes the persisted session, if any.
    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use kokoro_core::auth::UserProfile;
    use uuid::Uuid;

    fn sample_session() -> Session {
        Session {
            access_token: "access".to_string(),
            refresh_token: Some("refresh".to_string()),
            token_type: "bearer".to_string(),
            expires_at: Some(Utc.with_ymd_and_hms(2025, 6, 10, 12, 0, 0).unwrap()),
            user: UserProfile {
                id: Uuid::new_v4(),
                email: Some("user@example.com".to_string()),
                created_at: Some(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()),
            },
        }
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.toml"));
        let session = sample_session();

        store.save(&session).unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded, session);
    }

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.toml"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("nested").join("session.toml"));
        store.save(&sample_session()).unwrap();
        assert!(store.load().unwrap().is_some());
    }

    #[test]
    fn test_clear_removes_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.toml"));
        store.save(&sample_session()).unwrap();

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        // Clearing twice is fine.
        store.clear().unwrap();
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.toml");
        fs::write(&path, "not = [valid").unwrap();
        let store = SessionStore::new(path);
        assert!(store.load().is_err());
    }
}
