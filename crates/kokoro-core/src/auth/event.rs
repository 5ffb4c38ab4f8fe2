use serde::{Deserialize, Serialize};

use super::session::Session;

/// Session lifecycle events published by the auth provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthEvent {
    /// A persisted session was restored at startup.
    InitialSession,
    /// The user signed in (password, one-time link or OAuth callback).
    SignedIn,
    /// The access token was refreshed.
    TokenRefreshed,
    /// The user signed out or the session was revoked.
    SignedOut,
}

/// One session-change notification, carrying the session when one exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthChange {
    pub event: AuthEvent,
    #[serde(default)]
    pub session: Option<Session>,
}

impl AuthChange {
    pub fn new(event: AuthEvent, session: Option<Session>) -> Self {
        Self { event, session }
    }

    /// Whether this change delivers a usable session (the events the gate's
    /// subscription arm accepts).
    pub fn establishes_session(&self) -> bool {
        matches!(
            self.event,
            AuthEvent::InitialSession | AuthEvent::SignedIn | AuthEvent::TokenRefreshed
        ) && self.session.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::session::UserProfile;
    use uuid::Uuid;

    fn some_session() -> Session {
        Session {
            access_token: "t".to_string(),
            refresh_token: None,
            token_type: "bearer".to_string(),
            expires_at: None,
            user: UserProfile {
                id: Uuid::new_v4(),
                email: None,
                created_at: None,
            },
        }
    }

    #[test]
    fn test_establishes_session() {
        assert!(AuthChange::new(AuthEvent::SignedIn, Some(some_session())).establishes_session());
        assert!(
            AuthChange::new(AuthEvent::InitialSession, Some(some_session()))
                .establishes_session()
        );
        // A sign-in event without a session establishes nothing.
        assert!(!AuthChange::new(AuthEvent::SignedIn, None).establishes_session());
        assert!(!AuthChange::new(AuthEvent::SignedOut, Some(some_session())).establishes_session());
    }
}
