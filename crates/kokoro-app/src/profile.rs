//! Profile summary derived from the active session.

use chrono::NaiveDate;

use kokoro_core::auth::Session;

/// What the profile panel shows about the signed-in user.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileView {
    /// Avatar initial, the first letter of the email uppercased.
    pub initial: char,
    pub email: String,
    /// Date the account was created, when the token carries it.
    pub member_since: Option<NaiveDate>,
}

impl ProfileView {
    /// Builds the view from session data alone; no request is made.
    ///
    /// A session without an email (possible for some OAuth identities)
    /// falls back to a placeholder rather than hiding the panel.
    pub fn from_session(session: &Session) -> Self {
        let email = session
            .user
            .email
            .clone()
            .unwrap_or_else(|| "unknown".to_string());
        let initial = email
            .chars()
            .next()
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or('?');
        Self {
            initial,
            email,
            member_since: session.user.created_at.map(|t| t.date_naive()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_session;

    #[test]
    fn test_view_from_full_session() {
        let view = ProfileView::from_session(&sample_session());
        assert_eq!(view.initial, 'U');
        assert_eq!(view.email, "user@example.com");
        assert!(view.member_since.is_some());
    }

    #[test]
    fn test_missing_email_uses_placeholder() {
        let mut session = sample_session();
        session.user.email = None;
        session.user.created_at = None;

        let view = ProfileView::from_session(&session);
        assert_eq!(view.email, "unknown");
        assert_eq!(view.initial, 'U');
        assert_eq!(view.member_since, None);
    }
}
