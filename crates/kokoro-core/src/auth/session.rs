//! Session domain model.
//!
//! The client holds a read-only, time-limited copy of the session issued by
//! the auth provider; the access token is treated as an opaque bearer
//! credential.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Margin subtracted from the expiry when deciding validity, so a token
/// about to lapse mid-request already counts as expired.
const EXPIRY_SKEW_SECONDS: i64 = 30;

/// The authenticated user as reported by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Provider-issued user identifier
    pub id: Uuid,
    /// Email address, if the provider knows one
    #[serde(default)]
    pub email: Option<String>,
    /// Account creation timestamp
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// The authenticated-identity credential window issued by the auth provider.
///
/// Created on successful login, OAuth callback or token refresh; invalidated
/// on sign-out or expiry. All gated UI hangs off a valid session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Opaque bearer credential for API requests
    pub access_token: String,
    /// Token used to obtain a fresh session once this one expires
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Token scheme, normally "bearer"
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Expiry instant; `None` means the provider reported no expiry
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    /// The user this session authenticates
    pub user: UserProfile,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl Session {
    /// Whether this session has lapsed (with a small skew margin).
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => now >= expires_at - Duration::seconds(EXPIRY_SKEW_SECONDS),
            None => false,
        }
    }

    /// The bearer token for the `Authorization` header.
    pub fn bearer_token(&self) -> &str {
        &self.access_token
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_expiring_at(expires_at: Option<DateTime<Utc>>) -> Session {
        Session {
            access_token: "token".to_string(),
            refresh_token: None,
            token_type: "bearer".to_string(),
            expires_at,
            user: UserProfile {
                id: Uuid::new_v4(),
                email: Some("a@example.com".to_string()),
                created_at: None,
            },
        }
    }

    #[test]
    fn test_expiry_with_skew_margin() {
        let now = Utc::now();
        // Expires comfortably in the future: valid.
        assert!(!session_expiring_at(Some(now + Duration::hours(1))).is_expired(now));
        // Expires within the skew margin: already treated as expired.
        assert!(session_expiring_at(Some(now + Duration::seconds(10))).is_expired(now));
        // Past expiry.
        assert!(session_expiring_at(Some(now - Duration::seconds(1))).is_expired(now));
    }

    #[test]
    fn test_no_expiry_means_valid() {
        assert!(!session_expiring_at(None).is_expired(Utc::now()));
    }
}
