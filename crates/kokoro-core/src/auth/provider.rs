//! Auth provider trait.
//!
//! Defines the consumed contract of the identity provider: session
//! retrieval, session-change subscription, sign-in (password, one-time
//! link, OAuth), sign-up and sign-out. Provider internals (token exchange,
//! password hashing) stay behind this seam.

use async_trait::async_trait;
use tokio::sync::broadcast;

use super::event::AuthChange;
use super::fragment::RedirectFragment;
use super::session::Session;
use crate::error::Result;

/// Outcome of a sign-up request.
///
/// Depending on provider configuration, a sign-up either yields a session
/// immediately or requires the user to confirm their email first.
#[derive(Debug, Clone, PartialEq)]
pub enum SignUpOutcome {
    /// The account exists and is signed in.
    Session(Session),
    /// The account was created; a confirmation email is on its way.
    ConfirmationPending,
}

/// An abstract identity provider.
///
/// # Implementation Notes
///
/// Implementations own the persisted session and are the sole source of
/// truth for current validity: callers must ask for the current session
/// immediately before each authenticated request and never cache the token
/// themselves. Every session transition is published on the broadcast
/// stream returned by [`subscribe`](AuthProvider::subscribe).
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// The current valid session, if any.
    ///
    /// An expired persisted session triggers one refresh attempt; a failed
    /// refresh yields `Ok(None)`, never a stale session.
    async fn current_session(&self) -> Result<Option<Session>>;

    /// Signs in with email and password.
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session>;

    /// Creates an account.
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome>;

    /// Requests a one-time sign-in link mailed to the user; delivery is the
    /// provider's concern.
    async fn send_magic_link(&self, email: &str) -> Result<()>;

    /// The URL starting an OAuth dance with the named external provider
    /// (e.g. "google"). Completing the dance lands a redirect fragment the
    /// session gate consumes.
    fn authorize_url(&self, provider: &str) -> String;

    /// Establishes a session from the tokens of an OAuth redirect fragment.
    async fn establish_from_fragment(&self, fragment: &RedirectFragment) -> Result<Session>;

    /// Exchanges a refresh token for a fresh session.
    async fn refresh_session(&self, refresh_token: &str) -> Result<Session>;

    /// Revokes the current session, clears the persisted copy and emits a
    /// sign-out event.
    async fn sign_out(&self) -> Result<()>;

    /// Subscribes to session-change events.
    fn subscribe(&self) -> broadcast::Receiver<AuthChange>;
}
