//! Session gate.
//!
//! Resolves whether a valid session exists before any gated UI is revealed.
//! Two paths race: an explicit "get current session" call, and the
//! subscription to session-change events (OAuth redirects deliver the
//! session asynchronously, after the tokens are parsed from the redirect
//! fragment). The first non-null session wins and initializes the page
//! exactly once; the loser is cancelled. Resolution errors are treated
//! identically to "no session" - the gate always fails closed.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use kokoro_core::auth::{AuthChange, AuthEvent, AuthProvider, RedirectFragment, Session};

/// Bounded wait for a session to establish (covers the OAuth redirect
/// window).
pub const SESSION_WAIT: Duration = Duration::from_secs(5);

/// The gate's decision for this load.
#[derive(Debug, Clone, PartialEq)]
pub enum GateOutcome {
    /// A session exists; the gated page initializes now.
    Ready(Session),
    /// A session exists but the page already initialized; nothing to do.
    AlreadyInitialized(Session),
    /// No session (absent, expired, or resolution failed): show login.
    RedirectToLogin,
}

/// Gates page initialization behind session resolution.
pub struct SessionGate {
    provider: Arc<dyn AuthProvider>,
    initialized: AtomicBool,
}

impl SessionGate {
    pub fn new(provider: Arc<dyn AuthProvider>) -> Self {
        Self {
            provider,
            initialized: AtomicBool::new(false),
        }
    }

    /// Whether the gated page has initialized.
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Resolves the session for this load.
    ///
    /// `fragment` is the URL fragment the load arrived with, if any; when
    /// it parses as an OAuth redirect marker the explicit arm establishes
    /// the session from its tokens (and the fragment is consumed - callers
    /// show the sanitized landing afterwards). Without a marker, an
    /// explicit "no session" answer redirects immediately; with one, the
    /// gate keeps waiting on the event arm until the deadline.
    pub async fn resolve(&self, fragment: Option<&str>) -> GateOutcome {
        // Subscribe before the explicit call so an event-delivered session
        // cannot slip between the two.
        let mut events = self.provider.subscribe();
        let pending_oauth = fragment.and_then(RedirectFragment::parse);
        let had_marker = pending_oauth.is_some();

        let cancel = CancellationToken::new();

        let mut explicit_arm = tokio::spawn({
            let provider = self.provider.clone();
            let cancel = cancel.clone();
            async move {
                tokio::select! {
                    _ = cancel.cancelled() => None,
                    result = async {
                        match pending_oauth {
                            Some(marker) => {
                                provider.establish_from_fragment(&marker).await.map(Some)
                            }
                            None => provider.current_session().await,
                        }
                    } => match result {
                        Ok(session) => session,
                        Err(e) => {
                            // Fail closed: resolution errors are "no session".
                            tracing::warn!("[SessionGate] session resolution failed: {}", e);
                            None
                        }
                    },
                }
            }
        });

        let mut event_arm = tokio::spawn({
            let cancel = cancel.clone();
            async move {
                tokio::select! {
                    _ = cancel.cancelled() => None,
                    session = wait_for_establishing_event(&mut events) => session,
                }
            }
        });

        let winner = timeout(SESSION_WAIT, async {
            let mut explicit_done = false;
            let mut event_done = false;
            loop {
                tokio::select! {
                    result = &mut explicit_arm, if !explicit_done => {
                        explicit_done = true;
                        match result.ok().flatten() {
                            Some(session) => break Some(session),
                            // No marker means no redirect is in flight:
                            // nothing further will establish a session.
                            None if !had_marker => break None,
                            None => {}
                        }
                    }
                    result = &mut event_arm, if !event_done => {
                        event_done = true;
                        match result.ok().flatten() {
                            Some(session) => break Some(session),
                            None if explicit_done => break None,
                            None => {}
                        }
                    }
                    else => break None,
                }
            }
        })
        .await
        .unwrap_or(None);

        // Cancel the losing arm.
        cancel.cancel();

        match winner {
            Some(session) => {
                // Idempotent init latch: the page initializes exactly once.
                if self.initialized.swap(true, Ordering::SeqCst) {
                    GateOutcome::AlreadyInitialized(session)
                } else {
                    tracing::debug!("[SessionGate] session established, initializing");
                    GateOutcome::Ready(session)
                }
            }
            None => {
                tracing::debug!("[SessionGate] no session established, redirecting to login");
                GateOutcome::RedirectToLogin
            }
        }
    }

    /// Waits for an explicit sign-out after initialization, the cue to
    /// redirect to login. Returns early if the provider goes away.
    pub async fn await_sign_out(&self) {
        let mut events = self.provider.subscribe();
        loop {
            match events.recv().await {
                Ok(change) if change.event == AuthEvent::SignedOut && self.is_initialized() => {
                    return;
                }
                Ok(_) => {}
                Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => return,
            }
        }
    }
}

/// Waits for the first event that delivers a usable session. Pends forever
/// once the channel closes; the caller's deadline or cancellation ends the
/// wait.
async fn wait_for_establishing_event(
    events: &mut tokio::sync::broadcast::Receiver<AuthChange>,
) -> Option<Session> {
    loop {
        match events.recv().await {
            Ok(change) if change.establishes_session() => return change.session,
            Ok(_) => {}
            Err(RecvError::Lagged(_)) => {}
            Err(RecvError::Closed) => std::future::pending::<()>().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockAuthProvider, sample_session};

    fn gate_with(provider: MockAuthProvider) -> (Arc<MockAuthProvider>, SessionGate) {
        let provider = Arc::new(provider);
        let gate = SessionGate::new(provider.clone());
        (provider, gate)
    }

    #[tokio::test]
    async fn test_explicit_session_initializes() {
        let (_, gate) = gate_with(MockAuthProvider::new(Some(sample_session())));

        match gate.resolve(None).await {
            GateOutcome::Ready(session) => assert_eq!(session.access_token, "access-token"),
            other => panic!("expected Ready, got {:?}", other),
        }
        assert!(gate.is_initialized());
    }

    #[tokio::test]
    async fn test_no_session_without_marker_redirects_immediately() {
        let (_, gate) = gate_with(MockAuthProvider::new(None));
        assert_eq!(gate.resolve(None).await, GateOutcome::RedirectToLogin);
        assert!(!gate.is_initialized());
    }

    #[tokio::test]
    async fn test_resolution_error_fails_closed() {
        let provider = MockAuthProvider::new(Some(sample_session()));
        provider.fail_fetch.store(true, Ordering::SeqCst);
        let (_, gate) = gate_with(provider);

        assert_eq!(gate.resolve(None).await, GateOutcome::RedirectToLogin);
        assert!(!gate.is_initialized());
    }

    #[tokio::test]
    async fn test_oauth_marker_establishes_from_fragment() {
        let (_, gate) = gate_with(MockAuthProvider::new(None));

        let outcome = gate
            .resolve(Some("#access_token=from-fragment&token_type=bearer&expires_in=3600"))
            .await;
        match outcome {
            GateOutcome::Ready(session) => assert_eq!(session.access_token, "from-fragment"),
            other => panic!("expected Ready, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_garbage_fragment_counts_as_no_marker() {
        let (_, gate) = gate_with(MockAuthProvider::new(None));
        assert_eq!(
            gate.resolve(Some("#error=access_denied")).await,
            GateOutcome::RedirectToLogin
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_event_arm_wins_while_explicit_fetch_hangs() {
        let provider = MockAuthProvider::new(None);
        *provider.fetch_delay.lock().unwrap() = Some(Duration::from_secs(60));
        let (provider, gate) = gate_with(provider);
        let gate = Arc::new(gate);

        let resolve = tokio::spawn({
            let gate = gate.clone();
            async move { gate.resolve(None).await }
        });
        // Let the gate subscribe, then deliver the session via the event
        // stream.
        tokio::time::sleep(Duration::from_millis(100)).await;
        provider.emit(AuthEvent::SignedIn, Some(sample_session()));

        match resolve.await.unwrap() {
            GateOutcome::Ready(_) => {}
            other => panic!("expected Ready, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_exhaustion_redirects() {
        // A marker is pending but the event never arrives; the explicit
        // arm hangs past the deadline.
        let provider = MockAuthProvider::new(None);
        *provider.fetch_delay.lock().unwrap() = Some(Duration::from_secs(60));
        let (_, gate) = gate_with(provider);

        let outcome = gate.resolve(Some("#access_token=stuck")).await;
        assert_eq!(outcome, GateOutcome::RedirectToLogin);
    }

    #[tokio::test]
    async fn test_init_latch_fires_once() {
        let (_, gate) = gate_with(MockAuthProvider::new(Some(sample_session())));

        assert!(matches!(gate.resolve(None).await, GateOutcome::Ready(_)));
        assert!(matches!(
            gate.resolve(None).await,
            GateOutcome::AlreadyInitialized(_)
        ));
    }

    #[tokio::test]
    async fn test_sign_out_after_init_is_observed() {
        let (provider, gate) = gate_with(MockAuthProvider::new(Some(sample_session())));
        let gate = Arc::new(gate);
        assert!(matches!(gate.resolve(None).await, GateOutcome::Ready(_)));

        let watcher = tokio::spawn({
            let gate = gate.clone();
            async move { gate.await_sign_out().await }
        });
        tokio::task::yield_now().await;
        provider.sign_out().await.unwrap();

        watcher.await.unwrap();
    }
}
