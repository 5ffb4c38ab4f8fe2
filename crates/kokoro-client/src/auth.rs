//! AuthClient - REST implementation of the auth provider contract.
//!
//! Talks to a GoTrue-style auth service: password and refresh-token grants,
//! sign-up, one-time links, OAuth entry URLs and sign-out. The client owns
//! the persisted session copy and publishes every session transition on a
//! broadcast stream; access tokens stay opaque bearers except for reading
//! the JWT payload when an OAuth fragment carries no user object.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, broadcast};
use uuid::Uuid;

use kokoro_core::auth::{
    AuthChange, AuthEvent, AuthProvider, RedirectFragment, Session, SignUpOutcome, UserProfile,
};
use kokoro_core::error::{KokoroError, Result};

use crate::config::ClientConfig;
use crate::session_store::SessionStore;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// REST client for the auth provider.
pub struct AuthClient {
    client: Client,
    auth_url: String,
    anon_key: String,
    oauth_redirect_url: Option<String>,
    store: SessionStore,
    cached: RwLock<Option<Session>>,
    events: broadcast::Sender<AuthChange>,
}

#[derive(Debug, Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct RefreshGrant<'a> {
    refresh_token: &'a str,
}

#[derive(Debug, Serialize)]
struct OtpRequest<'a> {
    email: &'a str,
    create_user: bool,
}

#[derive(Debug, Deserialize)]
struct ApiUser {
    id: Uuid,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    /// Unix timestamp; newer GoTrue versions send it alongside expires_in
    #[serde(default)]
    expires_at: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
    user: ApiUser,
}

/// Sign-up answers with a session when auto-confirm is on, otherwise with
/// the bare user record (confirmation mail pending).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(TokenResponse),
    User(ApiUser),
}

#[derive(Debug, Deserialize, Default)]
struct AuthErrorBody {
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl AuthErrorBody {
    fn message(self) -> Option<String> {
        self.error_description.or(self.msg).or(self.error)
    }
}

/// The JWT payload fields the client reads when a fragment carries no user
/// object. The token otherwise stays opaque.
#[derive(Debug, Deserialize)]
struct JwtClaims {
    sub: Uuid,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    exp: Option<i64>,
}

impl AuthClient {
    /// Creates a client and restores any persisted session.
    pub fn new(config: &ClientConfig, store: SessionStore) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            client: Client::new(),
            auth_url: config.auth_url.trim_end_matches('/').to_string(),
            anon_key: config.auth_anon_key.clone(),
            oauth_redirect_url: config.oauth_redirect_url.clone(),
            store,
            cached: RwLock::new(None),
            events,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.auth_url, path)
    }

    fn emit(&self, event: AuthEvent, session: Option<Session>) {
        // Send fails only when nobody subscribes, which is fine.
        let _ = self.events.send(AuthChange::new(event, session));
    }

    async fn adopt(&self, session: Session, event: AuthEvent) -> Result<Session> {
        self.store.save(&session)?;
        *self.cached.write().await = Some(session.clone());
        self.emit(event, Some(session.clone()));
        Ok(session)
    }

    async fn decode_failure(response: reqwest::Response) -> KokoroError {
        let status = response.status().as_u16();
        let message = response
            .json::<AuthErrorBody>()
            .await
            .ok()
            .and_then(AuthErrorBody::message)
            .unwrap_or_else(|| "authentication request failed".to_string());
        if status == 500 || status == 502 || status == 503 {
            KokoroError::api(status, message)
        } else {
            KokoroError::auth(message)
        }
    }

    async fn token_request(&self, grant_type: &str, body: &impl Serialize) -> Result<Session> {
        let response = self
            .client
            .post(self.endpoint("/token"))
            .query(&[("grant_type", grant_type)])
            .header("apikey", &self.anon_key)
            .json(body)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| KokoroError::network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::decode_failure(response).await);
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| KokoroError::network(format!("malformed token response: {}", e)))?;
        Ok(session_from_token_response(token, Utc::now()))
    }

    /// Drops cache and disk copy without emitting an event (used when a
    /// session turns out to be unusable).
    async fn discard_session(&self) {
        if let Err(e) = self.store.clear() {
            tracing::warn!("[AuthClient] failed to clear persisted session: {}", e);
        }
        *self.cached.write().await = None;
    }
}

#[async_trait]
impl AuthProvider for AuthClient {
    async fn current_session(&self) -> Result<Option<Session>> {
        // Cached copy first.
        let (session, restored) = {
            let cached = self.cached.read().await;
            match cached.clone() {
                Some(session) => (Some(session), false),
                None => (self.store.load().unwrap_or_default(), true),
            }
        };

        let Some(session) = session else {
            return Ok(None);
        };

        if !session.is_expired(Utc::now()) {
            if restored {
                *self.cached.write().await = Some(session.clone());
                self.emit(AuthEvent::InitialSession, Some(session.clone()));
            }
            return Ok(Some(session));
        }

        // Expired: one refresh attempt, then fail closed to None.
        let Some(refresh_token) = session.refresh_token.clone() else {
            self.discard_session().await;
            return Ok(None);
        };
        match self.refresh_session(&refresh_token).await {
            Ok(fresh) => Ok(Some(fresh)),
            Err(e) => {
                tracing::debug!("[AuthClient] session refresh failed: {}", e);
                self.discard_session().await;
                Ok(None)
            }
        }
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        let session = self
            .token_request("password", &PasswordGrant { email, password })
            .await?;
        self.adopt(session, AuthEvent::SignedIn).await
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome> {
        let response = self
            .client
            .post(self.endpoint("/signup"))
            .header("apikey", &self.anon_key)
            .json(&PasswordGrant { email, password })
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| KokoroError::network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::decode_failure(response).await);
        }

        let body: SignUpResponse = response
            .json()
            .await
            .map_err(|e| KokoroError::network(format!("malformed sign-up response: {}", e)))?;
        match body {
            SignUpResponse::Session(token) => {
                let session = session_from_token_response(token, Utc::now());
                let session = self.adopt(session, AuthEvent::SignedIn).await?;
                Ok(SignUpOutcome::Session(session))
            }
            SignUpResponse::User(_) => Ok(SignUpOutcome::ConfirmationPending),
        }
    }

    async fn send_magic_link(&self, email: &str) -> Result<()> {
        let response = self
            .client
            .post(self.endpoint("/otp"))
            .header("apikey", &self.anon_key)
            .json(&OtpRequest {
                email,
                create_user: true,
            })
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| KokoroError::network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::decode_failure(response).await);
        }
        Ok(())
    }

    fn authorize_url(&self, provider: &str) -> String {
        match &self.oauth_redirect_url {
            Some(redirect) => format!(
                "{}?provider={}&redirect_to={}",
                self.endpoint("/authorize"),
                provider,
                redirect
            ),
            None => format!("{}?provider={}", self.endpoint("/authorize"), provider),
        }
    }

    async fn establish_from_fragment(&self, fragment: &RedirectFragment) -> Result<Session> {
        let claims = decode_jwt_claims(&fragment.access_token)?;
        let expires_at = fragment
            .expires_in
            .map(|secs| Utc::now() + chrono::Duration::seconds(secs))
            .or_else(|| claims.exp.and_then(|exp| DateTime::from_timestamp(exp, 0)));

        let session = Session {
            access_token: fragment.access_token.clone(),
            refresh_token: fragment.refresh_token.clone(),
            token_type: fragment.token_type.clone(),
            expires_at,
            user: UserProfile {
                id: claims.sub,
                email: claims.email,
                created_at: None,
            },
        };
        self.adopt(session, AuthEvent::SignedIn).await
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<Session> {
        let session = self
            .token_request("refresh_token", &RefreshGrant { refresh_token })
            .await?;
        self.adopt(session, AuthEvent::TokenRefreshed).await
    }

    async fn sign_out(&self) -> Result<()> {
        let bearer = { self.cached.read().await.as_ref().map(|s| s.access_token.clone()) };

        // Best-effort revocation; local sign-out proceeds regardless.
        if let Some(token) = bearer {
            let result = self
                .client
                .post(self.endpoint("/logout"))
                .header("apikey", &self.anon_key)
                .header("Authorization", format!("Bearer {}", token))
                .timeout(REQUEST_TIMEOUT)
                .send()
                .await;
            if let Err(e) = result {
                tracing::warn!("[AuthClient] sign-out revocation failed: {}", e);
            }
        }

        self.store.clear()?;
        *self.cached.write().await = None;
        self.emit(AuthEvent::SignedOut, None);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthChange> {
        self.events.subscribe()
    }
}

/// Builds a session from a token grant response.
///
/// GoTrue reports expiry both ways; the absolute timestamp wins, the
/// relative lifetime is anchored at `now`.
fn session_from_token_response(token: TokenResponse, now: DateTime<Utc>) -> Session {
    let expires_at = token
        .expires_at
        .and_then(|ts| DateTime::from_timestamp(ts, 0))
        .or_else(|| {
            token
                .expires_in
                .map(|secs| now + chrono::Duration::seconds(secs))
        });
    Session {
        access_token: token.access_token,
        refresh_token: token.refresh_token,
        token_type: token.token_type.unwrap_or_else(|| "bearer".to_string()),
        expires_at,
        user: UserProfile {
            id: token.user.id,
            email: token.user.email,
            created_at: token.user.created_at,
        },
    }
}

/// Decodes the payload segment of a JWT without verifying the signature;
/// verification is the backend's job, this only reads identity claims.
fn decode_jwt_claims(token: &str) -> Result<JwtClaims> {
    let payload = token
        .split('.')
        .nth(1)
        .ok_or_else(|| KokoroError::auth("access token is not a JWT"))?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| KokoroError::auth(format!("invalid JWT payload encoding: {}", e)))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| KokoroError::auth(format!("invalid JWT payload: {}", e)))
}
