//! OAuth redirect fragment parsing.
//!
//! After the OAuth dance the provider lands the user on the app with the
//! tokens in the URL fragment (`#access_token=...&refresh_token=...`). The
//! fragment is a transient credential carrier: it is parsed once to
//! establish the session and must never be retained in the visible address
//! afterwards.

/// The token material carried by an OAuth redirect fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct RedirectFragment {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_type: String,
    /// Lifetime in seconds, relative to when the fragment was issued.
    pub expires_in: Option<i64>,
}

impl RedirectFragment {
    /// Parses a URL fragment into its token material.
    ///
    /// Accepts the fragment with or without its leading `#`. Returns `None`
    /// when no `access_token` key is present, which the gate treats as "no
    /// pending OAuth redirect".
    pub fn parse(fragment: &str) -> Option<Self> {
        let fragment = fragment.strip_prefix('#').unwrap_or(fragment);
        if fragment.is_empty() {
            return None;
        }

        let mut access_token = None;
        let mut refresh_token = None;
        let mut token_type = None;
        let mut expires_in = None;

        for pair in fragment.split('&') {
            let (key, value) = pair.split_once('=')?;
            match key {
                "access_token" => access_token = Some(value.to_string()),
                "refresh_token" => refresh_token = Some(value.to_string()),
                "token_type" => token_type = Some(value.to_string()),
                "expires_in" => expires_in = value.parse().ok(),
                _ => {}
            }
        }

        Some(Self {
            access_token: access_token?,
            refresh_token,
            token_type: token_type.unwrap_or_else(|| "bearer".to_string()),
            expires_in,
        })
    }
}

/// Strips the fragment from a URL, leaving path and query intact.
///
/// This is the sanitized address to show once a session has been
/// established from the fragment.
pub fn sanitized_landing(url: &str) -> String {
    match url.split_once('#') {
        Some((base, _)) => base.to_string(),
        None => url.to_string(),
    }
}
