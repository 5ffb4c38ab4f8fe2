//! Configuration file management for kokoro.
//!
//! Reads client settings from `~/.config/kokoro/config.toml`, with
//! environment variables as a fallback when no file exists.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use kokoro_core::error::{KokoroError, Result};

/// Client configuration: where the journal API and the auth provider live.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Base path of the journal REST API, e.g. `https://api.example.com/api`
    pub api_base_url: String,
    /// Base URL of the auth provider, e.g. `https://xyz.supabase.co/auth/v1`
    pub auth_url: String,
    /// The provider's publishable (anon) API key
    pub auth_anon_key: String,
    /// Where the OAuth dance should land; optional
    #[serde(default)]
    pub oauth_redirect_url: Option<String>,
}

impl ClientConfig {
    /// Loads configuration from the default path, falling back to
    /// environment variables when no config file exists.
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::from_file(&path)
        } else {
            Self::from_env().map_err(|_| {
                KokoroError::config(format!(
                    "no configuration found: create {} or set KOKORO_API_URL, \
                     KOKORO_AUTH_URL and KOKORO_AUTH_ANON_KEY",
                    path.display()
                ))
            })
        }
    }

    /// Loads and parses a specific configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            KokoroError::config(format!(
                "failed to read configuration file at {}: {}",
                path.display(),
                e
            ))
        })?;
        toml::from_str(&content).map_err(|e| {
            KokoroError::config(format!(
                "failed to parse configuration file at {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Builds configuration from `KOKORO_API_URL`, `KOKORO_AUTH_URL` and
    /// `KOKORO_AUTH_ANON_KEY` (plus optional `KOKORO_OAUTH_REDIRECT_URL`).
    pub fn from_env() -> Result<Self> {
        let require = |name: &str| {
            env::var(name)
                .map_err(|_| KokoroError::config(format!("{} is not set", name)))
        };
        Ok(Self {
            api_base_url: require("KOKORO_API_URL")?,
            auth_url: require("KOKORO_AUTH_URL")?,
            auth_anon_key: require("KOKORO_AUTH_ANON_KEY")?,
            oauth_redirect_url: env::var("KOKORO_OAUTH_REDIRECT_URL").ok(),
        })
    }

    /// Returns the path to the configuration file: `~/.config/kokoro/config.toml`
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| KokoroError::config("could not determine home directory"))?;
        Ok(home.join(".config").join("kokoro").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_from_file_parses_full_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
api_base_url = "https://api.example.com/api"
auth_url = "https://auth.example.com/auth/v1"
auth_anon_key = "anon-key"
oauth_redirect_url = "https://app.example.com/callback"
"#
        )
        .unwrap();

        let config = ClientConfig::from_file(file.path()).unwrap();
        assert_eq!(config.api_base_url, "https://api.example.com/api");
        assert_eq!(config.auth_anon_key, "anon-key");
        assert_eq!(
            config.oauth_redirect_url.as_deref(),
            Some("https://app.example.com/callback")
        );
    }

    #[test]
    fn test_from_file_redirect_is_optional() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
api_base_url = "https://api.example.com/api"
auth_url = "https://auth.example.com/auth/v1"
auth_anon_key = "anon-key"
"#
        )
        .unwrap();

        let config = ClientConfig::from_file(file.path()).unwrap();
        assert!(config.oauth_redirect_url.is_none());
    }

    #[test]
    fn test_from_file_reports_missing_file() {
        let err = ClientConfig::from_file(Path::new("/nonexistent/config.toml")).unwrap_err();
        assert!(matches!(err, KokoroError::Config(_)));
    }

    #[test]
    fn test_from_file_reports_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "api_base_url = ").unwrap();
        let err = ClientConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, KokoroError::Config(_)));
    }
}
