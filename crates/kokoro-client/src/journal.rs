//! JournalClient - REST implementation of the entry store.
//!
//! Talks to the journal backend: month-granularity listing, create/update/
//! delete, multipart image upload and mood stats. The bearer token is asked
//! of the auth provider immediately before every request; the provider is
//! the sole source of truth for current validity and tokens are never
//! cached here.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::Deserialize;
use uuid::Uuid;

use kokoro_core::auth::AuthProvider;
use kokoro_core::entry::{EntryDraft, EntryStore, ImageUpload, JournalEntry, Month};
use kokoro_core::error::{KokoroError, Result};
use kokoro_core::mood::MoodStats;

use crate::config::ClientConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// REST client for the journal API.
pub struct JournalClient {
    client: Client,
    base_url: String,
    provider: Arc<dyn AuthProvider>,
}

/// The backend's error envelope: `{"error": "..."}`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    image_url: String,
}

impl JournalClient {
    pub fn new(config: &ClientConfig, provider: Arc<dyn AuthProvider>) -> Self {
        Self {
            client: Client::new(),
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            provider,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Fresh bearer header value, obtained immediately before the call.
    async fn bearer(&self) -> Result<String> {
        let session = self
            .provider
            .current_session()
            .await?
            .ok_or_else(|| KokoroError::auth("not signed in"))?;
        Ok(format!("Bearer {}", session.bearer_token()))
    }

    async fn decode_failure(response: Response) -> KokoroError {
        let status = response.status().as_u16();
        match status {
            401 | 403 => KokoroError::auth("the session was rejected by the API"),
            _ => {
                let message = response
                    .json::<ErrorBody>()
                    .await
                    .map(|body| body.error)
                    .unwrap_or_else(|_| "the journal API request failed".to_string());
                KokoroError::api(status, message)
            }
        }
    }

    async fn decode_entry(response: Response) -> Result<JournalEntry> {
        if !response.status().is_success() {
            return Err(Self::decode_failure(response).await);
        }
        response
            .json()
            .await
            .map_err(|e| KokoroError::network(format!("malformed entry response: {}", e)))
    }
}

#[async_trait]
impl EntryStore for JournalClient {
    async fn list_month(&self, month: Month) -> Result<Vec<JournalEntry>> {
        let response = self
            .client
            .get(self.endpoint("/journals/"))
            .query(&[("month", month.to_string())])
            .header("Authorization", self.bearer().await?)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| KokoroError::network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::decode_failure(response).await);
        }
        response
            .json()
            .await
            .map_err(|e| KokoroError::network(format!("malformed entry list: {}", e)))
    }

    async fn create(&self, draft: &EntryDraft) -> Result<JournalEntry> {
        let response = self
            .client
            .post(self.endpoint("/journals/"))
            .header("Authorization", self.bearer().await?)
            .json(draft)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| KokoroError::network(e.to_string()))?;
        Self::decode_entry(response).await
    }

    async fn update(&self, id: Uuid, draft: &EntryDraft) -> Result<JournalEntry> {
        let response = self
            .client
            .put(self.endpoint(&format!("/journals/{}/", id)))
            .header("Authorization", self.bearer().await?)
            .json(draft)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| KokoroError::network(e.to_string()))?;
        Self::decode_entry(response).await
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let response = self
            .client
            .delete(self.endpoint(&format!("/journals/{}/", id)))
            .header("Authorization", self.bearer().await?)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| KokoroError::network(e.to_string()))?;

        // The backend answers 204 on success; tolerate a plain 200 too.
        if response.status().is_success() {
            return Ok(());
        }
        Err(Self::decode_failure(response).await)
    }

    async fn upload_image(&self, upload: &ImageUpload) -> Result<String> {
        let part = Part::bytes(upload.bytes().to_vec())
            .file_name(upload.file_name().to_string())
            .mime_str(upload.content_type())
            .map_err(|e| KokoroError::validation(format!("invalid content type: {}", e)))?;
        let form = Form::new().part("image", part);

        let response = self
            .client
            .post(self.endpoint("/journals/upload-image/"))
            .header("Authorization", self.bearer().await?)
            .multipart(form)
            .timeout(UPLOAD_TIMEOUT)
            .send()
            .await
            .map_err(|e| KokoroError::network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::decode_failure(response).await);
        }
        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| KokoroError::network(format!("malformed upload response: {}", e)))?;
        Ok(body.image_url)
    }

    async fn mood_stats(&self, month: Month) -> Result<MoodStats> {
        let response = self
            .client
            .get(self.endpoint("/journals/mood-stats/"))
            .query(&[("month", month.to_string())])
            .header("Authorization", self.bearer().await?)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| KokoroError::network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::decode_failure(response).await);
        }
        response
            .json()
            .await
            .map_err(|e| KokoroError::network(format!("malformed mood stats: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_envelope_shape() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"error": "an entry for this date already exists"}"#).unwrap();
        assert_eq!(body.error, "an entry for this date already exists");
    }

    #[test]
    fn test_mood_stats_shape_ignores_month_echo() {
        let stats: MoodStats = serde_json::from_str(
            r#"{
                "month": "2025-06",
                "data": [{"date": "2025-06-01", "mood_score": 7}],
                "average": 7.0,
                "count": 1
            }"#,
        )
        .unwrap();
        assert_eq!(stats.count, 1);
        assert_eq!(stats.data.len(), 1);
    }
}
