//! # oEmbed Client
//!
//! Fetches a video's title from YouTube's oEmbed endpoint for the admin
//! autofill action. One request, bounded timeout, no retries: a failure is
//! reported to the caller, which records it in the title field.

use serde::Deserialize;
use std::time::Duration;
use vtsite_core::sanitize::sanitize_text;

/// Errors from an oEmbed lookup.
#[derive(Debug)]
pub enum OembedError {
    /// Request could not be sent or timed out.
    Request(String),
    /// Endpoint answered with a non-success status.
    Status(u16),
    /// Body was not oEmbed JSON, or had no usable title.
    Parse(String),
}

impl std::fmt::Display for OembedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Request(msg) => write!(f, "oEmbed request failed: {msg}"),
            Self::Status(status) => write!(f, "oEmbed endpoint returned {status}"),
            Self::Parse(msg) => write!(f, "oEmbed response unusable: {msg}"),
        }
    }
}

impl std::error::Error for OembedError {}

#[derive(Debug, Deserialize)]
struct OembedResponse {
    #[serde(default)]
    title: String,
}

/// Client for a single oEmbed endpoint.
#[derive(Debug, Clone)]
pub struct OembedClient {
    http: reqwest::Client,
    endpoint: String,
}

impl OembedClient {
    /// Client for `endpoint` (e.g. `https://www.youtube.com/oembed`).
    pub fn new(endpoint: &str, timeout_secs: u64) -> Result<Self, OembedError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(concat!("vtsite/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| OembedError::Request(e.to_string()))?;
        Ok(Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Title of the video at `video_url`, sanitized like any text setting.
    pub async fn fetch_title(&self, video_url: &str) -> Result<String, OembedError> {
        let resp = self
            .http
            .get(&self.endpoint)
            .query(&[("url", video_url), ("format", "json")])
            .send()
            .await
            .map_err(|e| OembedError::Request(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(OembedError::Status(status.as_u16()));
        }

        let body = resp
            .json::<OembedResponse>()
            .await
            .map_err(|e| OembedError::Parse(e.to_string()))?;

        let title = sanitize_text(&body.title);
        if title.is_empty() {
            return Err(OembedError::Parse("empty title".to_string()));
        }
        Ok(title)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_trailing_slash_is_trimmed() {
        let client = OembedClient::new("https://www.youtube.com/oembed/", 15).expect("client");
        assert_eq!(client.endpoint(), "https://www.youtube.com/oembed");
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_request_error() {
        // Port 9 (discard) is closed on test machines.
        let client = OembedClient::new("http://127.0.0.1:9/oembed", 2).expect("client");
        let result = client.fetch_title("https://youtu.be/dQw4w9WgXcQ").await;
        assert!(matches!(result, Err(OembedError::Request(_))));
    }
}
