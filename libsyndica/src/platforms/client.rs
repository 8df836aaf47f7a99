//! Remote-call shapes and the HTTP client behind every adapter
//!
//! Adapters reduce a formatted post to one [`RemoteRequest`] value; the
//! [`RemoteClient`] executes it. Keeping the request a plain value lets tests
//! script outcomes and inspect exactly what an adapter would have sent.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::HttpSection;
use crate::error::{PlatformError, Result};
use crate::types::{PlatformKind, SocialAccount};

/// The platform-specific shape of a publish call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum RemoteRequest {
    /// One media container plus caption (Instagram single image, Facebook).
    SingleContainer {
        caption: String,
        media_url: Option<String>,
        link: Option<String>,
        first_comment: Option<String>,
        scheduled_at: Option<i64>,
    },
    /// Multi-media container (Instagram carousel, LinkedIn multi-image).
    Carousel {
        caption: String,
        media_urls: Vec<String>,
        first_comment: Option<String>,
        scheduled_at: Option<i64>,
    },
    /// Short status update (Twitter).
    Status {
        body: String,
        media_urls: Vec<String>,
    },
    /// Chunked video upload (TikTok, YouTube).
    ResumableUpload {
        title: Option<String>,
        description: String,
        video_url: String,
        scheduled_at: Option<i64>,
    },
    /// A pin: media plus mandatory destination link (Pinterest).
    Pin {
        description: String,
        media_url: String,
        link: String,
        keywords: Vec<String>,
        scheduled_at: Option<i64>,
    },
}

/// Identifier and permalink the remote service assigned to a published post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemotePost {
    pub id: String,
    pub url: String,
}

/// Executes remote calls on behalf of adapters. One implementation talks
/// HTTP; the scripted mock stands in for it in tests.
#[async_trait]
pub trait RemoteClient: Send + Sync {
    async fn execute(
        &self,
        platform: PlatformKind,
        account: &SocialAccount,
        request: &RemoteRequest,
    ) -> Result<RemotePost>;

    async fn delete(
        &self,
        platform: PlatformKind,
        account: &SocialAccount,
        remote_post_id: &str,
    ) -> Result<()>;
}

pub struct HttpRemoteClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpRemoteClient {
    pub fn new(section: &HttpSection) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(section.timeout_secs))
            .build()
            .map_err(|e| PlatformError::Fatal(format!("HTTP client setup failed: {e}")))?;

        let base_url = section
            .base_url
            .clone()
            .unwrap_or_else(|| "https://api.syndica.dev".to_string());

        Ok(Self { http, base_url })
    }

    fn posts_url(&self, platform: PlatformKind, account: &SocialAccount) -> String {
        format!(
            "{}/v1/{}/accounts/{}/posts",
            self.base_url, platform, account.id
        )
    }

    async fn handle_response(response: reqwest::Response) -> Result<RemotePost> {
        let status = response.status();
        if status.is_success() {
            let post: RemotePost = response
                .json()
                .await
                .map_err(|e| PlatformError::Fatal(format!("Malformed remote response: {e}")))?;
            return Ok(post);
        }

        let body = response.text().await.unwrap_or_default();
        Err(classify_status(status, &body).into())
    }
}

/// Map an HTTP status to the retry classification adapters rely on.
fn classify_status(status: reqwest::StatusCode, body: &str) -> PlatformError {
    match status.as_u16() {
        429 => PlatformError::Transient(format!("429 Too Many Requests: {body}")),
        401 | 403 => PlatformError::Fatal(format!("{status}: invalid credential")),
        400 => PlatformError::Fatal(format!("400 Bad Request: {body}")),
        s if s >= 500 => PlatformError::Transient(format!("{status}: {body}")),
        _ => PlatformError::from_remote_message(format!("{status}: {body}")),
    }
}

#[async_trait]
impl RemoteClient for HttpRemoteClient {
    async fn execute(
        &self,
        platform: PlatformKind,
        account: &SocialAccount,
        request: &RemoteRequest,
    ) -> Result<RemotePost> {
        let response = self
            .http
            .post(self.posts_url(platform, account))
            .bearer_auth(&account.access_token)
            .json(request)
            .send()
            .await
            .map_err(|e| PlatformError::Transient(format!("Request failed: {e}")))?;

        Self::handle_response(response).await
    }

    async fn delete(
        &self,
        platform: PlatformKind,
        account: &SocialAccount,
        remote_post_id: &str,
    ) -> Result<()> {
        let url = format!("{}/{}", self.posts_url(platform, account), remote_post_id);
        let response = self
            .http
            .delete(url)
            .bearer_auth(&account.access_token)
            .send()
            .await
            .map_err(|e| PlatformError::Transient(format!("Request failed: {e}")))?;

        let status = response.status();
        // A post already gone remotely counts as deleted
        if status.is_success() || status == reqwest::StatusCode::NOT_FOUND {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(classify_status(status, &body).into())
    }
}
