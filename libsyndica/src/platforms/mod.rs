//! Platform adapters
//!
//! One [`PlatformAdapter`] implementation per destination platform. Variants
//! differ only in their requirements record and the shape of the remote call;
//! rate limiting, validation, formatting, retry and error classification are
//! shared through [`AdapterCore`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::config::{Config, RateLimitSection};
use crate::error::{PlatformError, Result};
use crate::format;
use crate::rate_limit::{MemoryStore, RateLimitConfig, RateLimiter};
use crate::requirements::PlatformRequirements;
use crate::retry::RetryPolicy;
use crate::types::{PlatformKind, PublishContent, SocialAccount};

pub mod client;
pub mod mock;

mod facebook;
mod instagram;
mod linkedin;
mod pinterest;
mod tiktok;
mod twitter;
mod youtube;

pub use client::{HttpRemoteClient, RemoteClient, RemotePost, RemoteRequest};
pub use facebook::FacebookAdapter;
pub use instagram::InstagramAdapter;
pub use linkedin::LinkedInAdapter;
pub use mock::MockRemoteClient;
pub use pinterest::PinterestAdapter;
pub use tiktok::TikTokAdapter;
pub use twitter::TwitterAdapter;
pub use youtube::YouTubeAdapter;

/// The per-platform publishing contract.
///
/// `validate_content` and `format_content` have default implementations
/// driven entirely by the variant's requirements record; variants only
/// provide the record and the remote-call shape.
#[async_trait]
pub trait PlatformAdapter: Send + Sync {
    fn kind(&self) -> PlatformKind;

    fn requirements(&self) -> &'static PlatformRequirements;

    /// Check content against this platform's requirements. A non-empty list
    /// blocks publishing.
    fn validate_content(&self, content: &PublishContent) -> Vec<String> {
        format::validate(content, self.requirements())
    }

    /// Coerce content into compliance with this platform's requirements.
    fn format_content(&self, content: &PublishContent) -> PublishContent {
        format::format(content, self.requirements())
    }

    /// Publish immediately: admission check, re-validate, format, then the
    /// remote call wrapped by the retry policy.
    async fn publish_post(
        &self,
        account: &SocialAccount,
        content: &PublishContent,
    ) -> Result<RemotePost>;

    /// Publish at a future instant. Fails with `NotSupported` on platforms
    /// whose requirements declare no native scheduling.
    async fn schedule_post(
        &self,
        account: &SocialAccount,
        content: &PublishContent,
        publish_at: DateTime<Utc>,
    ) -> Result<RemotePost>;

    /// Best-effort remote deletion.
    async fn delete_post(&self, account: &SocialAccount, remote_post_id: &str) -> Result<()>;
}

/// Shared machinery every adapter delegates to.
pub struct AdapterCore {
    limiter: RateLimiter,
    retry: RetryPolicy,
    client: Arc<dyn RemoteClient>,
    rate_limit: RateLimitSection,
}

impl AdapterCore {
    pub fn new(
        limiter: RateLimiter,
        retry: RetryPolicy,
        client: Arc<dyn RemoteClient>,
        rate_limit: RateLimitSection,
    ) -> Self {
        Self {
            limiter,
            retry,
            client,
            rate_limit,
        }
    }

    /// A core backed by an in-process rate limit store. Used by tests and
    /// single-instance deployments.
    pub fn in_process(client: Arc<dyn RemoteClient>, config: &Config) -> Self {
        Self::new(
            RateLimiter::new(Arc::new(MemoryStore::new()), config.rate_limit.fail_open),
            RetryPolicy::from(&config.retry),
            client,
            config.rate_limit.clone(),
        )
    }

    /// The shared publish pipeline: rate-limit admission, validation,
    /// formatting, then the retried remote call built by `shape`.
    pub(crate) async fn publish(
        &self,
        reqs: &'static PlatformRequirements,
        account: &SocialAccount,
        content: &PublishContent,
        publish_at: Option<DateTime<Utc>>,
        shape: impl Fn(&PublishContent, Option<i64>) -> RemoteRequest + Send + Sync,
    ) -> Result<RemotePost> {
        let kind = reqs.platform;

        if publish_at.is_some() && !reqs.supports_native_scheduling {
            return Err(PlatformError::NotSupported(format!(
                "{kind} does not support native scheduling"
            ))
            .into());
        }

        let (max_requests, window) = self.rate_limit.quota_for(kind.as_str());
        self.limiter
            .admit(kind, &account.id, &RateLimitConfig { max_requests, window })
            .await?;

        let errors = format::validate(content, reqs);
        if !errors.is_empty() {
            return Err(PlatformError::Validation(errors.join("; ")).into());
        }

        let formatted = format::format(content, reqs);
        let request = shape(&formatted, publish_at.map(|dt| dt.timestamp()));
        debug!("{kind}: publishing to account {}", account.id);

        let label = format!("{kind} publish");
        self.retry
            .run(&label, || async {
                self.client.execute(kind, account, &request).await
            })
            .await
    }

    pub(crate) async fn delete(
        &self,
        kind: PlatformKind,
        account: &SocialAccount,
        remote_post_id: &str,
    ) -> Result<()> {
        let label = format!("{kind} delete");
        self.retry
            .run(&label, || async {
                self.client.delete(kind, account, remote_post_id).await
            })
            .await
    }
}

/// Render a caption with inline hashtags for platforms that keep hashtags in
/// the text itself.
pub(crate) fn caption_with_inline_tags(content: &PublishContent) -> String {
    if content.hashtags.is_empty() {
        return content.body.clone();
    }
    let tags = content
        .hashtags
        .iter()
        .map(|t| {
            if t.starts_with('#') {
                t.clone()
            } else {
                format!("#{t}")
            }
        })
        .collect::<Vec<_>>()
        .join(" ");
    if content.body.is_empty() {
        tags
    } else {
        format!("{}\n\n{}", content.body, tags)
    }
}

/// Construct the adapter for one platform.
pub fn adapter_for(kind: PlatformKind, core: Arc<AdapterCore>) -> Arc<dyn PlatformAdapter> {
    match kind {
        PlatformKind::Instagram => Arc::new(InstagramAdapter::new(core)),
        PlatformKind::Facebook => Arc::new(FacebookAdapter::new(core)),
        PlatformKind::Twitter => Arc::new(TwitterAdapter::new(core)),
        PlatformKind::LinkedIn => Arc::new(LinkedInAdapter::new(core)),
        PlatformKind::TikTok => Arc::new(TikTokAdapter::new(core)),
        PlatformKind::YouTube => Arc::new(YouTubeAdapter::new(core)),
        PlatformKind::Pinterest => Arc::new(PinterestAdapter::new(core)),
    }
}

/// All adapters, built once over a shared core.
pub struct AdapterRegistry {
    adapters: HashMap<PlatformKind, Arc<dyn PlatformAdapter>>,
}

impl AdapterRegistry {
    pub fn new(core: Arc<AdapterCore>) -> Self {
        let adapters = PlatformKind::ALL
            .into_iter()
            .map(|kind| (kind, adapter_for(kind, Arc::clone(&core))))
            .collect();
        Self { adapters }
    }

    pub fn get(&self, kind: PlatformKind) -> Arc<dyn PlatformAdapter> {
        // The registry is total over PlatformKind by construction
        Arc::clone(&self.adapters[&kind])
    }
}
