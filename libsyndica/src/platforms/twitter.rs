//! Twitter adapter
//!
//! Hashtags ride inline in the status body; no first comment, no native
//! scheduling.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::error::Result;
use crate::requirements::{self, PlatformRequirements};
use crate::types::{PlatformKind, PublishContent, SocialAccount};

use super::client::{RemotePost, RemoteRequest};
use super::{caption_with_inline_tags, AdapterCore, PlatformAdapter};

pub struct TwitterAdapter {
    core: Arc<AdapterCore>,
}

impl TwitterAdapter {
    pub fn new(core: Arc<AdapterCore>) -> Self {
        Self { core }
    }

    fn shape(content: &PublishContent, _scheduled_at: Option<i64>) -> RemoteRequest {
        RemoteRequest::Status {
            body: caption_with_inline_tags(content),
            media_urls: content.media.iter().map(|m| m.url.clone()).collect(),
        }
    }
}

#[async_trait]
impl PlatformAdapter for TwitterAdapter {
    fn kind(&self) -> PlatformKind {
        PlatformKind::Twitter
    }

    fn requirements(&self) -> &'static PlatformRequirements {
        &requirements::TWITTER
    }

    async fn publish_post(
        &self,
        account: &SocialAccount,
        content: &PublishContent,
    ) -> Result<RemotePost> {
        self.core
            .publish(self.requirements(), account, content, None, Self::shape)
            .await
    }

    async fn schedule_post(
        &self,
        account: &SocialAccount,
        content: &PublishContent,
        publish_at: DateTime<Utc>,
    ) -> Result<RemotePost> {
        // Requirements declare no native scheduling; the core rejects this
        self.core
            .publish(self.requirements(), account, content, Some(publish_at), Self::shape)
            .await
    }

    async fn delete_post(&self, account: &SocialAccount, remote_post_id: &str) -> Result<()> {
        self.core.delete(self.kind(), account, remote_post_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MediaItem, MediaKind};

    #[test]
    fn test_status_shape() {
        let mut content = PublishContent::text("shipping today");
        content.hashtags = vec!["rustlang".to_string()];
        content.media = vec![MediaItem::new("https://cdn.example/a.png", MediaKind::Image)];

        match TwitterAdapter::shape(&content, None) {
            RemoteRequest::Status { body, media_urls } => {
                assert_eq!(body, "shipping today\n\n#rustlang");
                assert_eq!(media_urls, vec!["https://cdn.example/a.png"]);
            }
            other => panic!("expected Status, got {other:?}"),
        }
    }
}
