//! Pinterest adapter
//!
//! A pin needs exactly one media item and a destination link; hashtags are
//! plain keywords with the `#` already stripped by formatting.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::error::Result;
use crate::requirements::{self, PlatformRequirements};
use crate::types::{PlatformKind, PublishContent, SocialAccount};

use super::client::{RemotePost, RemoteRequest};
use super::{AdapterCore, PlatformAdapter};

pub struct PinterestAdapter {
    core: Arc<AdapterCore>,
}

impl PinterestAdapter {
    pub fn new(core: Arc<AdapterCore>) -> Self {
        Self { core }
    }

    fn shape(content: &PublishContent, scheduled_at: Option<i64>) -> RemoteRequest {
        RemoteRequest::Pin {
            description: content.body.clone(),
            media_url: content
                .media
                .first()
                .map(|m| m.url.clone())
                .unwrap_or_default(),
            // Validation guarantees the link is present before we get here
            link: content.link.clone().unwrap_or_default(),
            keywords: content.hashtags.clone(),
            scheduled_at,
        }
    }
}

#[async_trait]
impl PlatformAdapter for PinterestAdapter {
    fn kind(&self) -> PlatformKind {
        PlatformKind::Pinterest
    }

    fn requirements(&self) -> &'static PlatformRequirements {
        &requirements::PINTEREST
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
    fn test_pin_shape() {
        let mut content = PublishContent::text("cozy reading nook");
        content.media = vec![MediaItem::new("https://cdn.example/nook.jpg", MediaKind::Image)];
        content.link = Some("https://example.com/blog/nook".to_string());
        content.hashtags = vec!["interiordesign".to_string()];

        match PinterestAdapter::shape(&content, None) {
            RemoteRequest::Pin {
                description,
                media_url,
                link,
                keywords,
                ..
            } => {
                assert_eq!(description, "cozy reading nook");
                assert_eq!(media_url, "https://cdn.example/nook.jpg");
                assert_eq!(link, "https://example.com/blog/nook");
                assert_eq!(keywords, vec!["interiordesign"]);
            }
            other => panic!("expected Pin, got {other:?}"),
        }
    }
}
