//! Facebook adapter

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::error::Result;
use crate::requirements::{self, PlatformRequirements};
use crate::types::{PlatformKind, PublishContent, SocialAccount};

use super::client::{RemotePost, RemoteRequest};
use super::{caption_with_inline_tags, AdapterCore, PlatformAdapter};

pub struct FacebookAdapter {
    core: Arc<AdapterCore>,
}

impl FacebookAdapter {
    pub fn new(core: Arc<AdapterCore>) -> Self {
        Self { core }
    }

    fn shape(content: &PublishContent, scheduled_at: Option<i64>) -> RemoteRequest {
        let caption = caption_with_inline_tags(content);
        if content.media.len() > 1 {
            RemoteRequest::Carousel {
                caption,
                media_urls: content.media.iter().map(|m| m.url.clone()).collect(),
                first_comment: content.first_comment.clone(),
                scheduled_at,
            }
        } else {
            RemoteRequest::SingleContainer {
                caption,
                media_url: content.media.first().map(|m| m.url.clone()),
                link: content.link.clone(),
                first_comment: content.first_comment.clone(),
                scheduled_at,
            }
        }
    }
}

#[async_trait]
impl PlatformAdapter for FacebookAdapter {
    fn kind(&self) -> PlatformKind {
        PlatformKind::Facebook
    }

    fn requirements(&self) -> &'static PlatformRequirements {
        &requirements::FACEBOOK
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

    #[test]
    fn test_shape_carries_link_and_inline_tags() {
        let mut content = PublishContent::text("big news");
        content.hashtags = vec!["launch".to_string()];
        content.link = Some("https://example.com/news".to_string());

        match FacebookAdapter::shape(&content, None) {
            RemoteRequest::SingleContainer { caption, link, .. } => {
                assert_eq!(caption, "big news\n\n#launch");
                assert_eq!(link.as_deref(), Some("https://example.com/news"));
            }
            other => panic!("expected SingleContainer, got {other:?}"),
        }
    }
}
