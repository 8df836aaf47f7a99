//! LinkedIn adapter

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::error::Result;
use crate::requirements::{self, PlatformRequirements};
use crate::types::{PlatformKind, PublishContent, SocialAccount};

use super::client::{RemotePost, RemoteRequest};
use super::{caption_with_inline_tags, AdapterCore, PlatformAdapter};

pub struct LinkedInAdapter {
    core: Arc<AdapterCore>,
}

impl LinkedInAdapter {
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
impl PlatformAdapter for LinkedInAdapter {
    fn kind(&self) -> PlatformKind {
        PlatformKind::LinkedIn
    }

    fn requirements(&self) -> &'static PlatformRequirements {
        &requirements::LINKEDIN
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
