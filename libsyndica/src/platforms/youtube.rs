//! YouTube adapter
//!
//! Video only. The first line of the caption becomes the video title,
//! truncated to YouTube's 100-character title cap; the full caption is the
//! description.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::error::Result;
use crate::format::truncate_at_word_boundary;
use crate::requirements::{self, PlatformRequirements};
use crate::types::{PlatformKind, PublishContent, SocialAccount};

use super::client::{RemotePost, RemoteRequest};
use super::{caption_with_inline_tags, AdapterCore, PlatformAdapter};

const MAX_TITLE_CHARS: usize = 100;

pub struct YouTubeAdapter {
    core: Arc<AdapterCore>,
}

impl YouTubeAdapter {
    pub fn new(core: Arc<AdapterCore>) -> Self {
        Self { core }
    }

    fn shape(content: &PublishContent, scheduled_at: Option<i64>) -> RemoteRequest {
        let first_line = content.body.lines().next().unwrap_or_default();
        RemoteRequest::ResumableUpload {
            title: Some(truncate_at_word_boundary(first_line, MAX_TITLE_CHARS)),
            description: caption_with_inline_tags(content),
            video_url: content
                .media
                .first()
                .map(|m| m.url.clone())
                .unwrap_or_default(),
            scheduled_at,
        }
    }
}

#[async_trait]
impl PlatformAdapter for YouTubeAdapter {
    fn kind(&self) -> PlatformKind {
        PlatformKind::YouTube
    }

    fn requirements(&self) -> &'static PlatformRequirements {
        &requirements::YOUTUBE
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
