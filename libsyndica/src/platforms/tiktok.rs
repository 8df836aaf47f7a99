//! TikTok adapter
//!
//! Video only, one item per post, delivered through a resumable upload.
//! Hashtags are already folded into the caption by formatting.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::error::Result;
use crate::requirements::{self, PlatformRequirements};
use crate::types::{PlatformKind, PublishContent, SocialAccount};

use super::client::{RemotePost, RemoteRequest};
use super::{AdapterCore, PlatformAdapter};

pub struct TikTokAdapter {
    core: Arc<AdapterCore>,
}

impl TikTokAdapter {
    pub fn new(core: Arc<AdapterCore>) -> Self {
        Self { core }
    }

    fn shape(content: &PublishContent, scheduled_at: Option<i64>) -> RemoteRequest {
        RemoteRequest::ResumableUpload {
            title: None,
            description: content.body.clone(),
            // Validation guarantees a video is attached before we get here
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
impl PlatformAdapter for TikTokAdapter {
    fn kind(&self) -> PlatformKind {
        PlatformKind::TikTok
    }

    fn requirements(&self) -> &'static PlatformRequirements {
        &requirements::TIKTOK
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
    fn test_resumable_upload_shape() {
        let mut content = PublishContent::text("behind the scenes");
        content.media = vec![MediaItem::new("https://cdn.example/v.mp4", MediaKind::Video)];

        match TikTokAdapter::shape(&content, None) {
            RemoteRequest::ResumableUpload {
                title,
                description,
                video_url,
                ..
            } => {
                assert!(title.is_none());
                assert_eq!(description, "behind the scenes");
                assert_eq!(video_url, "https://cdn.example/v.mp4");
            }
            other => panic!("expected ResumableUpload, got {other:?}"),
        }
    }
}
