//! Instagram adapter
//!
//! Formatting has already moved hashtags into the caption, so the remote
//! shapes carry the caption verbatim. Multi-media posts go out as a carousel
//! container, single media as one container.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::error::Result;
use crate::requirements::{self, PlatformRequirements};
use crate::types::{PlatformKind, PublishContent, SocialAccount};

use super::client::{RemotePost, RemoteRequest};
use super::{AdapterCore, PlatformAdapter};

pub struct InstagramAdapter {
    core: Arc<AdapterCore>,
}

impl InstagramAdapter {
    pub fn new(core: Arc<AdapterCore>) -> Self {
        Self { core }
    }

    fn shape(content: &PublishContent, scheduled_at: Option<i64>) -> RemoteRequest {
        if content.media.len() > 1 {
            RemoteRequest::Carousel {
                caption: content.body.clone(),
                media_urls: content.media.iter().map(|m| m.url.clone()).collect(),
                first_comment: content.first_comment.clone(),
                scheduled_at,
            }
        } else {
            RemoteRequest::SingleContainer {
                caption: content.body.clone(),
                media_url: content.media.first().map(|m| m.url.clone()),
                link: None,
                first_comment: content.first_comment.clone(),
                scheduled_at,
            }
        }
    }
}

#[async_trait]
impl PlatformAdapter for InstagramAdapter {
    fn kind(&self) -> PlatformKind {
        PlatformKind::Instagram
    }

    fn requirements(&self) -> &'static PlatformRequirements {
        &requirements::INSTAGRAM
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
    fn test_single_media_shape() {
        let mut content = PublishContent::text("sunset");
        content.media = vec![MediaItem::new("https://cdn.example/a.jpg", MediaKind::Image)];
        content.first_comment = Some("link in bio".to_string());

        match InstagramAdapter::shape(&content, None) {
            RemoteRequest::SingleContainer {
                caption,
                media_url,
                first_comment,
                ..
            } => {
                assert_eq!(caption, "sunset");
                assert_eq!(media_url.as_deref(), Some("https://cdn.example/a.jpg"));
                assert_eq!(first_comment.as_deref(), Some("link in bio"));
            }
            other => panic!("expected SingleContainer, got {other:?}"),
        }
    }

    #[test]
    fn test_multi_media_becomes_carousel() {
        let mut content = PublishContent::text("album");
        content.media = vec![
            MediaItem::new("https://cdn.example/a.jpg", MediaKind::Image),
            MediaItem::new("https://cdn.example/b.jpg", MediaKind::Image),
        ];

        match InstagramAdapter::shape(&content, Some(1_800_000_000)) {
            RemoteRequest::Carousel {
                media_urls,
                scheduled_at,
                ..
            } => {
                assert_eq!(media_urls.len(), 2);
                assert_eq!(scheduled_at, Some(1_800_000_000));
            }
            other => panic!("expected Carousel, got {other:?}"),
        }
    }
}
