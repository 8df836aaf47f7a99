//! Core types for Syndica

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The platforms the publishing pipeline can deliver to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformKind {
    Instagram,
    Facebook,
    Twitter,
    LinkedIn,
    TikTok,
    YouTube,
    Pinterest,
}

impl PlatformKind {
    pub const ALL: [PlatformKind; 7] = [
        PlatformKind::Instagram,
        PlatformKind::Facebook,
        PlatformKind::Twitter,
        PlatformKind::LinkedIn,
        PlatformKind::TikTok,
        PlatformKind::YouTube,
        PlatformKind::Pinterest,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformKind::Instagram => "instagram",
            PlatformKind::Facebook => "facebook",
            PlatformKind::Twitter => "twitter",
            PlatformKind::LinkedIn => "linkedin",
            PlatformKind::TikTok => "tiktok",
            PlatformKind::YouTube => "youtube",
            PlatformKind::Pinterest => "pinterest",
        }
    }
}

impl std::fmt::Display for PlatformKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PlatformKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "instagram" => Ok(PlatformKind::Instagram),
            "facebook" => Ok(PlatformKind::Facebook),
            "twitter" | "x" => Ok(PlatformKind::Twitter),
            "linkedin" => Ok(PlatformKind::LinkedIn),
            "tiktok" => Ok(PlatformKind::TikTok),
            "youtube" => Ok(PlatformKind::YouTube),
            "pinterest" => Ok(PlatformKind::Pinterest),
            other => Err(format!("Unknown platform: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Gif,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Gif => "gif",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for MediaKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "image" => Ok(MediaKind::Image),
            "video" => Ok(MediaKind::Video),
            "gif" => Ok(MediaKind::Gif),
            other => Err(format!("Unknown media kind: {other}")),
        }
    }
}

/// One media entry in a post, resolved from the media-asset store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    pub url: String,
    pub kind: MediaKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// Video/gif duration in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<u32>,
}

impl MediaItem {
    pub fn new(url: impl Into<String>, kind: MediaKind) -> Self {
        Self {
            url: url.into(),
            kind,
            thumbnail_url: None,
            alt_text: None,
            width: None,
            height: None,
            duration_secs: None,
        }
    }

    /// width / height when both dimensions are known.
    pub fn aspect_ratio(&self) -> Option<f32> {
        match (self.width, self.height) {
            (Some(w), Some(h)) if h > 0 => Some(w as f32 / h as f32),
            _ => None,
        }
    }
}

/// The platform-agnostic payload of a post.
///
/// Immutable once attached to a `Post`; platform formatting produces derived
/// copies and never mutates the canonical content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishContent {
    pub body: String,
    #[serde(default)]
    pub media: Vec<MediaItem>,
    #[serde(default)]
    pub hashtags: Vec<String>,
    #[serde(default)]
    pub mentions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_comment: Option<String>,
}

impl PublishContent {
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            media: Vec::new(),
            hashtags: Vec::new(),
            mentions: Vec::new(),
            link: None,
            first_comment: None,
        }
    }
}

/// Per-target partial override, merged field-wise onto the base content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<Vec<MediaItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hashtags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mentions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_comment: Option<String>,
}

impl ContentOverride {
    pub fn is_empty(&self) -> bool {
        self == &ContentOverride::default()
    }

    /// Apply this override on top of `base`, field by field.
    pub fn merge_onto(&self, base: &PublishContent) -> PublishContent {
        PublishContent {
            body: self.body.clone().unwrap_or_else(|| base.body.clone()),
            media: self.media.clone().unwrap_or_else(|| base.media.clone()),
            hashtags: self
                .hashtags
                .clone()
                .unwrap_or_else(|| base.hashtags.clone()),
            mentions: self
                .mentions
                .clone()
                .unwrap_or_else(|| base.mentions.clone()),
            link: self.link.clone().or_else(|| base.link.clone()),
            first_comment: self
                .first_comment
                .clone()
                .or_else(|| base.first_comment.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Scheduled,
    Publishing,
    Published,
    Failed,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Scheduled => "scheduled",
            PostStatus::Publishing => "publishing",
            PostStatus::Published => "published",
            PostStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "scheduled" => PostStatus::Scheduled,
            "publishing" => PostStatus::Publishing,
            "published" => PostStatus::Published,
            "failed" => PostStatus::Failed,
            _ => PostStatus::Draft,
        }
    }
}

impl std::fmt::Display for PostStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One (platform, account, optional override) pairing a post is published to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformTarget {
    pub platform: PlatformKind,
    pub account_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_override: Option<ContentOverride>,
}

impl PlatformTarget {
    pub fn new(platform: PlatformKind, account_id: impl Into<String>) -> Self {
        Self {
            platform,
            account_id: account_id.into(),
            content_override: None,
        }
    }

    /// The content this target actually publishes: the base content with any
    /// override merged on top.
    pub fn effective_content(&self, base: &PublishContent) -> PublishContent {
        match &self.content_override {
            Some(o) => o.merge_onto(base),
            None => base.clone(),
        }
    }
}

/// One logical publish intent, delivered to every target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub content: PublishContent,
    pub targets: Vec<PlatformTarget>,
    pub status: PostStatus,
    pub scheduled_at: Option<i64>,
    pub published_at: Option<i64>,
    pub campaign_id: Option<String>,
    pub tags: Vec<String>,
    pub ai_generated: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Post {
    pub fn new(content: PublishContent, targets: Vec<PlatformTarget>) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            id: Uuid::new_v4().to_string(),
            content,
            targets,
            status: PostStatus::Draft,
            scheduled_at: None,
            published_at: None,
            campaign_id: None,
            tags: Vec::new(),
            ai_generated: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Outcome of one adapter call against one platform target. Never discarded:
/// persisted per target so partial failure is auditable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishResult {
    pub id: Option<i64>,
    pub post_id: String,
    pub platform: PlatformKind,
    pub account_id: String,
    pub success: bool,
    pub remote_post_id: Option<String>,
    pub remote_url: Option<String>,
    pub error_message: Option<String>,
    pub completed_at: i64,
}

impl PublishResult {
    pub fn succeeded(
        post_id: &str,
        platform: PlatformKind,
        account_id: &str,
        remote_post_id: String,
        remote_url: String,
    ) -> Self {
        Self {
            id: None,
            post_id: post_id.to_string(),
            platform,
            account_id: account_id.to_string(),
            success: true,
            remote_post_id: Some(remote_post_id),
            remote_url: Some(remote_url),
            error_message: None,
            completed_at: chrono::Utc::now().timestamp(),
        }
    }

    pub fn failed(
        post_id: &str,
        platform: PlatformKind,
        account_id: &str,
        error: String,
    ) -> Self {
        Self {
            id: None,
            post_id: post_id.to_string(),
            platform,
            account_id: account_id.to_string(),
            success: false,
            remote_post_id: None,
            remote_url: None,
            error_message: Some(error),
            completed_at: chrono::Utc::now().timestamp(),
        }
    }
}

/// A connected social account. Credentials are read through the repository;
/// this core never writes them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialAccount {
    pub id: String,
    pub tenant_id: String,
    pub platform: PlatformKind,
    pub display_name: String,
    pub access_token: String,
    pub active: bool,
}

/// A stored media asset as returned by the media lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaAsset {
    pub id: String,
    pub url: String,
    pub kind: MediaKind,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub duration_secs: Option<u32>,
}

impl MediaAsset {
    pub fn to_media_item(&self) -> MediaItem {
        MediaItem {
            url: self.url.clone(),
            kind: self.kind,
            thumbnail_url: None,
            alt_text: None,
            width: self.width,
            height: self.height,
            duration_secs: self.duration_secs,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: String,
    pub name: String,
}
