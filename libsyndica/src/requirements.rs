//! Declarative per-platform publishing constraints
//!
//! Every adapter exposes exactly one of these records; content validation and
//! formatting derive from it alone, so platform limits live in one place.

use crate::types::{MediaKind, PlatformKind};

/// How a platform wants hashtags rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashtagPlacement {
    /// Hashtags stay in their own list, rendered inline by the remote call.
    Inline,
    /// Hashtags are appended to the caption body and the list is cleared.
    AppendToCaption,
    /// The platform treats hashtags as plain keywords; the `#` is stripped.
    StripPrefix,
}

/// Constraint record for one platform.
#[derive(Debug, Clone, PartialEq)]
pub struct PlatformRequirements {
    pub platform: PlatformKind,
    /// Maximum caption/body length in characters.
    pub max_text_length: usize,
    pub max_hashtags: usize,
    pub max_mentions: usize,
    pub max_media: usize,
    /// At least one media item must be attached (video-first platforms).
    pub requires_media: bool,
    pub media_kinds: &'static [MediaKind],
    pub max_image_bytes: u64,
    pub max_video_bytes: u64,
    pub max_video_secs: u32,
    /// Accepted width/height ratio range, inclusive.
    pub min_aspect_ratio: f32,
    pub max_aspect_ratio: f32,
    /// A destination link must be present (Pinterest).
    pub link_required: bool,
    pub supports_first_comment: bool,
    pub supports_native_scheduling: bool,
    pub hashtag_placement: HashtagPlacement,
}

impl PlatformRequirements {
    pub fn supports_media_kind(&self, kind: MediaKind) -> bool {
        self.media_kinds.contains(&kind)
    }
}

const MB: u64 = 1024 * 1024;
const GB: u64 = 1024 * MB;

const ALL_MEDIA: &[MediaKind] = &[MediaKind::Image, MediaKind::Video, MediaKind::Gif];
const IMAGE_VIDEO: &[MediaKind] = &[MediaKind::Image, MediaKind::Video];
const VIDEO_ONLY: &[MediaKind] = &[MediaKind::Video];

pub static INSTAGRAM: PlatformRequirements = PlatformRequirements {
    platform: PlatformKind::Instagram,
    max_text_length: 2200,
    max_hashtags: 30,
    max_mentions: 20,
    max_media: 10,
    requires_media: false,
    media_kinds: IMAGE_VIDEO,
    max_image_bytes: 8 * MB,
    max_video_bytes: 100 * MB,
    max_video_secs: 60,
    min_aspect_ratio: 0.8,
    max_aspect_ratio: 1.91,
    link_required: false,
    supports_first_comment: true,
    supports_native_scheduling: true,
    hashtag_placement: HashtagPlacement::AppendToCaption,
};

pub static FACEBOOK: PlatformRequirements = PlatformRequirements {
    platform: PlatformKind::Facebook,
    max_text_length: 63_206,
    max_hashtags: 30,
    max_mentions: 50,
    max_media: 10,
    requires_media: false,
    media_kinds: ALL_MEDIA,
    max_image_bytes: 10 * MB,
    max_video_bytes: GB,
    max_video_secs: 240 * 60,
    min_aspect_ratio: 0.5625,
    max_aspect_ratio: 1.91,
    link_required: false,
    supports_first_comment: true,
    supports_native_scheduling: true,
    hashtag_placement: HashtagPlacement::Inline,
};

pub static TWITTER: PlatformRequirements = PlatformRequirements {
    platform: PlatformKind::Twitter,
    max_text_length: 280,
    max_hashtags: 10,
    max_mentions: 10,
    max_media: 4,
    requires_media: false,
    media_kinds: ALL_MEDIA,
    max_image_bytes: 5 * MB,
    max_video_bytes: 512 * MB,
    max_video_secs: 140,
    min_aspect_ratio: 0.5,
    max_aspect_ratio: 2.0,
    link_required: false,
    supports_first_comment: false,
    supports_native_scheduling: false,
    hashtag_placement: HashtagPlacement::Inline,
};

pub static LINKEDIN: PlatformRequirements = PlatformRequirements {
    platform: PlatformKind::LinkedIn,
    max_text_length: 3000,
    max_hashtags: 30,
    max_mentions: 20,
    max_media: 9,
    requires_media: false,
    media_kinds: IMAGE_VIDEO,
    max_image_bytes: 8 * MB,
    max_video_bytes: 500 * MB,
    max_video_secs: 600,
    min_aspect_ratio: 0.5625,
    max_aspect_ratio: 2.4,
    link_required: false,
    supports_first_comment: true,
    supports_native_scheduling: false,
    hashtag_placement: HashtagPlacement::Inline,
};

pub static TIKTOK: PlatformRequirements = PlatformRequirements {
    platform: PlatformKind::TikTok,
    max_text_length: 2200,
    max_hashtags: 30,
    max_mentions: 20,
    max_media: 1,
    requires_media: true,
    media_kinds: VIDEO_ONLY,
    max_image_bytes: 0,
    max_video_bytes: 288 * MB,
    max_video_secs: 600,
    min_aspect_ratio: 0.4,
    max_aspect_ratio: 1.0,
    link_required: false,
    supports_first_comment: false,
    supports_native_scheduling: false,
    hashtag_placement: HashtagPlacement::AppendToCaption,
};

pub static YOUTUBE: PlatformRequirements = PlatformRequirements {
    platform: PlatformKind::YouTube,
    max_text_length: 5000,
    max_hashtags: 15,
    max_mentions: 0,
    max_media: 1,
    requires_media: true,
    media_kinds: VIDEO_ONLY,
    max_image_bytes: 0,
    max_video_bytes: 256 * GB,
    max_video_secs: 12 * 3600,
    min_aspect_ratio: 0.5625,
    max_aspect_ratio: 1.7778,
    link_required: false,
    supports_first_comment: false,
    supports_native_scheduling: true,
    hashtag_placement: HashtagPlacement::Inline,
};

pub static PINTEREST: PlatformRequirements = PlatformRequirements {
    platform: PlatformKind::Pinterest,
    max_text_length: 500,
    max_hashtags: 20,
    max_mentions: 0,
    max_media: 1,
    requires_media: false,
    media_kinds: IMAGE_VIDEO,
    max_image_bytes: 20 * MB,
    max_video_bytes: 2 * GB,
    max_video_secs: 300,
    min_aspect_ratio: 0.5,
    max_aspect_ratio: 1.0,
    link_required: true,
    supports_first_comment: false,
    supports_native_scheduling: true,
    hashtag_placement: HashtagPlacement::StripPrefix,
};

/// The requirements record for a platform.
pub fn for_platform(platform: PlatformKind) -> &'static PlatformRequirements {
    match platform {
        PlatformKind::Instagram => &INSTAGRAM,
        PlatformKind::Facebook => &FACEBOOK,
        PlatformKind::Twitter => &TWITTER,
        PlatformKind::LinkedIn => &LINKEDIN,
        PlatformKind::TikTok => &TIKTOK,
        PlatformKind::YouTube => &YOUTUBE,
        PlatformKind::Pinterest => &PINTEREST,
    }
}
