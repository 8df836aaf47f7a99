//! Platform-neutral content validation and formatting
//!
//! Both functions are pure and derive every rule from a
//! [`PlatformRequirements`] record, so no platform literal lives anywhere
//! else. `validate` reports violations without touching the content;
//! `format` coerces content into compliance deterministically.

use crate::requirements::{HashtagPlacement, PlatformRequirements};
use crate::types::{MediaKind, PublishContent};

/// Check `content` against a platform's declared requirements.
///
/// Returns one human-readable message per violation; an empty list means the
/// content is publishable as-is. Length checks count characters, not bytes.
pub fn validate(content: &PublishContent, reqs: &PlatformRequirements) -> Vec<String> {
    let mut errors = Vec::new();
    let platform = reqs.platform;

    let text_len = content.body.chars().count();
    if text_len > reqs.max_text_length {
        errors.push(format!(
            "{platform}: text is {text_len} characters, limit is {}",
            reqs.max_text_length
        ));
    }

    if content.hashtags.len() > reqs.max_hashtags {
        errors.push(format!(
            "{platform}: {} hashtags, limit is {}",
            content.hashtags.len(),
            reqs.max_hashtags
        ));
    }

    if content.mentions.len() > reqs.max_mentions {
        errors.push(format!(
            "{platform}: {} mentions, limit is {}",
            content.mentions.len(),
            reqs.max_mentions
        ));
    }

    if reqs.requires_media && content.media.is_empty() {
        errors.push(format!("{platform}: at least one media item is required"));
    }

    if content.media.len() > reqs.max_media {
        errors.push(format!(
            "{platform}: {} media items, limit is {}",
            content.media.len(),
            reqs.max_media
        ));
    }

    for item in &content.media {
        if !reqs.supports_media_kind(item.kind) {
            errors.push(format!("{platform}: media kind '{}' not supported", item.kind));
        }

        if matches!(item.kind, MediaKind::Video) {
            if let Some(duration) = item.duration_secs {
                if duration > reqs.max_video_secs {
                    errors.push(format!(
                        "{platform}: video is {duration}s, limit is {}s",
                        reqs.max_video_secs
                    ));
                }
            }
        }

        // Dimensions are optional metadata; only enforce the ratio when known
        if let Some(ratio) = item.aspect_ratio() {
            if ratio < reqs.min_aspect_ratio || ratio > reqs.max_aspect_ratio {
                errors.push(format!(
                    "{platform}: aspect ratio {ratio:.2} outside {:.2}..{:.2}",
                    reqs.min_aspect_ratio, reqs.max_aspect_ratio
                ));
            }
        }
    }

    if reqs.link_required && content.link.is_none() {
        errors.push(format!("{platform}: a destination link is required"));
    }

    if content.first_comment.is_some() && !reqs.supports_first_comment {
        errors.push(format!("{platform}: first comment is not supported"));
    }

    errors
}

/// Coerce `content` into compliance with a platform's requirements.
///
/// Trims over-limit hashtag/mention/media lists, applies the platform's
/// hashtag placement, then truncates the body at a word boundary. Idempotent:
/// formatting already-formatted content returns it unchanged.
pub fn format(content: &PublishContent, reqs: &PlatformRequirements) -> PublishContent {
    let mut out = content.clone();

    out.hashtags.truncate(reqs.max_hashtags);
    out.mentions.truncate(reqs.max_mentions);
    out.media.truncate(reqs.max_media);

    match reqs.hashtag_placement {
        HashtagPlacement::Inline => {}
        HashtagPlacement::AppendToCaption => {
            // Hashtags move into the caption and the list is emptied, so a
            // second pass has nothing left to append.
            if !out.hashtags.is_empty() {
                let rendered = out
                    .hashtags
                    .iter()
                    .map(|t| with_hash_prefix(t))
                    .collect::<Vec<_>>()
                    .join(" ");
                if out.body.is_empty() {
                    out.body = rendered;
                } else {
                    out.body = format!("{}\n\n{}", out.body, rendered);
                }
                out.hashtags.clear();
            }
        }
        HashtagPlacement::StripPrefix => {
            for tag in &mut out.hashtags {
                if let Some(stripped) = tag.strip_prefix('#') {
                    *tag = stripped.to_string();
                }
            }
        }
    }

    out.body = truncate_at_word_boundary(&out.body, reqs.max_text_length);

    out
}

/// Prefix a hashtag token with `#` unless it already carries one.
fn with_hash_prefix(tag: &str) -> String {
    if tag.starts_with('#') {
        tag.to_string()
    } else {
        format!("#{tag}")
    }
}

/// Cut `text` to at most `max_chars` characters, preferring the last
/// whitespace boundary before the limit. Falls back to a hard cut when the
/// first word alone exceeds the limit.
pub fn truncate_at_word_boundary(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let hard_cut: String = text.chars().take(max_chars).collect();
    match hard_cut.rfind(char::is_whitespace) {
        Some(idx) if idx > 0 => hard_cut[..idx].trim_end().to_string(),
        _ => hard_cut,
    }
}
