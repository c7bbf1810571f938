// src/embed.rs
//! Local media transforms.
//!
//! Video insertion is a pure local transform, not a network call: a URL
//! matching a known video host rewrites into an embeddable player fragment,
//! anything else becomes a plain-text fallback paragraph. Image URLs wrap
//! into a `<figure>` fragment. Every produced fragment passes through the
//! sanitizer before it is handed to the editing session.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::ChunkType;
use crate::sanitize::{escape_attr, escape_text, sanitize_html};

/// YouTube watch/short/embed URLs, capturing the video id.
static YOUTUBE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:youtube\.com/(?:watch\?(?:[^#\s]*&)?v=|embed/|shorts/)|youtu\.be/)([A-Za-z0-9_-]{6,})",
    )
    .expect("valid regex")
});

/// Vimeo video URLs, capturing the numeric id.
static VIMEO_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)vimeo\.com/(?:video/)?(\d+)").expect("valid regex"));

/// Rewrite a video URL into an insertable fragment.
///
/// Recognized hosts yield a ([`ChunkType::Video`], player fragment) pair;
/// any other URL yields a ([`ChunkType::Text`], plain paragraph) fallback so
/// the operator's input is never silently dropped.
#[must_use]
pub fn video_embed_fragment(url: &str) -> (ChunkType, String) {
    if let Some(embed_url) = player_url_for(url) {
        let fragment = format!(
            "<div class=\"video-embed\"><iframe src=\"{embed_url}\" title=\"Video player\" allowfullscreen=\"\"></iframe></div>"
        );
        (ChunkType::Video, sanitize_html(&fragment))
    } else {
        log::debug!("unrecognized video host, inserting plain-text fallback: {url}");
        let fallback = format!("<p>{}</p>", escape_text(url));
        (ChunkType::Text, sanitize_html(&fallback))
    }
}

/// Wrap an image URL (for example one returned by the image generation
/// collaborator) into a sanitized figure fragment.
#[must_use]
pub fn image_figure_fragment(url: &str, caption: Option<&str>) -> String {
    // Attribute values are escaped before the fragment is assembled; the
    // caption and URL come from outside and must not be able to close the
    // attribute and smuggle in their own elements.
    let mut fragment = format!(
        "<figure><img src=\"{}\" alt=\"{}\">",
        escape_attr(url),
        caption.map(escape_attr).unwrap_or_default()
    );
    if let Some(caption) = caption {
        fragment.push_str("<figcaption>");
        fragment.push_str(&escape_text(caption));
        fragment.push_str("</figcaption>");
    }
    fragment.push_str("</figure>");
    sanitize_html(&fragment)
}

/// Map a known video-host URL to its embeddable player URL.
fn player_url_for(url: &str) -> Option<String> {
    if let Some(captures) = YOUTUBE_RE.captures(url) {
        return Some(format!("https://www.youtube.com/embed/{}", &captures[1]));
    }
    if let Some(captures) = VIMEO_RE.captures(url) {
        return Some(format!("https://player.vimeo.com/video/{}", &captures[1]));
    }
    None
}
