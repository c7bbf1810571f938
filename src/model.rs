// src/model.rs

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Closed set of chunk types.
///
/// The type determines editing affordances (for example, only text-like
/// chunks are eligible for AI regeneration); it never affects whether a
/// chunk renders. Unrecognized source markup classifies as [`ChunkType::Text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkType {
    Text,
    Heading,
    Image,
    Video,
    List,
    Quote,
    Callout,
    Table,
}

impl ChunkType {
    /// Stable lowercase name, matching the serialized wire form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Heading => "heading",
            Self::Image => "image",
            Self::Video => "video",
            Self::List => "list",
            Self::Quote => "quote",
            Self::Callout => "callout",
            Self::Table => "table",
        }
    }

    /// Whether chunks of this type may be rewritten by the generation
    /// service. Media and structural chunks are edited manually instead.
    #[must_use]
    pub const fn supports_regeneration(self) -> bool {
        matches!(self, Self::Text | Self::Heading | Self::List | Self::Quote)
    }
}

impl fmt::Display for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Millisecond timestamp captured once per process, so ids minted by
/// different sessions are unlikely to collide even across restarts.
static ID_EPOCH: Lazy<String> = Lazy::new(|| {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    format!("{millis:x}")
});

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque chunk identifier, unique within a document.
///
/// The id is stable across edits that do not replace the chunk's identity:
/// moves, content updates and regenerations all preserve it. Deleting a
/// chunk retires its id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChunkId(String);

impl ChunkId {
    /// Mint a fresh id. A process-wide monotone counter combined with a
    /// per-process timestamp guarantees two ids minted in the same session
    /// never collide.
    #[must_use]
    pub fn fresh() -> Self {
        let n = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        Self(format!("chunk-{}-{n}", &*ID_EPOCH))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChunkId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ChunkId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// One typed, independently editable unit of an HTML document.
///
/// `content` is a self-contained HTML fragment that has already passed the
/// sanitizer by the time it is stored here; the decomposer and the editing
/// session both sanitize before constructing a chunk. Equality is
/// structural over all three fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    #[serde(rename = "type")]
    pub chunk_type: ChunkType,
    pub content: String,
}

impl Chunk {
    /// Construct a chunk. All mutation goes through the editing session so
    /// document invariants are enforced in one place.
    #[must_use]
    pub fn new(id: ChunkId, chunk_type: ChunkType, content: impl Into<String>) -> Self {
        Self {
            id,
            chunk_type,
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_fresh_ids_never_collide() {
        let ids: HashSet<ChunkId> = (0..1000).map(|_| ChunkId::fresh()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_chunk_equality_is_structural() {
        let a = Chunk::new(ChunkId::from("x1"), ChunkType::Text, "<p>hi</p>");
        let b = Chunk::new(ChunkId::from("x1"), ChunkType::Text, "<p>hi</p>");
        let c = Chunk::new(ChunkId::from("x2"), ChunkType::Text, "<p>hi</p>");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_regeneration_eligibility() {
        assert!(ChunkType::Text.supports_regeneration());
        assert!(ChunkType::Heading.supports_regeneration());
        assert!(ChunkType::List.supports_regeneration());
        assert!(ChunkType::Quote.supports_regeneration());
        assert!(!ChunkType::Image.supports_regeneration());
        assert!(!ChunkType::Video.supports_regeneration());
        assert!(!ChunkType::Callout.supports_regeneration());
        assert!(!ChunkType::Table.supports_regeneration());
    }

    #[test]
    fn test_chunk_type_serializes_lowercase() {
        let json = serde_json::to_string(&ChunkType::Heading).unwrap();
        assert_eq!(json, "\"heading\"");
    }

    #[test]
    fn test_chunk_serializes_with_type_key() {
        let chunk = Chunk::new(ChunkId::from("c1"), ChunkType::Quote, "<blockquote>q</blockquote>");
        let json = serde_json::to_value(&chunk).unwrap();
        assert_eq!(json["id"], "c1");
        assert_eq!(json["type"], "quote");
        assert_eq!(json["content"], "<blockquote>q</blockquote>");
    }
}
