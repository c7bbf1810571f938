// src/serialize.rs
//! Chunk-sequence to HTML serialization.
//!
//! The serializer is the inverse of decomposition up to chunk identity:
//! `decompose(serialize(chunks))` yields the same type sequence and the
//! same per-position content, with regenerated ids.

use crate::model::Chunk;

/// Concatenate chunk contents into a single HTML document string.
///
/// No separators, wrappers or additional sanitization are applied; content
/// is already sanitized by the time it reaches a [`Chunk`], so the
/// serializer performs no security-relevant work. An empty sequence yields
/// an empty string.
#[must_use]
pub fn serialize(chunks: &[Chunk]) -> String {
    let mut html = String::with_capacity(chunks.iter().map(|c| c.content.len()).sum());
    for chunk in chunks {
        html.push_str(&chunk.content);
    }
    html
}
