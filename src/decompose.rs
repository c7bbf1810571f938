// src/decompose.rs
//! HTML to chunk-sequence decomposition.
//!
//! Splits a stored block-level HTML document into an ordered sequence of
//! typed, sanitized chunks. Only top-level siblings become chunks; nested
//! structure stays inside a chunk's content. Inline content found outside
//! any block wrapper is coalesced into an implicit paragraph, never dropped.
//!
//! Decomposition never fails: unclassifiable blocks default to text, and
//! input that yields no chunks at all degrades to a single text chunk
//! wrapping the sanitized original string.

use scraper::{ElementRef, Html};

use crate::model::{Chunk, ChunkId, ChunkType};
use crate::sanitize::{escape_text, sanitize_element, sanitize_html};

/// Tags whose top-level occurrence starts a new chunk. Everything else at
/// the top level joins the surrounding inline run.
const BLOCK_TAGS: &[&str] = &[
    "address",
    "article",
    "aside",
    "blockquote",
    "details",
    "div",
    "dl",
    "fieldset",
    "figure",
    "footer",
    "form",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "header",
    "hr",
    "iframe",
    "img",
    "main",
    "nav",
    "ol",
    "p",
    "pre",
    "section",
    "table",
    "ul",
    "video",
];

/// Decompose stored HTML into an ordered chunk sequence.
///
/// Each chunk's content is the sanitized markup of its source node, and
/// each chunk receives a freshly minted id; previously assigned ids are not
/// recovered, every editing session re-derives its own id space.
///
/// Empty or whitespace-only input yields an empty sequence.
#[must_use]
pub fn decompose(html: &str) -> Vec<Chunk> {
    if html.trim().is_empty() {
        return Vec::new();
    }

    let fragment = Html::parse_fragment(html);
    let mut chunks = Vec::new();
    let mut inline_run = String::new();

    for child in fragment.root_element().children() {
        if let Some(text) = child.value().as_text() {
            inline_run.push_str(&escape_text(text));
        } else if let Some(element) = ElementRef::wrap(child) {
            let name = element.value().name();
            if BLOCK_TAGS.contains(&name) {
                flush_inline_run(&mut inline_run, &mut chunks);
                let content = sanitize_element(element);
                if content.trim().is_empty() {
                    log::debug!("decomposer skipped empty <{name}> block");
                    continue;
                }
                chunks.push(Chunk::new(ChunkId::fresh(), classify_block(element), content));
            } else {
                // Inline element between blocks joins the implicit paragraph.
                inline_run.push_str(&sanitize_element(element));
            }
        }
        // Comments and other non-content nodes are dropped.
    }
    flush_inline_run(&mut inline_run, &mut chunks);

    // Input that parsed to nothing usable degrades to one text chunk.
    if chunks.is_empty() {
        let content = sanitize_html(html);
        if !content.trim().is_empty() {
            chunks.push(Chunk::new(ChunkId::fresh(), ChunkType::Text, content));
        }
    }

    chunks
}

/// Wrap a pending inline run into an implicit `<p>` text chunk.
fn flush_inline_run(inline_run: &mut String, chunks: &mut Vec<Chunk>) {
    let trimmed = inline_run.trim();
    if !trimmed.is_empty() {
        let content = sanitize_html(&format!("<p>{trimmed}</p>"));
        chunks.push(Chunk::new(ChunkId::fresh(), ChunkType::Text, content));
    }
    inline_run.clear();
}

/// Classify a top-level block element via tag and class heuristics.
///
/// The mapping follows the editor's rendering affordances; anything the
/// table does not recognize is treated as plain text rather than failing.
fn classify_block(element: ElementRef) -> ChunkType {
    match element.value().name() {
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => ChunkType::Heading,
        "img" => ChunkType::Image,
        "video" | "iframe" => ChunkType::Video,
        "figure" => figure_kind(element),
        "ul" | "ol" | "dl" => ChunkType::List,
        "blockquote" => ChunkType::Quote,
        "aside" => ChunkType::Callout,
        "table" => ChunkType::Table,
        "div" => div_kind(element),
        "p" | "pre" | "address" | "article" | "section" | "main" | "header" | "footer" | "nav"
        | "form" | "details" | "fieldset" | "hr" => ChunkType::Text,
        other => {
            log::debug!("decomposer classified unrecognized <{other}> as text");
            ChunkType::Text
        }
    }
}

/// A figure classifies by the first media element it wraps.
fn figure_kind(figure: ElementRef) -> ChunkType {
    for descendant in figure.descendants() {
        if let Some(element) = ElementRef::wrap(descendant) {
            match element.value().name() {
                "video" | "iframe" => return ChunkType::Video,
                "img" => return ChunkType::Image,
                _ => {}
            }
        }
    }
    ChunkType::Text
}

/// A div classifies by its class list: embedded players and callout-style
/// note boxes are recognized, everything else is plain text.
fn div_kind(div: ElementRef) -> ChunkType {
    let class = div.value().attr("class").unwrap_or("").to_ascii_lowercase();
    if class.contains("video-embed") || class.contains("video_embed") {
        ChunkType::Video
    } else if class.contains("callout") || class.contains("note") || class.contains("alert") {
        ChunkType::Callout
    } else {
        ChunkType::Text
    }
}
