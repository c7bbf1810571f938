// src/lib.rs
//! # HTML Chunker
//!
//! A chunk-based editing model for rich HTML lesson content. A stored HTML
//! document decomposes into an ordered sequence of typed, independently
//! editable chunks; edits and per-chunk AI regeneration mutate the sequence
//! through a single owning session; serialization concatenates the chunks
//! back into one HTML string for storage.
//!
//! ## Features
//!
//! - **Decomposition**: top-level block classification (heading, image,
//!   video, list, quote, callout, table, text) with inline runs coalesced
//!   into implicit paragraphs; malformed input degrades, never fails
//! - **Sanitization**: a tree-based HTML-fragment profile and a
//!   pattern-based SVG profile, both idempotent and panic-free
//! - **Session editing**: insert/update/delete/move with whole-sequence
//!   atomic swaps and sanitize-on-write
//! - **Regeneration**: per-chunk async state machine with neighbor-context
//!   snapshots and a stale-response guard
//!
//! ## Quick Start
//!
//! ```rust
//! use html_chunker::{EditorSession, ChunkType};
//!
//! let mut session = EditorSession::open("<h1>Photosynthesis</h1><p>Plants make food.</p>");
//! assert_eq!(session.chunks()[0].chunk_type, ChunkType::Heading);
//!
//! let anchor = session.chunks()[1].id.clone();
//! session.insert_after(Some(&anchor), ChunkType::Text, "<p>They use sunlight.</p>");
//!
//! let html = session.to_html();
//! assert!(html.contains("They use sunlight."));
//! ```

pub mod decompose;
pub mod embed;
pub mod error;
pub mod model;
pub mod regen;
pub mod sanitize;
pub mod serialize;
pub mod session;

pub use decompose::decompose;
pub use embed::{image_figure_fragment, video_embed_fragment};
pub use error::{ChunkError, Result};
pub use model::{Chunk, ChunkId, ChunkType};
pub use regen::{
    insert_generated_image, GenerationResponse, GenerationService, ImageGenerationRequest,
    ImageGenerationResponse, ImageGenerationService, RegenFocus, RegenOutcome, RegenerationRequest,
    Regenerator, SurroundingContext,
};
pub use sanitize::{sanitize_html, sanitize_svg};
pub use serialize::serialize;
pub use session::{EditorSession, MoveDirection};
