// src/session.rs
//! The editing session: owner of one live chunk document.
//!
//! An [`EditorSession`] owns the ordered chunk sequence for the duration of
//! one editing session and is the only place chunks mutate, so the document
//! invariants (unique ids, sanitized non-empty content, no tombstones) are
//! enforced in one place. Mutations run under the session's exclusive
//! borrow, so a reader can never observe a half-applied document; two
//! operations issued in the same tick apply in call order.
//!
//! The session is a single-owner value, never shared across sessions: the
//! model assumes one operator with one open document, not collaborative
//! editing.

use crate::decompose::decompose;
use crate::embed::{image_figure_fragment, video_embed_fragment};
use crate::model::{Chunk, ChunkId, ChunkType};
use crate::sanitize::sanitize_html;
use crate::serialize::serialize;

/// Sanitized content for a new or updated chunk. Content that sanitizes
/// away entirely normalizes to an empty paragraph, so a chunk the operator
/// sees never serializes to nothing and silently vanishes on reopen.
fn sanitized_content(html: &str) -> String {
    let content = sanitize_html(html);
    if content.trim().is_empty() {
        "<p></p>".to_string()
    } else {
        content
    }
}

/// Direction for [`EditorSession::move_chunk`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
}

/// One editing session over one chunk document.
#[derive(Debug, Clone, Default)]
pub struct EditorSession {
    chunks: Vec<Chunk>,
}

impl EditorSession {
    /// Open a session by decomposing stored HTML. Malformed input degrades
    /// rather than failing; empty input opens a zero-chunk session.
    #[must_use]
    pub fn open(html: &str) -> Self {
        Self {
            chunks: decompose(html),
        }
    }

    /// Build a session from a prepared chunk sequence.
    ///
    /// Content is assumed already sanitized (it normally comes from the
    /// decomposer or from another session).
    #[must_use]
    pub fn from_chunks(chunks: Vec<Chunk>) -> Self {
        debug_assert!(
            {
                let mut ids: Vec<&ChunkId> = chunks.iter().map(|c| &c.id).collect();
                ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
                ids.windows(2).all(|w| w[0] != w[1])
            },
            "chunk ids must be unique within a document"
        );
        Self { chunks }
    }

    /// The live chunk sequence, in document order.
    #[must_use]
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: &ChunkId) -> bool {
        self.position_of(id).is_some()
    }

    #[must_use]
    pub fn get(&self, id: &ChunkId) -> Option<&Chunk> {
        self.position_of(id).map(|index| &self.chunks[index])
    }

    /// Sequence index of a chunk; position is the sole layout signal.
    #[must_use]
    pub fn position_of(&self, id: &ChunkId) -> Option<usize> {
        self.chunks.iter().position(|chunk| &chunk.id == id)
    }

    /// Serialize the current document for the storage collaborator.
    #[must_use]
    pub fn to_html(&self) -> String {
        serialize(&self.chunks)
    }

    /// Insert a new chunk with fresh id and sanitized content. Content
    /// that sanitizes away entirely becomes an empty paragraph.
    ///
    /// Placement: immediately after `anchor`, at the front when `anchor` is
    /// `None`, and at the end when the anchor id is not present (the
    /// documented fallback for a stale anchor).
    pub fn insert_after(
        &mut self,
        anchor: Option<&ChunkId>,
        chunk_type: ChunkType,
        html: &str,
    ) -> ChunkId {
        let chunk = Chunk::new(ChunkId::fresh(), chunk_type, sanitized_content(html));
        let id = chunk.id.clone();

        let index = match anchor {
            None => 0,
            Some(anchor_id) => match self.position_of(anchor_id) {
                Some(position) => position + 1,
                None => {
                    log::debug!("insert anchor {anchor_id} not found, appending at end");
                    self.chunks.len()
                }
            },
        };

        self.chunks.insert(index, chunk);
        id
    }

    /// Replace a chunk's content with sanitized `html`, preserving its id
    /// and type. Content that sanitizes away entirely becomes an empty
    /// paragraph rather than a chunk that would vanish on save. Returns
    /// `false` (and mutates nothing) if the id is absent.
    pub fn update(&mut self, id: &ChunkId, html: &str) -> bool {
        let Some(index) = self.position_of(id) else {
            log::debug!("update target {id} not found");
            return false;
        };
        self.chunks[index].content = sanitized_content(html);
        true
    }

    /// Remove a chunk outright; no tombstone remains. Returns `false` if
    /// the id is absent.
    pub fn delete(&mut self, id: &ChunkId) -> bool {
        let Some(index) = self.position_of(id) else {
            log::debug!("delete target {id} not found");
            return false;
        };
        self.chunks.remove(index);
        true
    }

    /// Swap a chunk with its immediate neighbor. Boundary moves (first
    /// chunk up, last chunk down) and missing ids are no-ops returning
    /// `false`.
    pub fn move_chunk(&mut self, id: &ChunkId, direction: MoveDirection) -> bool {
        let Some(index) = self.position_of(id) else {
            log::debug!("move target {id} not found");
            return false;
        };
        let neighbor = match direction {
            MoveDirection::Up => {
                if index == 0 {
                    return false;
                }
                index - 1
            }
            MoveDirection::Down => {
                if index + 1 >= self.chunks.len() {
                    return false;
                }
                index + 1
            }
        };
        self.chunks.swap(index, neighbor);
        true
    }

    /// Insert a video chunk from a URL. Recognized hosts become a player
    /// embed; anything else becomes a plain-text paragraph so the input is
    /// never lost. Pure local transform, no network call.
    pub fn insert_video_embed(&mut self, anchor: Option<&ChunkId>, url: &str) -> ChunkId {
        let (chunk_type, fragment) = video_embed_fragment(url);
        self.insert_after(anchor, chunk_type, &fragment)
    }

    /// Insert an image chunk wrapping `url` in a figure fragment.
    pub fn insert_image_figure(
        &mut self,
        anchor: Option<&ChunkId>,
        url: &str,
        caption: Option<&str>,
    ) -> ChunkId {
        let fragment = image_figure_fragment(url, caption);
        self.insert_after(anchor, ChunkType::Image, &fragment)
    }
}
