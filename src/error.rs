//! Error types for chunk editing operations.
//!
//! Pure functions in this crate (decomposition, serialization, sanitization)
//! never fail; they degrade to safe defaults instead. Errors are reserved for
//! misuse of the regeneration coordinator and for failures reported by the
//! external generation collaborators.

use thiserror::Error;

use crate::model::{ChunkId, ChunkType};

/// Error types that can occur while coordinating chunk regeneration or
/// talking to external generation services.
///
/// # Examples
///
/// ```rust,ignore
/// use html_chunker::{ChunkError, EditorSession, Regenerator};
///
/// match regenerator.begin(&session, &id, None, 0.7) {
///     Ok(request) => send(request),
///     Err(ChunkError::RegenerationInFlight(id)) => {
///         eprintln!("chunk {id} already has a pending regeneration");
///     }
///     Err(e) => eprintln!("regeneration rejected: {e}"),
/// }
/// ```
#[derive(Error, Debug)]
pub enum ChunkError {
    /// The target chunk id is not present in the current document.
    #[error("chunk not found: {0}")]
    ChunkNotFound(ChunkId),

    /// A regeneration request for the same chunk id is already outstanding.
    ///
    /// At most one request per chunk may be in flight; a second request must
    /// wait for the first to complete.
    #[error("regeneration already in flight for chunk {0}")]
    RegenerationInFlight(ChunkId),

    /// The chunk's type is not eligible for AI regeneration.
    ///
    /// Only text, heading, list and quote chunks can be regenerated.
    #[error("chunk type '{0}' does not support regeneration")]
    NotRegenerable(ChunkType),

    /// The external generation service failed or returned an unusable
    /// response. The document is left unmodified.
    #[error("generation service error: {0}")]
    Generation(String),
}

/// Type alias for [`Result<T, ChunkError>`].
pub type Result<T> = std::result::Result<T, ChunkError>;
