// src/regen.rs
//! Per-chunk asynchronous regeneration.
//!
//! Drives the "ask an external service to rewrite this chunk" flow. Each
//! chunk moves Idle → Requesting → {Applied, Failed} → Idle; the
//! [`Regenerator`] tracks which ids are Requesting and rejects a second
//! request for the same id while one is outstanding.
//!
//! There is no cancellation primitive. The only protection against a
//! delayed response clobbering newer state is the staleness guard in
//! [`Regenerator::complete`]: a response whose target chunk no longer
//! exists is discarded, never applied. This is an explicit membership
//! check, not an ordering assumption.

use std::collections::HashSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{ChunkError, Result};
use crate::model::{ChunkId, ChunkType};
use crate::session::EditorSession;

/// Optional steer for the generation service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegenFocus {
    Simplify,
    Elaborate,
    Rephrase,
}

/// Snapshots of the neighboring chunks' content, captured when the request
/// is created. They are not re-fetched if the neighbors change while the
/// request is in flight.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SurroundingContext {
    pub before: String,
    pub after: String,
}

/// One regeneration request, snapshotted at creation time.
///
/// Serializes to the generation service's wire shape; `chunk_id` is
/// coordinator-side bookkeeping and stays off the wire.
#[derive(Debug, Clone, Serialize)]
pub struct RegenerationRequest {
    #[serde(skip)]
    pub chunk_id: ChunkId,
    #[serde(rename = "content")]
    pub source_content: String,
    #[serde(rename = "type")]
    pub chunk_type: ChunkType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus: Option<RegenFocus>,
    /// Sampling temperature, clamped to `[0, 1]`.
    pub temperature: f32,
    pub subtopic_name: String,
    pub surrounding_context: SurroundingContext,
}

/// Generation service response. `success: false` or a missing `content` is
/// treated as failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResponse {
    pub success: bool,
    #[serde(default)]
    pub content: Option<String>,
}

/// Image generation collaborator request.
#[derive(Debug, Clone, Serialize)]
pub struct ImageGenerationRequest {
    pub prompt: String,
}

/// Image generation collaborator response. `success: false` or a missing
/// `image_url` is treated as failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageGenerationResponse {
    pub success: bool,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// External service that produces regenerated chunk content.
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Produce replacement markup for the chunk described by `request`.
    ///
    /// # Errors
    ///
    /// Returns [`ChunkError::Generation`] on transport-level failure.
    /// Semantic failure is expressed in-band via `success: false`.
    async fn regenerate(&self, request: &RegenerationRequest) -> Result<GenerationResponse>;
}

/// External service that produces a new image from a prompt.
#[async_trait]
pub trait ImageGenerationService: Send + Sync {
    /// # Errors
    ///
    /// Returns [`ChunkError::Generation`] on transport-level failure.
    async fn generate_image(&self, request: &ImageGenerationRequest)
        -> Result<ImageGenerationResponse>;
}

/// Outcome of completing one regeneration request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegenOutcome {
    /// The chunk's content was replaced in place; id and type are unchanged.
    Applied,
    /// The target chunk no longer exists; the response was discarded
    /// silently (the stale-response guard).
    Discarded,
    /// The service reported failure; the original content is untouched.
    Failed(String),
}

/// Coordinates per-chunk regeneration against one editing session.
#[derive(Debug, Default)]
pub struct Regenerator {
    subtopic_name: String,
    in_flight: HashSet<ChunkId>,
}

impl Regenerator {
    /// Create a coordinator for content belonging to the named subtopic.
    /// The name rides along on every service request for prompt context.
    #[must_use]
    pub fn new(subtopic_name: impl Into<String>) -> Self {
        Self {
            subtopic_name: subtopic_name.into(),
            in_flight: HashSet::new(),
        }
    }

    /// Whether a regeneration request for `id` is currently outstanding.
    #[must_use]
    pub fn is_in_flight(&self, id: &ChunkId) -> bool {
        self.in_flight.contains(id)
    }

    /// Enter the Requesting state for `id` and capture the request
    /// snapshot, including the neighbors' content at this instant.
    ///
    /// # Errors
    ///
    /// - [`ChunkError::ChunkNotFound`] if `id` is not in the document.
    /// - [`ChunkError::NotRegenerable`] for media/structural chunk types.
    /// - [`ChunkError::RegenerationInFlight`] if a request for the same id
    ///   is already outstanding.
    pub fn begin(
        &mut self,
        session: &EditorSession,
        id: &ChunkId,
        focus: Option<RegenFocus>,
        temperature: f32,
    ) -> Result<RegenerationRequest> {
        let Some(index) = session.position_of(id) else {
            return Err(ChunkError::ChunkNotFound(id.clone()));
        };
        let chunks = session.chunks();
        let chunk = &chunks[index];

        if !chunk.chunk_type.supports_regeneration() {
            return Err(ChunkError::NotRegenerable(chunk.chunk_type));
        }
        if !self.in_flight.insert(id.clone()) {
            return Err(ChunkError::RegenerationInFlight(id.clone()));
        }

        let surrounding_context = SurroundingContext {
            before: index
                .checked_sub(1)
                .map(|i| chunks[i].content.clone())
                .unwrap_or_default(),
            after: chunks.get(index + 1).map(|c| c.content.clone()).unwrap_or_default(),
        };

        Ok(RegenerationRequest {
            chunk_id: id.clone(),
            source_content: chunk.content.clone(),
            chunk_type: chunk.chunk_type,
            focus,
            temperature: temperature.clamp(0.0, 1.0),
            subtopic_name: self.subtopic_name.clone(),
            surrounding_context,
        })
    }

    /// Leave the Requesting state and apply or discard the response.
    ///
    /// The staleness guard runs first: if the chunk was deleted while the
    /// request was in flight, the response is discarded without touching
    /// the document, so a deleted chunk can never be resurrected. Failure
    /// responses also leave the document untouched.
    pub fn complete(
        &mut self,
        session: &mut EditorSession,
        request: &RegenerationRequest,
        response: &GenerationResponse,
    ) -> RegenOutcome {
        self.in_flight.remove(&request.chunk_id);

        if !session.contains(&request.chunk_id) {
            log::debug!(
                "discarding stale regeneration response for deleted chunk {}",
                request.chunk_id
            );
            return RegenOutcome::Discarded;
        }

        match (&response.content, response.success) {
            (Some(content), true) => {
                session.update(&request.chunk_id, content);
                RegenOutcome::Applied
            }
            (None, true) => RegenOutcome::Failed("generation response missing content".to_string()),
            _ => RegenOutcome::Failed("generation service reported failure".to_string()),
        }
    }

    /// Drive one regeneration end to end: snapshot, service call, guarded
    /// apply. The calling context suspends only at the service call.
    ///
    /// # Errors
    ///
    /// Everything [`begin`](Self::begin) rejects, plus
    /// [`ChunkError::Generation`] when the service call itself fails; in
    /// that case the Requesting mark is cleared and the document is left
    /// unmodified.
    pub async fn regenerate(
        &mut self,
        session: &mut EditorSession,
        service: &dyn GenerationService,
        id: &ChunkId,
        focus: Option<RegenFocus>,
        temperature: f32,
    ) -> Result<RegenOutcome> {
        let request = self.begin(session, id, focus, temperature)?;
        match service.regenerate(&request).await {
            Ok(response) => Ok(self.complete(session, &request, &response)),
            Err(error) => {
                self.in_flight.remove(&request.chunk_id);
                Err(error)
            }
        }
    }
}

/// Ask the image collaborator for a new image and insert it as a figure
/// chunk after `anchor`.
///
/// # Errors
///
/// Returns [`ChunkError::Generation`] if the service fails or returns no
/// URL; the document is left unmodified in that case.
pub async fn insert_generated_image(
    session: &mut EditorSession,
    service: &dyn ImageGenerationService,
    anchor: Option<&ChunkId>,
    prompt: &str,
) -> Result<ChunkId> {
    let request = ImageGenerationRequest {
        prompt: prompt.to_string(),
    };
    let response = service.generate_image(&request).await?;
    match (response.image_url, response.success) {
        (Some(url), true) => Ok(session.insert_image_figure(anchor, &url, Some(prompt))),
        _ => Err(ChunkError::Generation(
            "image generation reported failure".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_session() -> EditorSession {
        EditorSession::open("<p>alpha</p><h2>beta</h2><img src=\"x.png\">")
    }

    #[test]
    fn test_begin_snapshots_neighbor_context() {
        let session = open_session();
        let mut regenerator = Regenerator::new("Fractions");
        let id = session.chunks()[1].id.clone();

        let request = regenerator.begin(&session, &id, None, 0.5).unwrap();
        assert_eq!(request.surrounding_context.before, "<p>alpha</p>");
        assert_eq!(request.surrounding_context.after, "<img src=\"x.png\">");
        assert_eq!(request.chunk_type, ChunkType::Heading);
        assert_eq!(request.subtopic_name, "Fractions");
    }

    #[test]
    fn test_begin_clamps_temperature() {
        let session = open_session();
        let mut regenerator = Regenerator::new("t");
        let id = session.chunks()[0].id.clone();
        let request = regenerator.begin(&session, &id, None, 3.5).unwrap();
        assert_eq!(request.temperature, 1.0);
    }

    #[test]
    fn test_begin_rejects_missing_chunk() {
        let session = open_session();
        let mut regenerator = Regenerator::new("t");
        let result = regenerator.begin(&session, &ChunkId::from("gone"), None, 0.5);
        assert!(matches!(result, Err(ChunkError::ChunkNotFound(_))));
    }

    #[test]
    fn test_begin_rejects_media_chunk() {
        let session = open_session();
        let mut regenerator = Regenerator::new("t");
        let image_id = session.chunks()[2].id.clone();
        let result = regenerator.begin(&session, &image_id, None, 0.5);
        assert!(matches!(result, Err(ChunkError::NotRegenerable(ChunkType::Image))));
    }

    #[test]
    fn test_second_request_for_same_id_rejected() {
        let session = open_session();
        let mut regenerator = Regenerator::new("t");
        let id = session.chunks()[0].id.clone();

        regenerator.begin(&session, &id, None, 0.5).unwrap();
        assert!(regenerator.is_in_flight(&id));
        let second = regenerator.begin(&session, &id, None, 0.5);
        assert!(matches!(second, Err(ChunkError::RegenerationInFlight(_))));
    }

    #[test]
    fn test_complete_applies_and_returns_to_idle() {
        let mut session = open_session();
        let mut regenerator = Regenerator::new("t");
        let id = session.chunks()[0].id.clone();

        let request = regenerator.begin(&session, &id, None, 0.5).unwrap();
        let response = GenerationResponse {
            success: true,
            content: Some("<p>rewritten</p>".to_string()),
        };
        let outcome = regenerator.complete(&mut session, &request, &response);

        assert_eq!(outcome, RegenOutcome::Applied);
        assert!(!regenerator.is_in_flight(&id));
        let chunk = session.get(&id).unwrap();
        assert_eq!(chunk.content, "<p>rewritten</p>");
        assert_eq!(chunk.chunk_type, ChunkType::Text);
    }

    #[test]
    fn test_stale_response_discarded_after_delete() {
        let mut session = open_session();
        let mut regenerator = Regenerator::new("t");
        let id = session.chunks()[0].id.clone();

        let request = regenerator.begin(&session, &id, None, 0.5).unwrap();
        session.delete(&id);
        let before = session.chunks().to_vec();

        let response = GenerationResponse {
            success: true,
            content: Some("<p>zombie</p>".to_string()),
        };
        let outcome = regenerator.complete(&mut session, &request, &response);

        assert_eq!(outcome, RegenOutcome::Discarded);
        assert_eq!(session.chunks(), &before[..]);
        assert!(!regenerator.is_in_flight(&id));
    }

    #[test]
    fn test_failure_response_leaves_content_untouched() {
        let mut session = open_session();
        let mut regenerator = Regenerator::new("t");
        let id = session.chunks()[0].id.clone();
        let original = session.get(&id).unwrap().content.clone();

        let request = regenerator.begin(&session, &id, None, 0.5).unwrap();
        let response = GenerationResponse {
            success: false,
            content: None,
        };
        let outcome = regenerator.complete(&mut session, &request, &response);

        assert!(matches!(outcome, RegenOutcome::Failed(_)));
        assert_eq!(session.get(&id).unwrap().content, original);
        assert!(!regenerator.is_in_flight(&id));
    }

    #[test]
    fn test_request_wire_shape() {
        let session = open_session();
        let mut regenerator = Regenerator::new("Photosynthesis");
        let id = session.chunks()[0].id.clone();
        let request = regenerator
            .begin(&session, &id, Some(RegenFocus::Simplify), 0.7)
            .unwrap();

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["content"], "<p>alpha</p>");
        assert_eq!(json["type"], "text");
        assert_eq!(json["focus"], "simplify");
        assert_eq!(json["subtopic_name"], "Photosynthesis");
        assert!(json["surrounding_context"]["before"].is_string());
        assert!(json.get("chunk_id").is_none());
    }
}
