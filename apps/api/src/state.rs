use std::sync::Arc;

use crate::illustration::{FanoutOptions, ImageModel};
use crate::story::StoryModel;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Writes stories. In production this is the OpenAI-backed `LlmClient`.
    pub story_model: Arc<dyn StoryModel>,
    /// Draws illustrations. Usually the same `LlmClient` as `story_model`.
    pub image_model: Arc<dyn ImageModel>,
    /// Concurrency bound and per-call deadline for each book's image calls.
    pub fanout: FanoutOptions,
}
