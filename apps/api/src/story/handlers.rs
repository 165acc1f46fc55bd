//! Axum route handlers for the Story API.

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Deserialize;

use crate::errors::AppError;
use crate::story::{generate_story, Story, StoryTheme};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StoryRequest {
    pub theme: String,
}

/// POST /api/generate-story
///
/// Writes a five-paragraph story for the given theme.
pub async fn handle_generate_story(
    State(state): State<AppState>,
    payload: Result<Json<StoryRequest>, JsonRejection>,
) -> Result<Json<Story>, AppError> {
    let Json(request) = payload.map_err(|e| AppError::InvalidInput(e.body_text()))?;
    let theme = StoryTheme::parse(&request.theme)?;

    let story = generate_story(&theme, state.story_model.as_ref()).await?;

    Ok(Json(story))
}
