//! Story Generation: turns a theme into a validated `Story`.
//!
//! Flow: validate theme → build prompt → `StoryModel::write_story` → strip fences →
//!       parse JSON → enforce the title + five paragraphs shape.
//!
//! The raw model output is never handed to the caller: a response with the wrong
//! paragraph count is rejected, not truncated or padded.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::{AppError, Stage};
use crate::llm_client::{strip_json_fences, LlmError};
use crate::story::prompts::{STORY_PROMPT_TEMPLATE, STORY_SYSTEM};

/// Every story has exactly this many paragraphs.
pub const PARAGRAPH_COUNT: usize = 5;

const MAX_THEME_CHARS: usize = 500;

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

/// A caller-supplied story theme. Trimmed, never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryTheme(String);

impl StoryTheme {
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let theme = raw.trim();
        if theme.is_empty() {
            return Err(AppError::InvalidInput("theme cannot be empty".to_string()));
        }
        if theme.chars().count() > MAX_THEME_CHARS {
            return Err(AppError::InvalidInput(format!(
                "theme cannot be longer than {MAX_THEME_CHARS} characters"
            )));
        }
        Ok(Self(theme.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A finished story. Only constructed through validation, so `paragraphs`
/// always holds exactly `PARAGRAPH_COUNT` non-empty entries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Story {
    pub title: String,
    pub paragraphs: Vec<String>,
}

/// Shape the model is instructed to return. Everything optional so that a
/// partial answer is reported as malformed rather than as a serde error.
#[derive(Debug, Deserialize)]
struct RawStory {
    title: Option<String>,
    paragraphs: Option<Vec<String>>,
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// The external text-generation capability. Returns the model's raw text, which
/// is expected (but not trusted) to be a `{"title", "paragraphs"}` JSON object.
///
/// Carried in `AppState` as `Arc<dyn StoryModel>`.
#[async_trait]
pub trait StoryModel: Send + Sync {
    async fn write_story(&self, system: &str, prompt: &str) -> Result<String, LlmError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Generation
// ────────────────────────────────────────────────────────────────────────────

/// Writes a story for `theme`. One model call, no retries.
pub async fn generate_story(theme: &StoryTheme, model: &dyn StoryModel) -> Result<Story, AppError> {
    let prompt = build_story_prompt(theme);

    info!("Writing story for theme {:?}", theme.as_str());
    let raw = model
        .write_story(STORY_SYSTEM, &prompt)
        .await
        .map_err(|e| {
            if e.is_malformed() {
                AppError::malformed(Stage::Story, e.to_string())
            } else {
                AppError::generation(Stage::Story, e.to_string())
            }
        })?;

    let story = parse_story(&raw)?;
    info!(
        "Story written: {:?} ({} paragraphs)",
        story.title,
        story.paragraphs.len()
    );
    Ok(story)
}

pub(crate) fn build_story_prompt(theme: &StoryTheme) -> String {
    STORY_PROMPT_TEMPLATE.replace("{theme}", theme.as_str())
}

/// Parses and validates the model's output.
pub(crate) fn parse_story(raw: &str) -> Result<Story, AppError> {
    let parsed: RawStory = serde_json::from_str(strip_json_fences(raw)).map_err(|e| {
        warn!("Story response is not valid JSON: {e}");
        AppError::malformed(Stage::Story, format!("response is not a JSON object: {e}"))
    })?;

    let title = parsed
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::malformed(Stage::Story, "story has no title"))?;

    let paragraphs: Vec<String> = parsed
        .paragraphs
        .ok_or_else(|| AppError::malformed(Stage::Story, "story has no paragraphs"))?
        .into_iter()
        .map(|p| p.trim().to_string())
        .collect();

    if paragraphs.len() != PARAGRAPH_COUNT {
        return Err(AppError::malformed(
            Stage::Story,
            format!(
                "expected {PARAGRAPH_COUNT} paragraphs, got {}",
                paragraphs.len()
            ),
        ));
    }
    if let Some(blank) = paragraphs.iter().position(|p| p.is_empty()) {
        return Err(AppError::malformed(
            Stage::Story,
            format!("paragraph {blank} is empty"),
        ));
    }

    Ok(Story { title, paragraphs })
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
