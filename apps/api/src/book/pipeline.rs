//! Book pipeline: validated request → all illustrations → rendered PDF.
//!
//! Nothing is rendered until every image has arrived. A failed scene ends the
//! request with that scene's error and no document.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::book::{render_book, RenderedBook};
use crate::errors::AppError;
use crate::illustration::prompts::{ART_STYLE_PROMPT, COVER_SCENE_PROMPT};
use crate::illustration::{generate_all_images, FanoutOptions, ImageModel};

pub const MAX_TITLE_CHARS: usize = 200;
pub const MAX_PARAGRAPHS: usize = 12;

#[derive(Debug, Clone, Deserialize)]
pub struct BookRequest {
    pub title: String,
    pub paragraphs: Vec<String>,
}

/// Checks a book request before any image is requested.
///
/// The title is trimmed. Paragraphs are kept verbatim because each one is also
/// the prompt for its illustration; a blank one is rejected.
pub fn validate_book_request(request: BookRequest) -> Result<BookRequest, AppError> {
    let title = request.title.trim().to_string();
    if title.is_empty() {
        return Err(AppError::InvalidInput("title must not be empty".into()));
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(AppError::InvalidInput(format!(
            "title must be at most {MAX_TITLE_CHARS} characters"
        )));
    }

    if request.paragraphs.is_empty() {
        return Err(AppError::InvalidInput(
            "a book needs at least one paragraph".into(),
        ));
    }
    if request.paragraphs.len() > MAX_PARAGRAPHS {
        return Err(AppError::InvalidInput(format!(
            "a book has at most {MAX_PARAGRAPHS} paragraphs, got {}",
            request.paragraphs.len()
        )));
    }

    if let Some(index) = request.paragraphs.iter().position(|p| p.trim().is_empty()) {
        return Err(AppError::InvalidInput(format!(
            "paragraph {index} is empty"
        )));
    }

    Ok(BookRequest {
        title,
        paragraphs: request.paragraphs,
    })
}

/// Illustrates and renders a book.
///
/// Issues `paragraphs.len() + 1` image calls (cover first) and renders only once
/// all of them succeeded.
pub async fn generate_book(
    request: BookRequest,
    model: Arc<dyn ImageModel>,
    fanout: FanoutOptions,
) -> Result<RenderedBook, AppError> {
    let request = validate_book_request(request)?;
    let span = info_span!(
        "book",
        book_id = %Uuid::new_v4(),
        paragraphs = request.paragraphs.len(),
        images = request.paragraphs.len() + 1,
    );

    async move {
        let images = generate_all_images(
            COVER_SCENE_PROMPT,
            &request.paragraphs,
            ART_STYLE_PROMPT,
            model,
            fanout,
        )
        .await?;

        let BookRequest { title, paragraphs } = request;
        let book = tokio::task::spawn_blocking(move || render_book(&title, &paragraphs, &images))
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("PDF render task failed: {e}")))??;

        info!(
            pages = book.pages.len(),
            bytes = book.bytes.len(),
            "Book rendered"
        );
        Ok(book)
    }
    .instrument(span)
    .await
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
