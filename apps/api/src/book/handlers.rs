//! Axum route handlers for the Book API.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};

use crate::book::{generate_book, BookRequest};
use crate::errors::AppError;
use crate::state::AppState;

pub const BOOK_FILENAME: &str = "libro_de_cuentos.pdf";

/// POST /api/generate-book
///
/// Illustrates the story and returns it as a downloadable PDF.
pub async fn handle_generate_book(
    State(state): State<AppState>,
    payload: Result<Json<BookRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = payload.map_err(|e| AppError::InvalidInput(e.body_text()))?;

    let book = generate_book(request, state.image_model.clone(), state.fanout).await?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={BOOK_FILENAME}"),
            ),
        ],
        book.bytes,
    ))
}
