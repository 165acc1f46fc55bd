use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Which external generation call a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// The single text-generation call that writes the story.
    Story,
    /// One image call; 0 is the cover, `i + 1` illustrates paragraph `i`.
    Scene(usize),
}

impl Stage {
    pub fn scene_index(&self) -> Option<usize> {
        match self {
            Stage::Story => None,
            Stage::Scene(index) => Some(*index),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Story => write!(f, "story"),
            Stage::Scene(0) => write!(f, "scene 0 (cover)"),
            Stage::Scene(index) => write!(f, "scene {index}"),
        }
    }
}

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Every failure aborts the whole request: there is no partial story and no partial book.
#[derive(Debug, Error)]
pub enum AppError {
    /// Caller-supplied data violates a precondition. No external call has been made.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An external generation call failed (transport, quota, content policy, timeout).
    #[error("Generation failed for {stage}: {message}")]
    GenerationFailure { stage: Stage, message: String },

    /// An external call succeeded but its payload does not have the expected shape.
    #[error("Malformed response for {stage}: {message}")]
    MalformedResponse { stage: Stage, message: String },

    /// An internal contract between orchestration and layout was broken.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn generation(stage: Stage, message: impl Into<String>) -> Self {
        AppError::GenerationFailure {
            stage,
            message: message.into(),
        }
    }

    pub fn malformed(stage: Stage, message: impl Into<String>) -> Self {
        AppError::MalformedResponse {
            stage,
            message: message.into(),
        }
    }

    /// The failed scene, for errors raised by an image call.
    pub fn scene(&self) -> Option<usize> {
        match self {
            AppError::GenerationFailure { stage, .. } | AppError::MalformedResponse { stage, .. } => {
                stage.scene_index()
            }
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let scene = self.scene();
        let (status, code, message) = match &self {
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, "INVALID_INPUT", msg.clone()),
            AppError::GenerationFailure { stage, message } => {
                tracing::error!(%stage, "Generation failure: {message}");
                (
                    StatusCode::BAD_GATEWAY,
                    "GENERATION_FAILURE",
                    format!("Failed to generate the {stage}: {message}"),
                )
            }
            AppError::MalformedResponse { stage, message } => {
                tracing::error!(%stage, "Malformed model response: {message}");
                (
                    StatusCode::BAD_GATEWAY,
                    "MALFORMED_RESPONSE",
                    format!("The model returned an unusable {stage}: {message}"),
                )
            }
            AppError::InvariantViolation(msg) => {
                tracing::error!("INVARIANT VIOLATION (orchestration defect): {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INVARIANT_VIOLATION",
                    "The book could not be assembled due to an internal defect".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let mut error = json!({
            "code": code,
            "message": message
        });
        if let Some(scene) = scene {
            error["scene"] = json!(scene);
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}
