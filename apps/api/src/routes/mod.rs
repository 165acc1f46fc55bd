pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::book::handlers::handle_generate_book;
use crate::state::AppState;
use crate::story::handlers::handle_generate_story;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::root_handler))
        .route("/health", get(health::health_handler))
        .route("/api/generate-story", post(handle_generate_story))
        .route("/api/generate-book", post(handle_generate_book))
        .with_state(state)
}
