pub mod analysis;
pub mod audio;
pub mod health;

use axum::{routing::get, routing::post, Router};
use std::sync::Arc;

use crate::app::AppState;

/// Build the API router with all routes
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health::health_check))
        // Document analysis
        .route("/v1/analyze", post(analysis::analyze_document))
        .route("/v1/analyze/upload", post(analysis::upload_document))
        // Text-to-speech
        .route("/v1/audio", post(audio::synthesize_audio))
}
