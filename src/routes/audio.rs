use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::app::AppState;
use crate::domain::{AudioRequest, AudioResult};
use crate::error::ApiError;
use crate::middleware::RequestId;

/// Convert text to audio.
///
/// POST /v1/audio
///
/// A readable request always gets 200: the body carries either
/// `audioDataUri` or `errorMessage`. Unreadable bodies get the error body.
pub async fn synthesize_audio(
    State(state): State<Arc<AppState>>,
    request_id: RequestId,
    body: Result<Json<AudioRequest>, JsonRejection>,
) -> Response {
    let req = match body {
        Ok(Json(req)) => req,
        Err(rejection) => {
            return ApiError::from(rejection).into_response_with_request_id(request_id.0)
        }
    };

    let result = state.synthesizer.synthesize(&req).await;

    match &result {
        AudioResult::Success { audio } => tracing::info!(
            request_id = request_id.as_deref(),
            media_type = %audio.media_type(),
            size_bytes = audio.len(),
            "Audio synthesized"
        ),
        AudioResult::Failure { error_message } => tracing::info!(
            request_id = request_id.as_deref(),
            reason = %error_message,
            "Audio not available"
        ),
    }

    Json(result).into_response()
}
