use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    Extension,
};
use std::sync::Arc;

use crate::{
    domain::tts::{TtsRequest, TtsService, TtsServiceApi},
    error::{AppError, AppResult},
    infrastructure::{http::AppJson, middleware::RequestId},
};

/// Suggested download name for every synthesized file.
pub const OUTPUT_FILENAME: &str = "output.wav";

pub struct TtsController {
    tts_service: Arc<TtsService>,
}

impl TtsController {
    pub fn new(tts_service: Arc<TtsService>) -> Self {
        Self { tts_service }
    }

    /// POST /tts - Convert text to speech
    pub async fn synthesize(
        State(controller): State<Arc<TtsController>>,
        Extension(request_id): Extension<RequestId>,
        AppJson(request): AppJson<TtsRequest>,
    ) -> AppResult<(StatusCode, HeaderMap, Body)> {
        tracing::debug!(request_id = %request_id, "Synthesis accepted");

        let result = controller.tts_service.synthesize(request.text).await?;

        tracing::info!(
            request_id = %request_id,
            audio_size = result.audio_data.len(),
            duration_ms = result.duration_ms,
            "Synthesis completed"
        );

        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("audio/wav"));
        headers.insert(
            header::CONTENT_DISPOSITION,
            HeaderValue::from_str(&format!("attachment; filename=\"{OUTPUT_FILENAME}\""))
                .map_err(|e| AppError::Internal(e.to_string()))?,
        );
        headers.insert("x-sample-rate", HeaderValue::from(result.sample_rate));
        headers.insert("x-duration-ms", HeaderValue::from(result.duration_ms));

        Ok((StatusCode::OK, headers, Body::from(result.audio_data)))
    }
}
