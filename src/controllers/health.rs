use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;

use crate::domain::tts::SAMPLE_RATE;
use crate::infrastructure::repositories::TtsRepository;

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

pub async fn health_ready(State(tts_repo): State<Arc<dyn TtsRepository>>) -> impl IntoResponse {
    let workers = tts_repo.available_workers();
    if workers > 0 {
        (
            StatusCode::OK,
            Json(json!({
                "status": "ready",
                "model": tts_repo.model_name(),
                "inference_workers": workers,
                "sample_rate": SAMPLE_RATE
            })),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "not_ready",
                "model": tts_repo.model_name(),
                "inference_workers": 0,
                "sample_rate": SAMPLE_RATE
            })),
        )
    }
}
