use serde::{Deserialize, Serialize};

/// Request for POST /tts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsRequest {
    pub text: String,
}
