use crate::domain::tts::{SpeakerEmbedding, Waveform};
use async_trait::async_trait;

/// Repository for TTS synthesis operations.
/// Abstracts the underlying speech model (local SpeechT5 ONNX pipeline, test fakes, etc.)
///
/// Implementations own the model resources and are responsible for running
/// inference off the async request workers.
#[async_trait]
pub trait TtsRepository: Send + Sync {
    /// Synthesize text to a waveform conditioned on the given speaker
    ///
    /// # Arguments
    /// * `text` - The request text, passed through unchanged (may be empty)
    /// * `speaker` - The process-wide speaker embedding
    ///
    /// # Errors
    /// Returns the provider's error description if tokenization or inference fails
    async fn synthesize(&self, text: &str, speaker: &SpeakerEmbedding) -> Result<Waveform, String>;

    /// Number of model instances currently able to serve requests.
    fn available_workers(&self) -> usize;

    /// Human-readable identifier of the loaded model.
    fn model_name(&self) -> &str;
}
