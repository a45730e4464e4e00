use super::error::TtsServiceError;
use super::speaker::SpeakerEmbedding;
use super::wav::encode_wav;
use crate::infrastructure::repositories::TtsRepository;
use crate::infrastructure::storage::ScratchFile;
use async_trait::async_trait;
use moka::future::Cache;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct TtsSynthesisResult {
    pub audio_data: Vec<u8>,
    pub sample_rate: u32,
    pub duration_ms: u64,
}

pub struct TtsService {
    tts_repo: Arc<dyn TtsRepository>,
    speaker: Arc<SpeakerEmbedding>,
    scratch: Option<Arc<ScratchFile>>,
    cache: Option<Cache<String, TtsSynthesisResult>>,
}

impl TtsService {
    pub fn new(
        tts_repo: Arc<dyn TtsRepository>,
        speaker: Arc<SpeakerEmbedding>,
        scratch: Option<Arc<ScratchFile>>,
        cache_enabled: bool,
    ) -> Self {
        // The speaker never changes within a process, so text alone keys the audio.
        let cache = if cache_enabled {
            Some(
                Cache::builder()
                    .max_capacity(100)
                    .time_to_idle(Duration::from_secs(30 * 60)) // 30 minutes, refreshes on access
                    .build(),
            )
        } else {
            None
        };

        Self {
            tts_repo,
            speaker,
            scratch,
            cache,
        }
    }

    /// Process teardown: remove the scratch mirror if one is configured.
    pub async fn shutdown(&self) {
        if let Some(scratch) = &self.scratch {
            scratch.cleanup().await;
        }
    }
}

#[async_trait]
pub trait TtsServiceApi: Send + Sync {
    /// Synthesize text to a WAV payload
    ///
    /// This operation:
    /// - Runs the text through the speech model with the process speaker embedding
    /// - Encodes the waveform as 16-bit PCM WAV in memory
    /// - Mirrors the result to the scratch file when one is configured
    ///
    /// The text is passed through unchanged, including the empty string.
    async fn synthesize(&self, text: String) -> Result<TtsSynthesisResult, TtsServiceError>;
}

#[async_trait]
impl TtsServiceApi for TtsService {
    async fn synthesize(&self, text: String) -> Result<TtsSynthesisResult, TtsServiceError> {
        tracing::info!(text_length = text.len(), "TTS synthesis request");

        let result = match self.cached(&text).await {
            Some(result) => result,
            None => {
                let result = self.generate(&text).await?;
                if let Some(cache) = &self.cache {
                    cache.insert(text.clone(), result.clone()).await;
                }
                result
            }
        };

        if let Some(scratch) = &self.scratch {
            scratch.write(&result.audio_data).await?;
        }

        Ok(result)
    }
}

impl TtsService {
    async fn cached(&self, text: &str) -> Option<TtsSynthesisResult> {
        let cache = self.cache.as_ref()?;
        let result = cache.get(text).await?;
        tracing::info!(
            audio_size = result.audio_data.len(),
            "TTS cache hit - returning cached audio"
        );
        Some(result)
    }

    async fn generate(&self, text: &str) -> Result<TtsSynthesisResult, TtsServiceError> {
        let started = Instant::now();
        let waveform = self
            .tts_repo
            .synthesize(text, &self.speaker)
            .await
            .map_err(TtsServiceError::Synthesis)?;

        tracing::info!(
            samples = waveform.samples.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Waveform generated"
        );

        let audio_data = encode_wav(&waveform.samples, waveform.sample_rate)?;

        Ok(TtsSynthesisResult {
            audio_data,
            sample_rate: waveform.sample_rate,
            duration_ms: waveform.duration_ms(),
        })
    }
}
