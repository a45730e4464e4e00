use super::tts_repository::TtsRepository;
use crate::domain::tts::{SpeakerEmbedding, Waveform, SAMPLE_RATE};
use crate::infrastructure::inference::{
    InferenceError, InferencePool, ModelPaths, SpeechT5Config, SpeechT5Pipeline,
};
use async_trait::async_trait;

/// Local SpeechT5 implementation of TTS repository
pub struct SpeechT5TtsRepository {
    pool: InferencePool<SpeechT5Pipeline>,
    config: SpeechT5Config,
    model_name: String,
}

impl SpeechT5TtsRepository {
    /// Load `workers` independent model instances. Any load failure is returned.
    pub fn load(
        paths: &ModelPaths,
        workers: usize,
        intra_threads: usize,
    ) -> Result<Self, InferenceError> {
        let workers = workers.max(1);
        let pipelines = (0..workers)
            .map(|_| SpeechT5Pipeline::load(paths, intra_threads))
            .collect::<Result<Vec<_>, _>>()?;

        let config = pipelines
            .first()
            .map(|pipeline| pipeline.config().clone())
            .unwrap_or_default();

        tracing::info!(workers, "SpeechT5 inference pool ready");

        Ok(Self {
            pool: InferencePool::new(pipelines),
            config,
            model_name: paths.model_name(),
        })
    }

    pub fn config(&self) -> &SpeechT5Config {
        &self.config
    }
}

#[async_trait]
impl TtsRepository for SpeechT5TtsRepository {
    async fn synthesize(&self, text: &str, speaker: &SpeakerEmbedding) -> Result<Waveform, String> {
        let text = text.to_owned();
        let speaker = speaker.as_slice().to_vec();

        let samples = self
            .pool
            .run(move |pipeline| pipeline.synthesize(&text, &speaker))
            .await
            .and_then(|result| result)
            .map_err(|e| e.to_string())?;

        Ok(Waveform::new(samples, SAMPLE_RATE))
    }

    fn available_workers(&self) -> usize {
        self.pool.live()
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
