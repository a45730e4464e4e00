use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use tts_backend::domain::tts::{SpeakerEmbedding, Waveform, SAMPLE_RATE};
use tts_backend::infrastructure::repositories::TtsRepository;

/// Text containing this marker makes the fake synthesizer fail.
pub const FAILURE_TRIGGER: &str = "explode";
pub const FAILURE_MESSAGE: &str = "decoder run failed: non-zero status code returned";

/// Deterministic stand-in for the SpeechT5 pipeline.
///
/// Produces 100 ms of tone plus 10 ms per character, with a pitch derived
/// from the text so different inputs give different audio.
pub struct FakeTtsRepository {
    calls: AtomicUsize,
    workers: usize,
}

impl FakeTtsRepository {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            workers: 1,
        }
    }

    pub fn without_workers() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            workers: 0,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TtsRepository for FakeTtsRepository {
    async fn synthesize(&self, text: &str, speaker: &SpeakerEmbedding) -> Result<Waveform, String> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if text.contains(FAILURE_TRIGGER) {
            return Err(FAILURE_MESSAGE.to_string());
        }

        let pitch = 200.0
            + text.bytes().map(|b| b as f32).sum::<f32>() % 400.0
            + speaker.as_slice().first().copied().unwrap_or(0.0);
        let len = (SAMPLE_RATE as usize / 10) + text.chars().count() * (SAMPLE_RATE as usize / 100);
        let samples = (0..len)
            .map(|i| (i as f32 * pitch * 2.0 * std::f32::consts::PI / SAMPLE_RATE as f32).sin() * 0.5)
            .collect();

        Ok(Waveform::new(samples, SAMPLE_RATE))
    }

    fn available_workers(&self) -> usize {
        self.workers
    }

    fn model_name(&self) -> &str {
        "fake-speecht5"
    }
}
