//! Acoustic model configuration and artifact locations.

use super::error::InferenceError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Generation stops once any stop probability reaches this value.
pub const STOP_THRESHOLD: f32 = 0.5;
/// Upper bound on decoder steps, relative to encoder length / reduction factor.
pub const MAX_LEN_RATIO: f32 = 20.0;
/// Lower bound on decoder steps, relative to encoder length / reduction factor.
pub const MIN_LEN_RATIO: f32 = 0.0;

/// The subset of the SpeechT5 `config.json` the decoding loop depends on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechT5Config {
    /// Mel bins per spectrogram frame.
    pub num_mel_bins: usize,
    /// Frames emitted per decoder step.
    pub reduction_factor: usize,
    /// Attention heads in each decoder layer.
    pub decoder_attention_heads: usize,
    /// Model hidden size.
    pub hidden_size: usize,
    /// Expected speaker embedding length.
    pub speaker_embedding_dim: usize,
}

impl Default for SpeechT5Config {
    fn default() -> Self {
        Self {
            num_mel_bins: 80,
            reduction_factor: 2,
            decoder_attention_heads: 12,
            hidden_size: 768,
            speaker_embedding_dim: 512,
        }
    }
}

impl SpeechT5Config {
    /// Read `config.json`, falling back to SpeechT5 defaults when absent.
    pub fn load(path: &Path) -> Result<Self, InferenceError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No model config found, using defaults");
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path).map_err(|e| InferenceError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let config: Self = serde_json::from_str(&raw).map_err(|e| InferenceError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        if config.num_mel_bins == 0
            || config.reduction_factor == 0
            || config.decoder_attention_heads == 0
            || config.hidden_size % config.decoder_attention_heads != 0
        {
            return Err(InferenceError::Config {
                path: path.to_path_buf(),
                message: format!("inconsistent dimensions: {:?}", config),
            });
        }

        Ok(config)
    }

    pub fn head_dim(&self) -> usize {
        self.hidden_size / self.decoder_attention_heads
    }

    /// Maximum decoder steps for an encoder sequence of `encoder_len` positions.
    pub fn max_steps(&self, encoder_len: usize) -> usize {
        let steps = (encoder_len as f32 / self.reduction_factor as f32 * MAX_LEN_RATIO).floor();
        (steps as usize).max(1)
    }

    /// Minimum decoder steps before the stop probability is honoured.
    pub fn min_steps(&self, encoder_len: usize) -> usize {
        (encoder_len as f32 / self.reduction_factor as f32 * MIN_LEN_RATIO).floor() as usize
    }
}

/// On-disk layout of the three model artifacts.
///
/// ```text
/// <model_dir>/tokenizer.json            text front-end
/// <model_dir>/config.json               optional
/// <model_dir>/encoder_model.onnx        acoustic model, encoder
/// <model_dir>/decoder_model_merged.onnx acoustic model, decoder with KV cache branch
/// <vocoder_dir>/model.onnx              HiFi-GAN vocoder
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ModelPaths {
    pub model_dir: PathBuf,
    pub vocoder_dir: PathBuf,
}

impl ModelPaths {
    pub fn new(model_dir: impl Into<PathBuf>, vocoder_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: model_dir.into(),
            vocoder_dir: vocoder_dir.into(),
        }
    }

    pub fn tokenizer(&self) -> PathBuf {
        self.model_dir.join("tokenizer.json")
    }

    pub fn config(&self) -> PathBuf {
        self.model_dir.join("config.json")
    }

    pub fn encoder(&self) -> PathBuf {
        self.model_dir.join("encoder_model.onnx")
    }

    pub fn decoder(&self) -> PathBuf {
        self.model_dir.join("decoder_model_merged.onnx")
    }

    pub fn vocoder(&self) -> PathBuf {
        self.vocoder_dir.join("model.onnx")
    }

    /// Name reported by the readiness endpoint.
    pub fn model_name(&self) -> String {
        let name = |dir: &Path| {
            dir.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| dir.display().to_string())
        };
        format!("{}+{}", name(&self.model_dir), name(&self.vocoder_dir))
    }
}
